use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Kinematic state checked by the out-of-bounds policy.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KinematicState {
    /// Ground frame (m).
    pub position: Vector3<f64>,

    /// Ground frame (m/s).
    pub velocity: Vector3<f64>,

    /// Body frame (rad/s).
    pub angular_velocity: Vector3<f64>,
}

/// Per-axis reset of diverging state back to its initial value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutOfBoundsReset {
    pub position: [bool; 3],
    pub velocity: [bool; 3],
    pub angular_velocity: [bool; 3],

    /// Largest distance from the origin on any axis (m).
    pub position_limit: f64,

    /// Largest speed on any axis (m/s).
    pub velocity_limit: f64,

    /// Largest body rate on any axis (rad/s).
    pub angular_velocity_limit: f64,
}

impl Default for OutOfBoundsReset {
    fn default() -> Self {
        Self {
            position: [false; 3],
            velocity: [false; 3],
            angular_velocity: [false; 3],
            position_limit: 10_000.,
            velocity_limit: 1_000.,
            angular_velocity_limit: 1_000.,
        }
    }
}

fn diverged(v: &Vector3<f64>, limit: f64) -> bool {
    v.iter().any(|x| !x.is_finite() || x.abs() > limit)
}

/// Returns `true` if a flagged axis changed.
fn restore(value: &mut Vector3<f64>, initial: &Vector3<f64>, flags: &[bool; 3]) -> bool {
    let mut changed = false;
    for ((v, i), &flag) in value.iter_mut().zip(initial.iter()).zip(flags) {
        if flag && *v != *i {
            *v = *i;
            changed = true;
        }
    }
    changed
}

impl OutOfBoundsReset {
    /// Returns `true` if any state component is non-finite or beyond its limit.
    pub fn is_diverged(&self, state: &KinematicState) -> bool {
        diverged(&state.position, self.position_limit)
            || diverged(&state.velocity, self.velocity_limit)
            || diverged(&state.angular_velocity, self.angular_velocity_limit)
    }

    /// Restore every flagged axis to `initial`, leaving the other axes untouched.
    /// Returns `true` if any axis changed.
    pub fn reset(&self, state: &mut KinematicState, initial: &KinematicState) -> bool {
        let position = restore(&mut state.position, &initial.position, &self.position);
        let velocity = restore(&mut state.velocity, &initial.velocity, &self.velocity);
        let angular_velocity = restore(
            &mut state.angular_velocity,
            &initial.angular_velocity,
            &self.angular_velocity,
        );
        position || velocity || angular_velocity
    }

    /// Restore flagged axes only if the state diverged.
    ///
    /// Returns `true` if a flagged axis changed. Divergence on unflagged axes is left alone
    /// and reported as `false`.
    pub fn apply(&self, state: &mut KinematicState, initial: &KinematicState) -> bool {
        self.is_diverged(state) && self.reset(state, initial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(x: f64) -> KinematicState {
        KinematicState {
            position: Vector3::new(x, x, x),
            velocity: Vector3::new(x, x, x),
            angular_velocity: Vector3::new(x, x, x),
        }
    }

    #[test]
    fn only_flagged_axes_reset() {
        let policy = OutOfBoundsReset {
            position: [false, false, true],
            velocity: [true, false, false],
            ..Default::default()
        };
        let initial = state(0.);
        let mut current = state(5.);

        policy.reset(&mut current, &initial);
        assert_eq!(current.position, Vector3::new(5., 5., 0.));
        assert_eq!(current.velocity, Vector3::new(0., 5., 5.));
        assert_eq!(current.angular_velocity, Vector3::new(5., 5., 5.));
    }

    #[test]
    fn resets_only_when_diverged() {
        let policy = OutOfBoundsReset {
            position: [true; 3],
            position_limit: 10.,
            ..Default::default()
        };
        let initial = state(0.);

        let mut inside = state(5.);
        assert!(!policy.apply(&mut inside, &initial));
        assert_eq!(inside, state(5.));

        let mut outside = state(5.);
        outside.position.y = 11.;
        assert!(policy.apply(&mut outside, &initial));
        assert_eq!(outside.position, Vector3::zeros());
    }

    #[test]
    fn unflagged_divergence_is_not_a_reset() {
        let policy = OutOfBoundsReset {
            position: [true, false, false],
            ..Default::default()
        };
        let initial = state(0.);

        let mut current = state(0.);
        current.angular_velocity.z = f64::NAN;
        assert!(policy.is_diverged(&current));
        assert!(!policy.apply(&mut current, &initial));
        assert!(current.angular_velocity.z.is_nan());

        // a flagged axis away from its initial value is restored
        current.position.x = 2.;
        assert!(policy.apply(&mut current, &initial));
        assert_eq!(current.position.x, 0.);
    }

    #[test]
    fn nan_counts_as_diverged() {
        let policy = OutOfBoundsReset::default();
        let mut s = state(0.);
        s.angular_velocity.z = f64::NAN;
        assert!(policy.is_diverged(&s));
    }
}
