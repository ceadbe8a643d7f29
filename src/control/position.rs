use super::{pid::Pid, ControlParams};
use crate::constrain_float;
use nalgebra::Vector2;

/// Roll and pitch targets (rad).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TiltTarget {
    pub roll: f64,
    pub pitch: f64,
}

/// Horizontal position and velocity control through tilt.
#[derive(Clone, Debug)]
pub struct PositionController {
    position_p: f64,
    velocity: [Pid; 2],
    max_roll: f64,
    max_pitch: f64,
    gravity: f64,
}

impl PositionController {
    pub fn new(params: &ControlParams, gravity: f64, dt: f64) -> Self {
        Self {
            position_p: params.position_p,
            velocity: [
                Pid::new(params.velocity, dt),
                Pid::new(params.velocity, dt),
            ],
            max_roll: params.max_roll,
            max_pitch: params.max_pitch,
            gravity,
        }
    }

    /// Tilt moving the body toward `target` (north, east) at no more than `speed`.
    pub fn run(
        &mut self,
        target: &Vector2<f64>,
        position: &Vector2<f64>,
        velocity: &Vector2<f64>,
        yaw: f64,
        speed: f64,
    ) -> TiltTarget {
        let velocity_target = (target - position) * self.position_p;
        let norm = velocity_target.norm();
        let velocity_target = if norm > speed && norm > 0. {
            velocity_target * (speed.max(0.) / norm)
        } else {
            velocity_target
        };

        self.run_speed(&velocity_target, velocity, yaw)
    }

    /// Tilt reaching the ground velocity `target` (north, east).
    pub fn run_speed(&mut self, target: &Vector2<f64>, velocity: &Vector2<f64>, yaw: f64) -> TiltTarget {
        // 1. Calculate the ground frame acceleration
        let ax = self.velocity[0].update(target.x, velocity.x, false);
        let ay = self.velocity[1].update(target.y, velocity.y, false);

        // 2. Rotate it into the heading frame
        let (sin_yaw, cos_yaw) = yaw.sin_cos();
        let forward = cos_yaw * ax + sin_yaw * ay;
        let right = -sin_yaw * ax + cos_yaw * ay;

        // 3. Tilt the thrust vector, nose down to accelerate forward
        TiltTarget {
            roll: constrain_float(right / self.gravity, -self.max_roll, self.max_roll),
            pitch: constrain_float(-forward / self.gravity, -self.max_pitch, self.max_pitch),
        }
    }

    pub fn reset(&mut self) {
        for pid in &mut self.velocity {
            pid.reset();
        }
    }
}
