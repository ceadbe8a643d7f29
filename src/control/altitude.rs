use super::{pid::Pid, ControlParams};
use crate::constrain_float;
use nalgebra::Vector3;

/// Smallest `cos(roll) * cos(pitch)` used to compensate thrust for tilt.
const MIN_TILT_FACTOR: f64 = 0.2;

/// Holds an altitude by commanding collective thrust.
#[derive(Clone, Debug)]
pub struct AltitudeController {
    position_p: f64,
    max_climb_rate: f64,
    climb_rate: Pid,
    mass: f64,
    gravity: f64,
    thrust_max: f64,
    limit: bool,
}

impl AltitudeController {
    pub fn new(params: &ControlParams, mass: f64, gravity: f64, thrust_max: f64, dt: f64) -> Self {
        Self {
            position_p: params.altitude_p,
            max_climb_rate: params.max_climb_rate,
            climb_rate: Pid::new(params.climb_rate, dt),
            mass,
            gravity,
            thrust_max,
            limit: false,
        }
    }

    /// Calculate the collective thrust (N) that moves the body to `target_altitude`.
    ///
    /// Altitudes and the climb rate are positive up.
    pub fn run(
        &mut self,
        target_altitude: f64,
        altitude: f64,
        climb_rate: f64,
        euler: &Vector3<f64>,
    ) -> f64 {
        // 1. Calculate the target climb rate from the altitude error
        let climb_target = constrain_float(
            self.position_p * (target_altitude - altitude),
            -self.max_climb_rate,
            self.max_climb_rate,
        );

        // 2. Calculate the vertical acceleration, holding the integrator while saturated
        let accel = self.climb_rate.update(climb_target, climb_rate, self.limit);

        // 3. Compensate for tilt and clamp to what the rotors can deliver
        let tilt = (euler.x.cos() * euler.y.cos()).max(MIN_TILT_FACTOR);
        let thrust = self.mass * (self.gravity + accel) / tilt;
        let clamped = constrain_float(thrust, 0., self.thrust_max);
        self.limit = clamped != thrust;

        clamped
    }

    /// Mark the thrust as saturated downstream (e.g. by the mixer).
    pub fn set_limit(&mut self, limit: bool) {
        self.limit = self.limit || limit;
    }

    pub fn thrust_max(&self) -> f64 {
        self.thrust_max
    }

    pub fn reset(&mut self) {
        self.climb_rate.reset();
        self.limit = false;
    }
}
