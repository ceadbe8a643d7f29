use super::{pid::Pid, ControlParams};
use nalgebra::Vector3;

#[derive(Clone, Debug)]
pub struct AngularRateController {
    angle_p: f64,
    rate: [Pid; 3],
    inertia: Vector3<f64>,
    max_torque: f64,
}

impl AngularRateController {
    pub fn new(params: &ControlParams, inertia: Vector3<f64>, dt: f64) -> Self {
        Self {
            angle_p: params.angle_p,
            rate: [
                Pid::new(params.roll_rate, dt),
                Pid::new(params.pitch_rate, dt),
                Pid::new(params.yaw_rate, dt),
            ],
            inertia,
            max_torque: params.max_torque,
        }
    }

    /// Generate the roll, pitch, yaw moment commands in the body frame in Newtons*meters
    pub fn run(
        &mut self,
        euler: &Vector3<f64>,
        body_rate: &Vector3<f64>,
        target_roll: f64,
        target_pitch: f64,
        target_yaw_rate: f64,
    ) -> Vector3<f64> {
        // 1. Calculate the target body rates from the angle errors
        let rate_target = Vector3::new(
            self.angle_p * (target_roll - euler.x),
            self.angle_p * (target_pitch - euler.y),
            target_yaw_rate,
        );

        // 2. Calculate the angular acceleration of each axis
        let accel = Vector3::from_fn(|axis, _| {
            self.rate[axis].update(rate_target[axis], body_rate[axis], false)
        });

        // 3. Scale by the moment of inertia and limit the magnitude
        let taus = mul_array(self.inertia, accel);
        let taus_mod = taus.norm();

        if taus_mod > self.max_torque {
            taus * self.max_torque / taus_mod
        } else {
            taus
        }
    }

    pub fn reset(&mut self) {
        for pid in &mut self.rate {
            pid.reset();
        }
    }
}

fn mul_array(lhs: Vector3<f64>, rhs: Vector3<f64>) -> Vector3<f64> {
    lhs.zip_map(&rhs, |l, r| l * r)
}
