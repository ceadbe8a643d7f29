use crate::{constrain_float, frame::wrap_pi};

#[derive(Clone, Copy, Debug)]
pub struct HeadingController {
    p: f64,
    max_yaw_rate: f64,
}

impl HeadingController {
    pub fn new(p: f64, max_yaw_rate: f64) -> Self {
        Self { p, max_yaw_rate }
    }

    /// Calculate the target yaw-rate in radians/second.
    pub fn run(&self, target_yaw: f64, yaw: f64) -> f64 {
        let yaw_error = wrap_pi(target_yaw - yaw);
        constrain_float(self.p * yaw_error, -self.max_yaw_rate, self.max_yaw_rate)
    }
}
