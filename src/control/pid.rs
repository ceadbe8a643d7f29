use crate::filter::alpha;
use serde::{Deserialize, Serialize};

/// Gains of one PID loop.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,

    /// Integrator magnitude limit.
    pub imax: f64,

    /// Derivative low-pass cutoff (Hz), zero or less for none.
    pub filter_d_hz: f64,
}

impl Default for PidGains {
    fn default() -> Self {
        Self::p(1.)
    }
}

impl PidGains {
    pub fn p(kp: f64) -> Self {
        Self {
            kp,
            ki: 0.,
            kd: 0.,
            imax: 0.,
            filter_d_hz: 0.,
        }
    }
}

/// Terms of the last update.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Info {
    pub target: f64,
    pub actual: f64,
    pub error: f64,
    pub p: f64,
    pub i: f64,
    pub d: f64,
    pub limit: bool,
}

#[derive(Clone, Debug)]
pub struct Pid {
    pub gains: PidGains,
    dt: f64,
    reset_filter: bool,
    error: f64,
    derivative: f64,
    integrator: f64,
    info: Info,
}

impl Pid {
    pub fn new(gains: PidGains, dt: f64) -> Self {
        Self {
            gains,
            dt,
            reset_filter: true,
            error: 0.,
            derivative: 0.,
            integrator: 0.,
            info: Info::default(),
        }
    }

    pub fn info(&self) -> &Info {
        &self.info
    }

    pub fn integrator(&self) -> f64 {
        self.integrator
    }

    /// Update the integral part of this PID.
    /// If the limit flag is set the integral is only allowed to shrink.
    pub fn update_integral(&mut self, limit: bool) {
        if self.gains.ki != 0. && self.dt > 0. {
            // Ensure that integrator can only be reduced if the output is saturated
            if !limit
                || (self.integrator >= 0. && self.error < 0.)
                || (self.integrator < 0. && self.error >= 0.)
            {
                self.integrator += self.error * self.gains.ki * self.dt;
                self.integrator = self
                    .integrator
                    .max(-self.gains.imax)
                    .min(self.gains.imax);
            }
        } else {
            self.integrator = 0.;
        }
        self.info.i = self.integrator;
        self.info.limit = limit;
    }

    /// Update target and measured inputs to the PID controller and calculate output.
    /// The derivative is calculated and filtered,
    /// then the integral is updated based on the setting of the limit flag.
    pub fn update(&mut self, target: f64, measurement: f64, limit: bool) -> f64 {
        // don't process inf or NaN
        if !target.is_finite() || !measurement.is_finite() {
            return 0.;
        }

        if self.reset_filter {
            self.reset_filter = false;
            self.error = target - measurement;
            self.derivative = 0.;
        } else {
            let error_last = self.error;
            self.error = target - measurement;

            if self.dt > 0. {
                let derivative = (self.error - error_last) / self.dt;
                self.derivative += alpha(self.dt, self.gains.filter_d_hz) * (derivative - self.derivative);
            }
        }

        self.update_integral(limit);

        let p_out = self.error * self.gains.kp;
        let d_out = self.derivative * self.gains.kd;

        self.info.target = target;
        self.info.actual = measurement;
        self.info.error = self.error;
        self.info.p = p_out;
        self.info.d = d_out;

        p_out + self.integrator + d_out
    }

    pub fn reset(&mut self) {
        self.reset_filter = true;
        self.error = 0.;
        self.derivative = 0.;
        self.integrator = 0.;
        self.info = Info::default();
    }
}
