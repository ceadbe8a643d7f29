use super::RotorConstants;
use serde::{Deserialize, Serialize};

/// Constant-voltage battery feeding the rotor motors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    pub nominal_voltage: f64,
}

impl Battery {
    pub fn new(nominal_voltage: f64) -> Self {
        Self { nominal_voltage }
    }

    pub fn voltage(&self) -> f64 {
        self.nominal_voltage
    }

    /// Duty rate at which a motor settles at `omega` (rad/s).
    pub fn steady_duty(&self, constants: &RotorConstants, omega: f64) -> f64 {
        let c = constants;
        let load = c.k * c.k * omega / c.r + c.cq * omega * omega + c.d * omega;
        load * c.r / (self.voltage() * c.k)
    }
}

/// Angular acceleration of a battery driven rotor.
///
/// `w' = (V*K/R*duty - K^2*w/R - Cq*w^2 - D*w) / J`
#[allow(clippy::too_many_arguments)]
pub fn rotor_omega_acceleration_with_battery(
    voltage: f64,
    r: f64,
    cq: f64,
    j: f64,
    k: f64,
    d: f64,
    omega: f64,
    duty: f64,
) -> f64 {
    let drive = voltage * k / r * duty;
    let back_emf = k * k * omega / r;
    (drive - back_emf - cq * omega * omega - d * omega) / j
}

/// Motor current draw (A), `I = (V*duty - K*w) / R`.
pub fn rotor_current(voltage: f64, r: f64, k: f64, omega: f64, duty: f64) -> f64 {
    (voltage * duty - k * omega) / r
}
