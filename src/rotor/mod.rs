//! Per-rotor electromechanical models.
//!
//! A [`Rotor`] turns a duty rate into an angular velocity, either through a
//! first-order lag or through a DC motor coupled to a battery voltage.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

mod battery;
pub use battery::{rotor_current, rotor_omega_acceleration_with_battery, Battery};

/// Electromechanical constants shared by every rotor of an aircraft.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotorConstants {
    /// Motor winding resistance (ohm).
    pub r: f64,

    /// Torque (drag) coefficient, anti-torque = cq * w^2.
    pub cq: f64,

    /// Thrust coefficient, thrust = ct * w^2.
    pub ct: f64,

    /// Back-EMF / torque constant of the motor.
    pub k: f64,

    /// Viscous friction coefficient.
    pub d: f64,

    /// Rotor moment of inertia (kg*m^2).
    pub j: f64,
}

impl Default for RotorConstants {
    fn default() -> Self {
        Self {
            r: 0.1,
            cq: 1.5e-7,
            ct: 1.0e-5,
            k: 3.3e-3,
            d: 1.0e-5,
            j: 1.0e-5,
        }
    }
}

impl RotorConstants {
    pub fn validate(&self) -> Result<()> {
        if self.r <= 0. {
            return Err(Error::NonPositiveResistance(self.r));
        }
        if self.j <= 0. {
            return Err(Error::NonPositiveRotorInertia(self.j));
        }
        if self.ct <= 0. {
            return Err(Error::NonPositiveThrustCoefficient(self.ct));
        }
        Ok(())
    }

    /// Time constant of the linearized motor around `hover_rad_per_sec`.
    pub fn time_constant(&self, hover_rad_per_sec: f64) -> f64 {
        (self.j * self.r)
            / (self.d * self.r + self.k * self.k + 2. * self.r * self.cq * hover_rad_per_sec)
    }
}

/// Rotor speed (rad/s) at which `rotor_count` rotors carry `mass` against `gravity`.
pub fn hover_rad_per_sec(mass: f64, gravity: f64, ct: f64, rotor_count: usize) -> f64 {
    (mass * gravity / (ct * rotor_count as f64)).sqrt()
}

/// Angular acceleration of a first-order lag rotor, `w' = Kr * duty - w / Tr`.
pub fn rotor_omega_acceleration(kr: f64, tr: f64, omega: f64, duty: f64) -> f64 {
    kr * duty - omega / tr
}

pub fn rotor_thrust(ct: f64, omega: f64, atm: f64) -> f64 {
    ct * omega * omega * atm
}

/// Reaction torque about body z of a spinning rotor.
///
/// Aerodynamic drag and spin-up both push the body against the rotor's spin direction `ccw`.
pub fn rotor_anti_torque(cq: f64, j: f64, omega: f64, omega_acc: f64, ccw: f64) -> f64 {
    ccw * (cq * omega * omega + j * omega_acc)
}

/// How a duty rate drives the rotor speed.
#[derive(Clone, Debug)]
pub enum RotorModel {
    /// `w' = gain * duty - w / time_constant`
    Lag { gain: f64, time_constant: f64 },

    /// DC motor driven by a battery.
    Battery(Battery),
}

/// Instantaneous state of one rotor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RotorState {
    /// Angular velocity (rad/s).
    pub omega: f64,

    /// Angular acceleration over the last tick (rad/s^2).
    pub omega_acc: f64,

    /// Commanded duty rate in 0..=1.
    pub duty: f64,

    /// Current draw (A) when driven by a battery.
    pub current: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct Rotor {
    model: RotorModel,
    constants: RotorConstants,
    rad_per_sec_max: f64,
    dt: f64,
    state: RotorState,
}

impl Rotor {
    /// Create a first-order lag rotor that settles at `rad_per_sec_max` on full duty.
    pub fn lag(
        constants: RotorConstants,
        rad_per_sec_max: f64,
        time_constant: f64,
        dt: f64,
    ) -> Result<Self> {
        constants.validate()?;
        if time_constant <= 0. {
            return Err(Error::NonPositiveTimeConstant(time_constant));
        }

        Ok(Self::new(
            RotorModel::Lag {
                gain: rad_per_sec_max / time_constant,
                time_constant,
            },
            constants,
            rad_per_sec_max,
            dt,
        ))
    }

    /// Create a rotor whose motor is driven by `battery`.
    pub fn battery(
        constants: RotorConstants,
        battery: Battery,
        rad_per_sec_max: f64,
        dt: f64,
    ) -> Result<Self> {
        constants.validate()?;
        Ok(Self::new(
            RotorModel::Battery(battery),
            constants,
            rad_per_sec_max,
            dt,
        ))
    }

    fn new(model: RotorModel, constants: RotorConstants, rad_per_sec_max: f64, dt: f64) -> Self {
        Self {
            model,
            constants,
            rad_per_sec_max,
            dt,
            state: RotorState::default(),
        }
    }

    /// Advance the rotor one timestep at the given duty rate (clamped to 0..=1).
    pub fn run(&mut self, duty: f64) {
        self.step(duty, None);
    }

    /// Advance the rotor one timestep with an explicit battery voltage.
    /// A lag rotor ignores the voltage.
    pub fn run_with_voltage(&mut self, duty: f64, voltage: f64) {
        self.step(duty, Some(voltage));
    }

    fn step(&mut self, duty: f64, voltage: Option<f64>) {
        let duty = crate::constrain_float(duty, 0., 1.);
        let omega = self.state.omega;
        let c = &self.constants;

        let (omega_acc, current) = match &self.model {
            RotorModel::Lag {
                gain,
                time_constant,
            } => (
                rotor_omega_acceleration(*gain, *time_constant, omega, duty),
                None,
            ),
            RotorModel::Battery(battery) => {
                let v = voltage.unwrap_or_else(|| battery.voltage());
                (
                    rotor_omega_acceleration_with_battery(v, c.r, c.cq, c.j, c.k, c.d, omega, duty),
                    Some(rotor_current(v, c.r, c.k, omega, duty)),
                )
            }
        };

        let next = (omega + omega_acc * self.dt).max(0.);
        self.state = RotorState {
            omega: next,
            omega_acc: (next - omega) / self.dt,
            duty,
            current,
        };
    }

    /// Thrust (N) at the given atmospheric pressure factor.
    pub fn thrust(&self, atm: f64) -> f64 {
        rotor_thrust(self.constants.ct, self.state.omega, atm)
    }

    /// Reaction torque (N*m) about body z for a rotor spinning in direction `ccw`.
    pub fn anti_torque(&self, ccw: f64) -> f64 {
        rotor_anti_torque(
            self.constants.cq,
            self.constants.j,
            self.state.omega,
            self.state.omega_acc,
            ccw,
        )
    }

    pub fn state(&self) -> &RotorState {
        &self.state
    }

    pub fn omega(&self) -> f64 {
        self.state.omega
    }

    pub fn duty(&self) -> f64 {
        self.state.duty
    }

    pub fn constants(&self) -> &RotorConstants {
        &self.constants
    }

    pub fn rad_per_sec_max(&self) -> f64 {
        self.rad_per_sec_max
    }

    pub fn has_battery_dynamics(&self) -> bool {
        matches!(self.model, RotorModel::Battery(_))
    }

    pub fn model(&self) -> &RotorModel {
        &self.model
    }

    pub fn reset(&mut self) {
        self.state = RotorState::default();
    }
}
