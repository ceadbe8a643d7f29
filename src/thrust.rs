//! Aggregation of rotor thrusts and torques into a body wrench.

use crate::rotor::{rotor_anti_torque, rotor_thrust, Rotor, RotorConstants, RotorState};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Mounting of one rotor on the airframe.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotorConfig {
    /// Rotor hub position in the body frame (m).
    pub position: [f64; 3],

    /// Spin direction, `1` or `-1`.
    pub ccw: f64,
}

impl RotorConfig {
    pub fn new(position: [f64; 3], ccw: f64) -> Self {
        Self { position, ccw }
    }

    pub fn position(&self) -> Vector3<f64> {
        Vector3::from(self.position)
    }
}

/// Aggregate thrust and torque acting on the body.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Wrench {
    /// Thrust along body -z (N).
    pub thrust: f64,

    /// Torque in the body frame (N*m).
    pub torque: Vector3<f64>,
}

impl Wrench {
    pub fn new(thrust: f64, torque: Vector3<f64>) -> Self {
        Self { thrust, torque }
    }
}

/// Sum of all rotor thrusts (N).
pub fn body_thrust(ct: f64, omegas: &[f64], atm: f64) -> f64 {
    omegas.iter().map(|&omega| rotor_thrust(ct, omega, atm)).sum()
}

/// Body torque from rotor thrust moments, anti-torque and spin-up reaction.
pub fn body_torque(
    constants: &RotorConstants,
    rotors: &[RotorConfig],
    states: &[RotorState],
    atm: f64,
) -> Vector3<f64> {
    rotors
        .iter()
        .zip(states)
        .fold(Vector3::zeros(), |torque, (rotor, state)| {
            let force = Vector3::new(0., 0., -rotor_thrust(constants.ct, state.omega, atm));
            let anti_torque =
                rotor_anti_torque(constants.cq, constants.j, state.omega, state.omega_acc, rotor.ccw);

            torque + rotor.position().cross(&force) + Vector3::new(0., 0., anti_torque)
        })
}

/// Thrust of a rotor whose thrust is linear in speed.
pub fn rotor_thrust_linear(ct: f64, omega: f64) -> f64 {
    ct * omega
}

pub fn rotor_anti_torque_linear(cq: f64, omega: f64, ccw: f64) -> f64 {
    ccw * cq * omega
}

pub fn body_thrust_linear(ct: f64, omegas: &[f64]) -> f64 {
    omegas.iter().map(|&omega| rotor_thrust_linear(ct, omega)).sum()
}

/// Body torque with thrust and anti-torque linear in speed and no spin-up term.
pub fn body_torque_linear(ct: f64, cq: f64, rotors: &[RotorConfig], omegas: &[f64]) -> Vector3<f64> {
    rotors
        .iter()
        .zip(omegas)
        .fold(Vector3::zeros(), |torque, (rotor, &omega)| {
            let force = Vector3::new(0., 0., -rotor_thrust_linear(ct, omega));
            torque
                + rotor.position().cross(&force)
                + Vector3::new(0., 0., rotor_anti_torque_linear(cq, omega, rotor.ccw))
        })
}

/// Combines the rotors of an aircraft into a single [`Wrench`].
#[derive(Clone, Debug)]
pub struct ThrustAggregator {
    rotors: Vec<RotorConfig>,
    constants: RotorConstants,
    wrench: Wrench,
}

impl ThrustAggregator {
    pub fn new(rotors: Vec<RotorConfig>, constants: RotorConstants) -> Self {
        Self {
            rotors,
            constants,
            wrench: Wrench::default(),
        }
    }

    /// Compute the wrench from the current rotor states at atmospheric pressure factor `atm`.
    pub fn run(&mut self, states: &[RotorState], atm: f64) -> Wrench {
        let omegas: Vec<f64> = states.iter().map(|state| state.omega).collect();
        self.wrench = Wrench {
            thrust: body_thrust(self.constants.ct, &omegas, atm),
            torque: body_torque(&self.constants, &self.rotors, states, atm),
        };
        self.wrench
    }

    /// Compute the wrench directly from a set of rotors.
    pub fn run_rotors(&mut self, rotors: &[Rotor], atm: f64) -> Wrench {
        let states: Vec<RotorState> = rotors.iter().map(|rotor| *rotor.state()).collect();
        self.run(&states, atm)
    }

    pub fn wrench(&self) -> Wrench {
        self.wrench
    }

    pub fn rotors(&self) -> &[RotorConfig] {
        &self.rotors
    }

    pub fn reset(&mut self) {
        self.wrench = Wrench::default();
    }
}
