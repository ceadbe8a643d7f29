//! Aircraft configuration.
//!
//! Loading is left to the caller, every struct here derives serde so any format works.

use crate::{
    control::{ControlMode, ControlParams},
    dynamics::{
        AttitudeKind, BodyParams, BoundaryDisturbance, DynamicsOptions, IntegrationScheme,
        OutOfBoundsReset,
    },
    frame::Drag,
    rotor::{hover_rad_per_sec, Battery, RotorConstants},
    sensor::{GeoReference, MagneticField, SensorsConfig},
    thrust::RotorConfig,
    Error, Result, GRAVITY,
};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AircraftConfig {
    /// Fixed timestep (s).
    pub time_step: f64,

    /// (kg)
    pub mass: f64,

    /// Diagonal moment of inertia (kg*m^2).
    pub inertia: [f64; 3],

    /// Bounding box of the airframe (m).
    pub body_size: [f64; 3],
    pub drag: Drag,

    /// (m/s^2)
    pub gravity: f64,

    /// Ground frame (m).
    pub initial_position: [f64; 3],

    /// `(roll, pitch, yaw)` (deg).
    pub initial_angle_deg: [f64; 3],
    pub attitude: AttitudeKind,
    pub integration: IntegrationScheme,

    pub rotor_count: usize,
    pub rotors: Vec<RotorConfig>,
    pub rotor: RotorConstants,

    /// Propeller radius (m).
    pub rotor_radius: f64,

    /// Couple the motors to a battery instead of the first-order lag.
    pub battery: Option<Battery>,

    pub sensors: SensorsConfig,
    pub magnetic_field: MagneticField,
    pub reference: GeoReference,

    pub out_of_bounds_reset: Option<OutOfBoundsReset>,
    pub boundary_disturbance: Option<BoundaryDisturbance>,

    pub manual_control: bool,
    pub collision_detection: bool,
    pub ground_contact: bool,
    pub enable_disturbance: bool,

    /// Feed input duties straight to the rotors, skipping the controller.
    pub direct_rotor_control: bool,

    pub control_mode: ControlMode,
    pub control: ControlParams,

    /// Seed of the sensor noise, fresh entropy when `None`.
    pub noise_seed: Option<u64>,
}

impl Default for AircraftConfig {
    fn default() -> Self {
        let arm = 0.1;
        Self {
            time_step: 0.001,
            mass: 1.,
            inertia: [0.0061, 0.00653, 0.0116],
            body_size: [0.3, 0.3, 0.1],
            drag: Drag {
                linear: 0.05,
                quadratic: 0.,
            },
            gravity: GRAVITY,
            initial_position: [0.; 3],
            initial_angle_deg: [0.; 3],
            attitude: AttitudeKind::default(),
            integration: IntegrationScheme::default(),
            rotor_count: 4,
            rotors: vec![
                RotorConfig::new([arm, arm, 0.], 1.),
                RotorConfig::new([-arm, arm, 0.], -1.),
                RotorConfig::new([-arm, -arm, 0.], 1.),
                RotorConfig::new([arm, -arm, 0.], -1.),
            ],
            rotor: RotorConstants::default(),
            rotor_radius: 0.05,
            battery: None,
            sensors: SensorsConfig::default(),
            magnetic_field: MagneticField::default(),
            reference: GeoReference::default(),
            out_of_bounds_reset: None,
            boundary_disturbance: None,
            manual_control: false,
            collision_detection: true,
            ground_contact: true,
            enable_disturbance: false,
            direct_rotor_control: false,
            control_mode: ControlMode::default(),
            control: ControlParams::default(),
            noise_seed: None,
        }
    }
}

impl AircraftConfig {
    /// Check everything that would make the aircraft impossible to simulate.
    pub fn validate(&self) -> Result<()> {
        if !(self.time_step > 0.) {
            return Err(Error::NonPositiveTimeStep(self.time_step));
        }
        let usec = self.time_step * 1e6;
        if usec.round() < 1. || (usec - usec.round()).abs() > 1e-6 {
            return Err(Error::FractionalTimeStep(self.time_step));
        }
        self.body_params().validate()?;
        self.rotor.validate()?;

        // The duty models divide by the full speed and by V*K
        if !(self.gravity > 0.) && !self.direct_rotor_control {
            return Err(Error::NonPositiveGravity(self.gravity));
        }
        if let Some(battery) = &self.battery {
            if !(battery.nominal_voltage > 0.) {
                return Err(Error::NonPositiveBatteryVoltage(battery.nominal_voltage));
            }
            if !(self.rotor.k > 0.) {
                return Err(Error::NonPositiveMotorConstant(self.rotor.k));
            }
        }
        if self.rotors.len() != self.rotor_count {
            return Err(Error::RotorCountMismatch {
                expected: self.rotor_count,
                actual: self.rotors.len(),
            });
        }
        self.sensors.validate()
    }

    pub fn body_params(&self) -> BodyParams {
        BodyParams {
            mass: self.mass,
            inertia: Vector3::from(self.inertia),
            gravity: self.gravity,
            drag: self.drag,
            rotor_radius: self.rotor_radius,
        }
    }

    pub fn dynamics_options(&self) -> DynamicsOptions {
        DynamicsOptions {
            manual_control: self.manual_control,
            collision_detection: self.collision_detection,
            ground_contact: self.ground_contact,
            integration: self.integration,
            out_of_bounds_reset: self.out_of_bounds_reset,
            boundary_disturbance: self.boundary_disturbance,
        }
    }

    pub fn initial_position(&self) -> Vector3<f64> {
        Vector3::from(self.initial_position)
    }

    /// Initial attitude (rad).
    pub fn initial_euler(&self) -> Vector3<f64> {
        Vector3::from(self.initial_angle_deg).map(f64::to_radians)
    }

    /// Rotor speed (rad/s) at which the rotors carry the airframe.
    pub fn hover_rad_per_sec(&self) -> f64 {
        hover_rad_per_sec(self.mass, self.gravity, self.rotor.ct, self.rotor_count)
    }

    pub fn rad_per_sec_max(&self) -> f64 {
        2. * self.hover_rad_per_sec()
    }

    /// Time constant (s) of the first-order lag rotor.
    pub fn rotor_time_constant(&self) -> f64 {
        self.rotor.time_constant(self.hover_rad_per_sec())
    }

    /// Gain of the first-order lag rotor.
    pub fn rotor_gain(&self) -> f64 {
        self.rad_per_sec_max() / self.rotor_time_constant()
    }

    /// Thrust (N) of every rotor at full speed.
    pub fn thrust_max(&self) -> f64 {
        let omega = self.rad_per_sec_max();
        self.rotor.ct * self.rotor_count as f64 * omega * omega
    }

    pub fn time_step_usec(&self) -> u64 {
        (self.time_step * 1e6).round() as u64
    }
}
