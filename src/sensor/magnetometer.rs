use super::{Sensor, SensorConfig, SensorKind, VectorChannel};
use crate::{frame::body_vector_from_ground, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Geomagnetic field at the reference point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagneticField {
    /// Total intensity (nT).
    pub intensity_nt: f64,

    /// Angle east of true north (deg).
    pub declination_deg: f64,

    /// Angle below the horizon (deg).
    pub inclination_deg: f64,
}

impl Default for MagneticField {
    fn default() -> Self {
        Self {
            intensity_nt: 46_000.,
            declination_deg: -7.5,
            inclination_deg: 49.5,
        }
    }
}

impl MagneticField {
    /// Field in the NED ground frame (nT).
    pub fn ground_vector(&self) -> Vector3<f64> {
        let (sin_d, cos_d) = self.declination_deg.to_radians().sin_cos();
        let (sin_i, cos_i) = self.inclination_deg.to_radians().sin_cos();
        Vector3::new(cos_i * cos_d, cos_i * sin_d, sin_i) * self.intensity_nt
    }
}

/// Three axis magnetic field in the body frame.
#[derive(Clone, Debug)]
pub struct Magnetometer {
    field: Vector3<f64>,
    channel: VectorChannel,
    value: Vector3<f64>,
}

impl Magnetometer {
    pub fn new(config: &SensorConfig, field: MagneticField, seed: Option<u64>) -> Result<Self> {
        Ok(Self {
            field: field.ground_vector(),
            channel: VectorChannel::new(config, seed)?,
            value: Vector3::zeros(),
        })
    }
}

impl Sensor for Magnetometer {
    /// `(roll, pitch, yaw)` (rad).
    type Input = Vector3<f64>;
    type Sample = Vector3<f64>;

    const KIND: SensorKind = SensorKind::Magnetometer;

    fn run(&mut self, euler: &Vector3<f64>) {
        self.channel.add_data(&body_vector_from_ground(&self.field, euler));
        self.value = self.channel.noisy();
    }

    fn sensor_value(&self) -> Self::Sample {
        self.value
    }

    fn reset(&mut self) {
        self.channel.reset();
        self.value = Vector3::zeros();
    }
}
