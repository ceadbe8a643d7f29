use super::{GeoReference, Sensor, SensorConfig, SensorDataAssembler, SensorKind, SensorNoise};
use crate::{
    atmosphere::{atmospheric_pressure, SEA_LEVEL_PRESSURE_HPA},
    dynamics::Disturbance,
    Result,
};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BaroInput {
    /// Ground frame (m).
    pub position: Vector3<f64>,

    /// Temperature and sea level pressure, the standard atmosphere when `None`.
    pub disturbance: Option<Disturbance>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BaroSample {
    /// Absolute pressure (hPa).
    pub abs_pressure: f64,

    /// Differential pressure (hPa), zero without an airspeed model.
    pub diff_pressure: f64,

    /// Height above the ground frame origin (m).
    pub pressure_alt: f64,
}

/// Static pressure from a standard atmosphere.
#[derive(Clone, Debug)]
pub struct Barometer {
    reference: GeoReference,
    altitude: SensorDataAssembler,
    noise: SensorNoise,
    disturbance: Disturbance,
    value: BaroSample,
}

impl Barometer {
    pub fn new(config: &SensorConfig, reference: GeoReference, seed: Option<u64>) -> Result<Self> {
        let disturbance = Disturbance::default();
        Ok(Self {
            reference,
            altitude: SensorDataAssembler::new(config.sample_num),
            noise: SensorNoise::new(config.noise_variance, seed)?,
            disturbance,
            value: Self::sample(&reference, &disturbance, 0.),
        })
    }

    fn sample(reference: &GeoReference, disturbance: &Disturbance, pressure_alt: f64) -> BaroSample {
        BaroSample {
            abs_pressure: atmospheric_pressure(
                SEA_LEVEL_PRESSURE_HPA * disturbance.sea_level_atm,
                reference.altitude + pressure_alt,
                disturbance.temperature,
            ),
            diff_pressure: 0.,
            pressure_alt,
        }
    }

    /// Absolute pressure (atm) of the averaged altitude without noise.
    pub fn sensor_value_without_noise_in_atm(&self) -> f64 {
        atmospheric_pressure(
            self.disturbance.sea_level_atm,
            self.reference.altitude + self.altitude.get_calculated_value(),
            self.disturbance.temperature,
        )
    }
}

impl Sensor for Barometer {
    type Input = BaroInput;
    type Sample = BaroSample;

    const KIND: SensorKind = SensorKind::Barometer;

    fn run(&mut self, input: &Self::Input) {
        self.disturbance = input.disturbance.unwrap_or_default();
        self.altitude.add_data(-input.position.z);

        let pressure_alt = self.noise.add_random_noise(self.altitude.get_calculated_value());
        self.value = Self::sample(&self.reference, &self.disturbance, pressure_alt);
    }

    fn sensor_value(&self) -> Self::Sample {
        self.value
    }

    fn reset(&mut self) {
        self.altitude.reset();
        self.noise.reset();
        self.disturbance = Disturbance::default();
        self.value = Self::sample(&self.reference, &self.disturbance, 0.);
    }
}
