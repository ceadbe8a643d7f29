//! Sensors derived from the rigid body state.
//!
//! Every sensor feeds raw values through a [`SensorDataAssembler`] window and then
//! perturbs the averaged value with its own [`SensorNoise`].

use crate::{dynamics::Disturbance, Error, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

mod accelerometer;
pub use accelerometer::{Accelerometer, AccelerometerInput};

mod assembler;
pub use assembler::SensorDataAssembler;

mod barometer;
pub use barometer::{BaroInput, BaroSample, Barometer};

mod gps;
pub use gps::{GeoReference, Gps, GpsInput, GpsSample};

mod gyroscope;
pub use gyroscope::Gyroscope;

mod magnetometer;
pub use magnetometer::{MagneticField, Magnetometer};

mod noise;
pub use noise::SensorNoise;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Accelerometer,
    Gyroscope,
    Gps,
    Barometer,
    Magnetometer,
}

impl SensorKind {
    pub const ALL: [SensorKind; 5] = [
        SensorKind::Accelerometer,
        SensorKind::Gyroscope,
        SensorKind::Gps,
        SensorKind::Barometer,
        SensorKind::Magnetometer,
    ];
}

/// Latest value of one sensor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SensorSample {
    /// Specific force in the body frame (m/s^2).
    Accelerometer(Vector3<f64>),

    /// Body angular velocity (rad/s).
    Gyroscope(Vector3<f64>),
    Gps(GpsSample),
    Barometer(BaroSample),

    /// Magnetic field in the body frame (nT).
    Magnetometer(Vector3<f64>),
}

impl SensorSample {
    pub fn kind(&self) -> SensorKind {
        match self {
            SensorSample::Accelerometer(_) => SensorKind::Accelerometer,
            SensorSample::Gyroscope(_) => SensorKind::Gyroscope,
            SensorSample::Gps(_) => SensorKind::Gps,
            SensorSample::Barometer(_) => SensorKind::Barometer,
            SensorSample::Magnetometer(_) => SensorKind::Magnetometer,
        }
    }
}

/// Window and noise of one sensor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub sample_num: usize,

    /// Variance of the added noise, zero or less for none.
    pub noise_variance: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sample_num: 1,
            noise_variance: 0.,
        }
    }
}

impl SensorConfig {
    pub fn validate(&self, kind: SensorKind) -> Result<()> {
        if self.sample_num == 0 {
            return Err(Error::EmptySampleWindow(kind));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorsConfig {
    pub accelerometer: SensorConfig,
    pub gyroscope: SensorConfig,
    pub gps: SensorConfig,
    pub barometer: SensorConfig,
    pub magnetometer: SensorConfig,
}

impl SensorsConfig {
    pub fn get(&self, kind: SensorKind) -> &SensorConfig {
        match kind {
            SensorKind::Accelerometer => &self.accelerometer,
            SensorKind::Gyroscope => &self.gyroscope,
            SensorKind::Gps => &self.gps,
            SensorKind::Barometer => &self.barometer,
            SensorKind::Magnetometer => &self.magnetometer,
        }
    }

    pub fn validate(&self) -> Result<()> {
        SensorKind::ALL
            .iter()
            .try_for_each(|&kind| self.get(kind).validate(kind))
    }
}

/// State of the body seen by the sensors in one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BodySnapshot {
    /// Ground frame (m).
    pub position: Vector3<f64>,

    /// Ground frame (m/s).
    pub ground_velocity: Vector3<f64>,

    /// Body frame (m/s).
    pub body_velocity: Vector3<f64>,

    /// Body frame (rad/s).
    pub angular_velocity: Vector3<f64>,

    /// `(roll, pitch, yaw)` (rad).
    pub euler: Vector3<f64>,

    pub disturbance: Option<Disturbance>,
}

/// Capability shared by every sensor kind.
pub trait Sensor {
    type Input;
    type Sample: Copy;

    const KIND: SensorKind;

    /// Feed the state of this tick into the sensor.
    fn run(&mut self, input: &Self::Input);

    /// Noise-injected value assembled by the last [`run`](Sensor::run).
    fn sensor_value(&self) -> Self::Sample;

    /// Clear the sample window and restart the noise sequence.
    fn reset(&mut self);
}

/// Three-axis window with shared noise.
#[derive(Clone, Debug)]
pub(crate) struct VectorChannel {
    axes: [SensorDataAssembler; 3],
    noise: SensorNoise,
}

impl VectorChannel {
    pub(crate) fn new(config: &SensorConfig, seed: Option<u64>) -> Result<Self> {
        Ok(Self {
            axes: [
                SensorDataAssembler::new(config.sample_num),
                SensorDataAssembler::new(config.sample_num),
                SensorDataAssembler::new(config.sample_num),
            ],
            noise: SensorNoise::new(config.noise_variance, seed)?,
        })
    }

    pub(crate) fn add_data(&mut self, value: &Vector3<f64>) {
        for (assembler, &x) in self.axes.iter_mut().zip(value.iter()) {
            assembler.add_data(x);
        }
    }

    pub(crate) fn mean(&self) -> Vector3<f64> {
        Vector3::new(
            self.axes[0].get_calculated_value(),
            self.axes[1].get_calculated_value(),
            self.axes[2].get_calculated_value(),
        )
    }

    pub(crate) fn noisy(&mut self) -> Vector3<f64> {
        let mean = self.mean();
        mean.map(|x| self.noise.add_random_noise(x))
    }

    #[cfg(test)]
    pub(crate) fn size(&self) -> usize {
        self.axes[0].size()
    }

    pub(crate) fn reset(&mut self) {
        for assembler in &mut self.axes {
            assembler.reset();
        }
        self.noise.reset();
    }
}

/// Registry of every sensor on an aircraft.
#[derive(Clone, Debug)]
pub struct SensorSuite {
    pub accelerometer: Accelerometer,
    pub gyroscope: Gyroscope,
    pub gps: Gps,
    pub barometer: Barometer,
    pub magnetometer: Magnetometer,
}

impl SensorSuite {
    /// Build every sensor. With a `seed` each sensor gets its own reproducible noise.
    pub fn new(
        config: &SensorsConfig,
        reference: GeoReference,
        field: MagneticField,
        dt: f64,
        gravity: f64,
        seed: Option<u64>,
    ) -> Result<Self> {
        config.validate()?;
        let seed_for = |index: u64| seed.map(|seed| seed.wrapping_add(index));

        Ok(Self {
            accelerometer: Accelerometer::new(&config.accelerometer, dt, gravity, seed_for(0))?,
            gyroscope: Gyroscope::new(&config.gyroscope, seed_for(1))?,
            gps: Gps::new(&config.gps, reference, seed_for(2))?,
            barometer: Barometer::new(&config.barometer, reference, seed_for(3))?,
            magnetometer: Magnetometer::new(&config.magnetometer, field, seed_for(4))?,
        })
    }

    pub fn run(&mut self, snapshot: &BodySnapshot) {
        self.accelerometer.run(&AccelerometerInput {
            body_velocity: snapshot.body_velocity,
            angular_velocity: snapshot.angular_velocity,
            euler: snapshot.euler,
        });
        self.gyroscope.run(&snapshot.angular_velocity);
        self.gps.run(&GpsInput {
            position: snapshot.position,
            ground_velocity: snapshot.ground_velocity,
        });
        self.barometer.run(&BaroInput {
            position: snapshot.position,
            disturbance: snapshot.disturbance,
        });
        self.magnetometer.run(&snapshot.euler);
    }

    pub fn sample(&self, kind: SensorKind) -> SensorSample {
        match kind {
            SensorKind::Accelerometer => SensorSample::Accelerometer(self.accelerometer.sensor_value()),
            SensorKind::Gyroscope => SensorSample::Gyroscope(self.gyroscope.sensor_value()),
            SensorKind::Gps => SensorSample::Gps(self.gps.sensor_value()),
            SensorKind::Barometer => SensorSample::Barometer(self.barometer.sensor_value()),
            SensorKind::Magnetometer => SensorSample::Magnetometer(self.magnetometer.sensor_value()),
        }
    }

    /// Noiseless absolute pressure (atm) at the barometer.
    pub fn sensor_value_without_noise_in_atm(&self) -> f64 {
        self.barometer.sensor_value_without_noise_in_atm()
    }

    pub fn reset(&mut self) {
        self.accelerometer.reset();
        self.gyroscope.reset();
        self.gps.reset();
        self.barometer.reset();
        self.magnetometer.reset();
    }
}
