use super::{Sensor, SensorConfig, SensorKind, VectorChannel};
use crate::Result;
use nalgebra::Vector3;

/// Body angular velocity.
#[derive(Clone, Debug)]
pub struct Gyroscope {
    channel: VectorChannel,
    value: Vector3<f64>,
}

impl Gyroscope {
    pub fn new(config: &SensorConfig, seed: Option<u64>) -> Result<Self> {
        Ok(Self {
            channel: VectorChannel::new(config, seed)?,
            value: Vector3::zeros(),
        })
    }
}

impl Sensor for Gyroscope {
    type Input = Vector3<f64>;
    type Sample = Vector3<f64>;

    const KIND: SensorKind = SensorKind::Gyroscope;

    fn run(&mut self, angular_velocity: &Vector3<f64>) {
        self.channel.add_data(angular_velocity);
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
