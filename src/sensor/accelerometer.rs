use super::{Sensor, SensorConfig, SensorKind, VectorChannel};
use crate::{frame::body_vector_from_ground, Result};
use nalgebra::Vector3;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AccelerometerInput {
    /// Body frame (m/s).
    pub body_velocity: Vector3<f64>,

    /// Body frame (rad/s).
    pub angular_velocity: Vector3<f64>,

    /// `(roll, pitch, yaw)` (rad).
    pub euler: Vector3<f64>,
}

/// Specific force in the body frame.
///
/// At rest on the ground this reads `(0, 0, -g)`.
#[derive(Clone, Debug)]
pub struct Accelerometer {
    channel: VectorChannel,
    dt: f64,
    gravity: f64,
    prev_velocity: Option<Vector3<f64>>,
    value: Vector3<f64>,
}

impl Accelerometer {
    pub fn new(config: &SensorConfig, dt: f64, gravity: f64, seed: Option<u64>) -> Result<Self> {
        Ok(Self {
            channel: VectorChannel::new(config, seed)?,
            dt,
            gravity,
            prev_velocity: None,
            value: Vector3::zeros(),
        })
    }
}

impl Sensor for Accelerometer {
    type Input = AccelerometerInput;
    type Sample = Vector3<f64>;

    const KIND: SensorKind = SensorKind::Accelerometer;

    fn run(&mut self, input: &Self::Input) {
        // 1. Differentiate the body velocity, zero on the first tick
        let dv = self
            .prev_velocity
            .map_or_else(Vector3::zeros, |prev| (input.body_velocity - prev) / self.dt);
        self.prev_velocity = Some(input.body_velocity);

        // 2. Add the transport term and remove gravity
        let gravity = body_vector_from_ground(&Vector3::new(0., 0., self.gravity), &input.euler);
        let specific_force = dv + input.angular_velocity.cross(&input.body_velocity) - gravity;

        self.channel.add_data(&specific_force);
        self.value = self.channel.noisy();
    }

    fn sensor_value(&self) -> Self::Sample {
        self.value
    }

    fn reset(&mut self) {
        self.channel.reset();
        self.prev_velocity = None;
        self.value = Vector3::zeros();
    }
}
