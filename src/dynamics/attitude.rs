use crate::frame::{
    euler_from_quaternion, euler_rate_from_body_angular_velocity, quaternion_from_euler,
    quaternion_velocity_from_body_angular_velocity, rotation_from_euler, wrap_pi,
};
use nalgebra::{Rotation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Which representation integrates the attitude.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttitudeKind {
    #[default]
    Euler,
    Quaternion,
}

impl AttitudeKind {
    /// Create the attitude integrator for this representation at `euler`.
    pub fn build(self, euler: &Vector3<f64>) -> Box<dyn Attitude> {
        match self {
            AttitudeKind::Euler => Box::new(EulerAttitude::new(*euler)),
            AttitudeKind::Quaternion => Box::new(QuaternionAttitude::new(quaternion_from_euler(euler))),
        }
    }
}

/// Attitude of the body, integrated from its body angular velocity.
pub trait Attitude: Debug + Send {
    fn kind(&self) -> AttitudeKind;

    /// Attitude as `(roll, pitch, yaw)`.
    fn euler(&self) -> Vector3<f64>;

    fn quaternion(&self) -> UnitQuaternion<f64>;

    /// Rotation taking body vectors into the ground frame.
    fn rotation(&self) -> Rotation3<f64> {
        rotation_from_euler(&self.euler())
    }

    fn set_euler(&mut self, euler: &Vector3<f64>);

    /// Advance the attitude by `dt` seconds at `angular_velocity` (body frame).
    fn integrate(&mut self, angular_velocity: &Vector3<f64>, dt: f64);
}

/// Attitude integrated through euler angle rates.
#[derive(Clone, Debug)]
pub struct EulerAttitude {
    euler: Vector3<f64>,
}

impl EulerAttitude {
    pub fn new(euler: Vector3<f64>) -> Self {
        Self { euler }
    }
}

impl Attitude for EulerAttitude {
    fn kind(&self) -> AttitudeKind {
        AttitudeKind::Euler
    }

    fn euler(&self) -> Vector3<f64> {
        self.euler
    }

    fn quaternion(&self) -> UnitQuaternion<f64> {
        quaternion_from_euler(&self.euler)
    }

    fn set_euler(&mut self, euler: &Vector3<f64>) {
        self.euler = *euler;
    }

    fn integrate(&mut self, angular_velocity: &Vector3<f64>, dt: f64) {
        // Hold the attitude through gimbal lock
        if let Some(euler_rate) = euler_rate_from_body_angular_velocity(angular_velocity, &self.euler) {
            let euler = self.euler + euler_rate * dt;
            self.euler = Vector3::new(wrap_pi(euler.x), euler.y, wrap_pi(euler.z));
        }
    }
}

/// Attitude integrated as a unit quaternion.
#[derive(Clone, Debug)]
pub struct QuaternionAttitude {
    q: UnitQuaternion<f64>,
}

impl QuaternionAttitude {
    pub fn new(q: UnitQuaternion<f64>) -> Self {
        Self { q }
    }
}

impl Attitude for QuaternionAttitude {
    fn kind(&self) -> AttitudeKind {
        AttitudeKind::Quaternion
    }

    fn euler(&self) -> Vector3<f64> {
        euler_from_quaternion(&self.q)
    }

    fn quaternion(&self) -> UnitQuaternion<f64> {
        self.q
    }

    fn rotation(&self) -> Rotation3<f64> {
        self.q.to_rotation_matrix()
    }

    fn set_euler(&mut self, euler: &Vector3<f64>) {
        self.q = quaternion_from_euler(euler);
    }

    fn integrate(&mut self, angular_velocity: &Vector3<f64>, dt: f64) {
        let q_dot = quaternion_velocity_from_body_angular_velocity(angular_velocity, &self.q);
        self.q = UnitQuaternion::new_normalize(self.q.into_inner() + q_dot * dt);
    }
}
