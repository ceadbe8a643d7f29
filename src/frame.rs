//! Reference-frame math.
//!
//! The ground frame is NED (x north, y east, z down) and the body frame is
//! x forward, y right, z down. Euler angles are stored as `(roll, pitch, yaw)`
//! in a `Vector3` and follow the 3-2-1 (yaw, pitch, roll) intrinsic sequence.

use core::f64::consts::PI;
use nalgebra::{Quaternion, Rotation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Rotation taking body-frame vectors into the ground frame.
pub fn rotation_from_euler(euler: &Vector3<f64>) -> Rotation3<f64> {
    Rotation3::from_euler_angles(euler.x, euler.y, euler.z)
}

pub fn ground_vector_from_body(body: &Vector3<f64>, euler: &Vector3<f64>) -> Vector3<f64> {
    rotation_from_euler(euler) * body
}

pub fn body_vector_from_ground(ground: &Vector3<f64>, euler: &Vector3<f64>) -> Vector3<f64> {
    rotation_from_euler(euler).transpose() * ground
}

pub fn quaternion_from_euler(euler: &Vector3<f64>) -> UnitQuaternion<f64> {
    UnitQuaternion::from_euler_angles(euler.x, euler.y, euler.z)
}

pub fn euler_from_quaternion(q: &UnitQuaternion<f64>) -> Vector3<f64> {
    let (roll, pitch, yaw) = q.euler_angles();
    Vector3::new(roll, pitch, yaw)
}

/// Convert a body angular velocity into a 321-intrinsic euler angle derivative.
///
/// Returns `None` if the vehicle is pitched 90 degrees up or down.
pub fn euler_rate_from_body_angular_velocity(
    angular_velocity: &Vector3<f64>,
    euler: &Vector3<f64>,
) -> Option<Vector3<f64>> {
    let sin_theta = euler.y.sin();
    let cos_theta = euler.y.cos();
    let sin_phi = euler.x.sin();
    let cos_phi = euler.x.cos();

    // The euler angles are discontinuous when pitched all the way up or down
    if cos_theta.abs() < f64::EPSILON {
        return None;
    }

    let p = angular_velocity.x;
    let q = angular_velocity.y;
    let r = angular_velocity.z;
    let tan_theta = sin_theta / cos_theta;

    Some(Vector3::new(
        p + sin_phi * tan_theta * q + cos_phi * tan_theta * r,
        cos_phi * q - sin_phi * r,
        (sin_phi / cos_theta) * q + (cos_phi / cos_theta) * r,
    ))
}

/// Convert a 321-intrinsic euler angle derivative into a body angular velocity.
pub fn body_angular_velocity_from_euler_rate(
    euler_rate: &Vector3<f64>,
    euler: &Vector3<f64>,
) -> Vector3<f64> {
    let sin_theta = euler.y.sin();
    let cos_theta = euler.y.cos();
    let sin_phi = euler.x.sin();
    let cos_phi = euler.x.cos();

    Vector3::new(
        euler_rate.x - sin_theta * euler_rate.z,
        cos_phi * euler_rate.y + sin_phi * cos_theta * euler_rate.z,
        -sin_phi * euler_rate.y + cos_phi * cos_theta * euler_rate.z,
    )
}

/// Time derivative of an attitude quaternion, `q' = q * (0, w) / 2`.
pub fn quaternion_velocity_from_body_angular_velocity(
    angular_velocity: &Vector3<f64>,
    q: &UnitQuaternion<f64>,
) -> Quaternion<f64> {
    let omega = Quaternion::from_imag(*angular_velocity);
    *q.quaternion() * omega * 0.5
}

/// Euler's rotation equation for a diagonal inertia, `J w' = tau - w x J w`.
pub fn angular_acceleration_in_body_frame(
    angular_velocity: &Vector3<f64>,
    torque: &Vector3<f64>,
    inertia: &Vector3<f64>,
) -> Vector3<f64> {
    let momentum = inertia.component_mul(angular_velocity);
    (torque - angular_velocity.cross(&momentum)).component_div(inertia)
}

/// Air friction acting against the wind-relative velocity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Drag {
    /// Linear air friction coefficient (N per m/s).
    pub linear: f64,

    /// Quadratic air friction coefficient (N per (m/s)^2).
    pub quadratic: f64,
}

impl Drag {
    /// Friction force opposing `relative_velocity`.
    pub fn force(&self, relative_velocity: &Vector3<f64>) -> Vector3<f64> {
        -relative_velocity.map(|v| self.linear * v + self.quadratic * v * v.abs())
    }
}

/// Translational acceleration in the body frame.
///
/// `wind` and `external_force` are expressed in the ground frame. The body frame
/// rotates, so the Coriolis term `-w x v` is included.
#[allow(clippy::too_many_arguments)]
pub fn acceleration_in_body_frame(
    velocity: &Vector3<f64>,
    euler: &Vector3<f64>,
    angular_velocity: &Vector3<f64>,
    thrust: f64,
    mass: f64,
    gravity: f64,
    wind: &Vector3<f64>,
    drag: &Drag,
    external_force: &Vector3<f64>,
) -> Vector3<f64> {
    let rotation = rotation_from_euler(euler);
    let to_body = rotation.transpose();

    let thrust_force = Vector3::new(0., 0., -thrust);
    let gravity_force = to_body * Vector3::new(0., 0., mass * gravity);
    let drag_force = drag.force(&(velocity - to_body * wind));
    let force = thrust_force + gravity_force + drag_force + to_body * external_force;

    force / mass - angular_velocity.cross(velocity)
}

/// Translational acceleration in the ground frame.
#[allow(clippy::too_many_arguments)]
pub fn acceleration_in_ground_frame(
    velocity: &Vector3<f64>,
    euler: &Vector3<f64>,
    thrust: f64,
    mass: f64,
    gravity: f64,
    wind: &Vector3<f64>,
    drag: &Drag,
    external_force: &Vector3<f64>,
) -> Vector3<f64> {
    let thrust_force = ground_vector_from_body(&Vector3::new(0., 0., -thrust), euler);
    let gravity_force = Vector3::new(0., 0., mass * gravity);
    let drag_force = drag.force(&(velocity - wind));

    (thrust_force + gravity_force + drag_force + external_force) / mass
}

/// Wrap an angle to the range -PI..=PI.
pub fn wrap_pi(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2. * PI) - PI;
    if wrapped == -PI {
        PI
    } else {
        wrapped
    }
}
