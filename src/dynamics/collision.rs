//! Collision response.
//!
//! A [`CollisionEvent`] is applied to the body once and then discarded.
//! Restitution outside `0..=1` is applied as given and yields physically
//! implausible results.

use crate::frame::rotation_from_euler;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

const MIN_NORMAL_NORM: f64 = 1e-9;

/// A single contact with a fixed obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimpleCollision {
    /// Contact point in the ground frame (m).
    pub contact_position: [f64; 3],

    /// Velocity of the body relative to the obstacle, ground frame (m/s).
    pub relative_velocity: [f64; 3],

    pub restitution: f64,
}

/// A two-body collision. Vectors are expressed in the body frame of self.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImpulseCollision {
    /// The target does not move (infinite mass and inertia).
    pub is_target_static: bool,
    pub restitution: f64,

    /// From the center of mass of self to the contact point (m).
    pub self_contact_vector: [f64; 3],

    /// Contact normal. Either orientation may be given.
    pub normal: [f64; 3],

    /// From the center of mass of the target to the contact point (m).
    pub target_contact_vector: [f64; 3],
    pub target_velocity: [f64; 3],
    pub target_angular_velocity: [f64; 3],

    /// Target attitude `(roll, pitch, yaw)` in the ground frame (rad).
    pub target_euler: [f64; 3],

    /// Diagonal inertia of the target in its own body frame (kg*m^2).
    pub target_inertia: [f64; 3],
    pub target_mass: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollisionEvent {
    Simple(SimpleCollision),
    Impulse(ImpulseCollision),
}

/// Reflect `velocity` off a surface with the given normal.
///
/// `v' = v - (1 + e)(v.n)n`. The orientation of `normal` does not matter.
/// Returns `None` for a zero-length normal.
pub fn velocity_after_contact_with_wall(
    velocity: &Vector3<f64>,
    normal: &Vector3<f64>,
    restitution: f64,
) -> Option<Vector3<f64>> {
    let n = normal.try_normalize(MIN_NORMAL_NORM)?;
    Some(velocity - n * ((1. + restitution) * velocity.dot(&n)))
}

/// Reflect `velocity` off a contact point seen from the body center.
///
/// A body already moving away from the contact keeps its velocity.
pub fn velocity_after_contact_with_point(
    velocity: &Vector3<f64>,
    center: &Vector3<f64>,
    contact: &Vector3<f64>,
    restitution: f64,
) -> Option<Vector3<f64>> {
    let normal = contact - center;
    if velocity.dot(&normal) <= 0. {
        return normal.try_normalize(MIN_NORMAL_NORM).map(|_| *velocity);
    }
    velocity_after_contact_with_wall(velocity, &normal, restitution)
}

/// Rigid body taking part in an impulse collision.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionBody {
    pub velocity: Vector3<f64>,
    pub angular_velocity: Vector3<f64>,
    pub contact_vector: Vector3<f64>,
    pub mass: f64,

    /// Inverse inertia in the collision frame.
    pub inverse_inertia: Matrix3<f64>,
}

impl CollisionBody {
    /// Velocity of the contact point.
    pub fn contact_velocity(&self) -> Vector3<f64> {
        self.velocity + self.angular_velocity.cross(&self.contact_vector)
    }

    fn effective_inverse_mass(&self, n: &Vector3<f64>) -> f64 {
        let r = &self.contact_vector;
        1. / self.mass + n.dot(&(self.inverse_inertia * r.cross(n)).cross(r))
    }
}

/// Impulse on `body` (N*s) from hitting `target` along `normal`.
///
/// A `None` target is static. The orientation of `normal` does not matter.
/// Contact points already separating get a zero impulse, where the contact vector of
/// `body` tells which side of the contact it is on.
/// Returns `None` for a zero-length normal.
pub fn impulse_by_collision(
    body: &CollisionBody,
    target: Option<&CollisionBody>,
    normal: &Vector3<f64>,
    restitution: f64,
) -> Option<Vector3<f64>> {
    let n = normal.try_normalize(MIN_NORMAL_NORM)?;

    let target_velocity = target.map_or_else(Vector3::zeros, |t| t.contact_velocity());
    let relative_velocity = body.contact_velocity() - target_velocity;

    // Approaching means moving toward the contact seen from the center of mass
    let side = body.contact_vector.dot(&n);
    if side.abs() > MIN_NORMAL_NORM && relative_velocity.dot(&n) * side <= 0. {
        return Some(Vector3::zeros());
    }

    let inverse_mass = body.effective_inverse_mass(&n)
        + target.map_or(0., |t| t.effective_inverse_mass(&n));

    let j = -(1. + restitution) * relative_velocity.dot(&n) / inverse_mass;
    Some(n * j)
}

pub fn delta_velocity_from_impulse(impulse: &Vector3<f64>, mass: f64) -> Vector3<f64> {
    impulse / mass
}

pub fn delta_angular_velocity_from_impulse(
    impulse: &Vector3<f64>,
    contact_vector: &Vector3<f64>,
    inverse_inertia: &Matrix3<f64>,
) -> Vector3<f64> {
    inverse_inertia * contact_vector.cross(impulse)
}

/// Inverse of a diagonal inertia.
pub fn inverse_diagonal(inertia: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::from_diagonal(&inertia.map(|i| 1. / i))
}

impl ImpulseCollision {
    /// The target as seen from the body frame of self at attitude `self_euler`.
    pub fn target_body(&self, self_euler: &Vector3<f64>) -> Option<CollisionBody> {
        if self.is_target_static {
            return None;
        }

        // Target body frame to self body frame
        let relative =
            rotation_from_euler(self_euler).transpose() * rotation_from_euler(&Vector3::from(self.target_euler));
        let rotation = relative.matrix();
        let inverse_inertia =
            rotation * inverse_diagonal(&Vector3::from(self.target_inertia)) * rotation.transpose();

        Some(CollisionBody {
            velocity: Vector3::from(self.target_velocity),
            angular_velocity: Vector3::from(self.target_angular_velocity),
            contact_vector: Vector3::from(self.target_contact_vector),
            mass: self.target_mass,
            inverse_inertia,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn point(velocity: Vector3<f64>, mass: f64) -> CollisionBody {
        CollisionBody {
            velocity,
            angular_velocity: Vector3::zeros(),
            contact_vector: Vector3::zeros(),
            mass,
            inverse_inertia: inverse_diagonal(&Vector3::new(1., 1., 1.)),
        }
    }

    #[test]
    fn elastic_wall_preserves_speed() {
        let v = Vector3::new(3., -1., 2.);
        let n = Vector3::new(1., 1., 0.);
        let reflected = velocity_after_contact_with_wall(&v, &n, 1.).unwrap();
        assert_relative_eq!(reflected.norm(), v.norm(), epsilon = 1e-12);
        assert_relative_eq!(reflected, Vector3::new(1., -3., 2.), epsilon = 1e-12);
    }

    #[test]
    fn inelastic_wall_removes_normal_velocity() {
        let v = Vector3::new(3., -1., 2.);
        let n = Vector3::new(0., 0., -4.);
        let reflected = velocity_after_contact_with_wall(&v, &n, 0.).unwrap();
        assert_relative_eq!(reflected.z, 0., epsilon = 1e-12);
        assert_relative_eq!(reflected.x, 3.);
        assert_relative_eq!(reflected.y, -1.);
    }

    #[test]
    fn zero_normal_is_rejected() {
        assert!(velocity_after_contact_with_wall(&Vector3::x(), &Vector3::zeros(), 1.).is_none());
        assert!(impulse_by_collision(&point(Vector3::x(), 1.), None, &Vector3::zeros(), 1.).is_none());
    }

    #[test]
    fn receding_body_keeps_velocity() {
        let v = Vector3::new(-1., 0., 0.);
        let after =
            velocity_after_contact_with_point(&v, &Vector3::zeros(), &Vector3::new(0.5, 0., 0.), 1.)
                .unwrap();
        assert_eq!(after, v);
    }

    #[test]
    fn equal_mass_impulse_matches_closed_form() {
        let mass = 2.;
        let body = point(Vector3::new(1.5, 0., 0.), mass);
        let target = point(Vector3::zeros(), mass);
        let normal = Vector3::new(1., 0., 0.);
        let e = 1.;

        let impulse = impulse_by_collision(&body, Some(&target), &normal, e).unwrap();
        // j = -(1 + e)(v.n) / (1/m + 1/m)
        let expected = Vector3::new(-(1. + e) * 1.5 / (2. / mass), 0., 0.);
        assert_relative_eq!(impulse, expected, epsilon = 1e-12);

        let dv = delta_velocity_from_impulse(&impulse, mass);
        assert_relative_eq!(dv, impulse / mass);
        // Elastic and equal masses: self stops, the target takes the momentum
        assert_relative_eq!(body.velocity + dv, Vector3::zeros(), epsilon = 1e-12);
        let target_after = target.velocity - delta_velocity_from_impulse(&impulse, mass);
        assert_relative_eq!(
            mass * (body.velocity + dv) + mass * target_after,
            mass * body.velocity,
            epsilon = 1e-12
        );
    }

    #[test]
    fn normal_orientation_does_not_matter() {
        let body = point(Vector3::new(1., 0.5, 0.), 1.);
        let target = point(Vector3::new(-0.2, 0., 0.), 3.);
        let n = Vector3::new(1., 0.2, 0.);

        let a = impulse_by_collision(&body, Some(&target), &n, 0.6).unwrap();
        let b = impulse_by_collision(&body, Some(&target), &-n, 0.6).unwrap();
        assert_relative_eq!(a, b, epsilon = 1e-12);
    }

    #[test]
    fn static_target_acts_like_wall() {
        let body = point(Vector3::new(2., 1., 0.), 1.5);
        let n = Vector3::new(1., 0., 0.);
        let impulse = impulse_by_collision(&body, None, &n, 1.).unwrap();
        let after = body.velocity + delta_velocity_from_impulse(&impulse, body.mass);
        assert_relative_eq!(
            after,
            velocity_after_contact_with_wall(&body.velocity, &n, 1.).unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn off_center_impulse_spins_body() {
        let mut body = point(Vector3::new(1., 0., 0.), 1.);
        body.contact_vector = Vector3::new(0.5, 0.5, 0.);
        body.inverse_inertia = inverse_diagonal(&Vector3::new(0.1, 0.1, 0.2));

        let impulse = impulse_by_collision(&body, None, &Vector3::x(), 1.).unwrap();
        let dw = delta_angular_velocity_from_impulse(&impulse, &body.contact_vector, &body.inverse_inertia);

        // r x J with r = (0.5, 0.5, 0) and J along -x spins the body about +z
        assert!(impulse.x < 0.);
        assert!(dw.z > 0.);
        assert_relative_eq!(dw.x, 0., epsilon = 1e-12);
        assert_relative_eq!(dw.y, 0., epsilon = 1e-12);

        // Off-center contact absorbs part of the impulse into rotation
        assert!(impulse.x.abs() < 2.);
    }

    #[test]
    fn separating_contact_gets_no_impulse() {
        let mut body = point(Vector3::new(-1., 0., 0.), 1.);
        body.contact_vector = Vector3::new(0.5, 0., 0.);
        let target = point(Vector3::zeros(), 1.);

        for n in [Vector3::x(), -Vector3::x()] {
            let impulse = impulse_by_collision(&body, Some(&target), &n, 1.).unwrap();
            assert_eq!(impulse, Vector3::zeros());
        }

        // the same contact while approaching pushes the body back
        body.velocity = Vector3::new(1., 0., 0.);
        let impulse = impulse_by_collision(&body, Some(&target), &-Vector3::x(), 1.).unwrap();
        assert!(impulse.x < 0.);
    }

    #[test]
    fn target_inertia_rotates_into_self_frame() {
        let collision = ImpulseCollision {
            is_target_static: false,
            restitution: 1.,
            self_contact_vector: [0.; 3],
            normal: [1., 0., 0.],
            target_contact_vector: [0.; 3],
            target_velocity: [0.; 3],
            target_angular_velocity: [0.; 3],
            target_euler: [0., 0., core::f64::consts::FRAC_PI_2],
            target_inertia: [1., 2., 4.],
            target_mass: 1.,
        };

        let target = collision.target_body(&Vector3::zeros()).unwrap();
        // A quarter turn in yaw swaps the x and y principal axes
        assert_relative_eq!(target.inverse_inertia[(0, 0)], 0.5, epsilon = 1e-12);
        assert_relative_eq!(target.inverse_inertia[(1, 1)], 1., epsilon = 1e-12);
        assert_relative_eq!(target.inverse_inertia[(2, 2)], 0.25, epsilon = 1e-12);

        let fixed = ImpulseCollision {
            is_target_static: true,
            ..collision
        };
        assert!(fixed.target_body(&Vector3::zeros()).is_none());
    }
}
