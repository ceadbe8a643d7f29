//! Rotor downwash reflected off a nearby surface (ground effect, walls, ceilings).

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Range of the effect in rotor radii.
pub const BOUNDARY_RANGE_IN_ROTOR_RADII: f64 = 5.;

/// A boundary plane in the ground frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    /// Any point on the plane (m).
    pub point: [f64; 3],

    /// Plane normal. Either orientation may be given.
    pub normal: [f64; 3],
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryDisturbance {
    /// Strength of the reflected flow as a fraction of the rotor thrust.
    pub power: f64,

    /// Falloff exponent with distance.
    pub exponent: f64,
}

impl Default for BoundaryDisturbance {
    fn default() -> Self {
        Self {
            power: 1.,
            exponent: 1.5,
        }
    }
}

impl BoundaryDisturbance {
    /// Force (N, ground frame) on a body at `position` whose rotors push air along `downwash`.
    ///
    /// The reflected flow is the mirror image of the downwash in the boundary plane and
    /// scales with `(rotor_radius / distance)^exponent` inside `5 * rotor_radius`.
    pub fn force(
        &self,
        boundary: &Boundary,
        position: &Vector3<f64>,
        downwash: &Vector3<f64>,
        thrust: f64,
        rotor_radius: f64,
    ) -> Vector3<f64> {
        let Some(mut normal) = Vector3::from(boundary.normal).try_normalize(1e-9) else {
            return Vector3::zeros();
        };
        let Some(downwash) = downwash.try_normalize(1e-9) else {
            return Vector3::zeros();
        };

        // Orient the normal toward the body
        let mut distance = (position - Vector3::from(boundary.point)).dot(&normal);
        if distance < 0. {
            normal = -normal;
            distance = -distance;
        }

        if distance > BOUNDARY_RANGE_IN_ROTOR_RADII * rotor_radius {
            return Vector3::zeros();
        }

        // Only flow blown at the boundary comes back
        let incidence = downwash.dot(&normal);
        if incidence >= 0. {
            return Vector3::zeros();
        }

        let reflected = downwash - normal * (2. * incidence);
        let falloff = (rotor_radius / distance.max(rotor_radius)).powf(self.exponent);
        reflected * (self.power * thrust * falloff)
    }
}
