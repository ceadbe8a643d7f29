use crate::{
    rotor::{Battery, RotorConstants},
    thrust::{RotorConfig, Wrench},
    Error, Result,
};
use nalgebra::{DMatrix, DVector};

/// Smallest determinant of the row-normalized `M * M^T` accepted as invertible.
const SINGULAR_DETERMINANT: f64 = 1e-9;

/// Conversion from a steady rotor speed to the duty rate holding it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DutyModel {
    /// First-order lag rotor, speed is proportional to duty.
    Lag { rad_per_sec_max: f64 },

    /// Battery driven motor, solved from its steady state.
    Battery {
        battery: Battery,
        constants: RotorConstants,
    },
}

impl DutyModel {
    pub fn duty(&self, omega: f64) -> f64 {
        match self {
            DutyModel::Lag { rad_per_sec_max } => omega / rad_per_sec_max,
            DutyModel::Battery { battery, constants } => battery.steady_duty(constants, omega),
        }
    }
}

/// Saturation seen by the last allocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Limit {
    /// A rotor was asked for negative thrust.
    pub throttle_lower: bool,

    /// A rotor was asked for more than full duty.
    pub throttle_upper: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MixerOutput {
    pub duty: Vec<f64>,
    pub limit: Limit,
}

/// Allocates a thrust and torque demand to rotor duty rates.
///
/// Each rotor contributes `ct * w^2` of thrust, `-y * ct * w^2` of roll torque,
/// `x * ct * w^2` of pitch torque and `ccw * cq * w^2` of yaw torque.
/// Squared speeds come from the pseudo-inverse of that factor matrix.
#[derive(Clone, Debug)]
pub struct Mixer {
    allocation: DMatrix<f64>,
    model: DutyModel,
}

impl Mixer {
    /// # Errors
    /// Returns [`Error::SingularMixer`] if the rotors cannot produce every axis independently.
    pub fn new(rotors: &[RotorConfig], constants: &RotorConstants, model: DutyModel) -> Result<Self> {
        let factors = DMatrix::from_fn(4, rotors.len(), |row, col| {
            let rotor = &rotors[col];
            match row {
                0 => constants.ct,
                1 => -rotor.position[1] * constants.ct,
                2 => rotor.position[0] * constants.ct,
                _ => rotor.ccw * constants.cq,
            }
        });

        // Rows differ by orders of magnitude, normalize them before checking the rank
        let scale = DVector::from_fn(4, |row, _| factors.row(row).amax());
        if scale.iter().any(|&s| !(s > 0.)) {
            return Err(Error::SingularMixer);
        }
        let normalized = DMatrix::from_fn(4, rotors.len(), |row, col| factors[(row, col)] / scale[row]);

        let gram = &normalized * normalized.transpose();
        if gram.determinant().abs() < SINGULAR_DETERMINANT {
            return Err(Error::SingularMixer);
        }
        let gram_inverse = gram.try_inverse().ok_or(Error::SingularMixer)?;

        // M+ = N^T (N N^T)^-1 S^-1 for M = S N
        let unscale = DMatrix::from_diagonal(&scale.map(|s| 1. / s));
        let allocation = normalized.transpose() * gram_inverse * unscale;

        Ok(Self { allocation, model })
    }

    pub fn rotor_count(&self) -> usize {
        self.allocation.nrows()
    }

    /// Squared rotor speeds producing `demand`, before clamping.
    pub fn squared_speeds(&self, demand: &Wrench) -> DVector<f64> {
        let demand = DVector::from_column_slice(&[
            demand.thrust,
            demand.torque.x,
            demand.torque.y,
            demand.torque.z,
        ]);
        &self.allocation * demand
    }

    /// Rotor speeds (rad/s) producing `demand`, negative squares clamped to zero.
    pub fn rad_per_sec(&self, demand: &Wrench) -> Vec<f64> {
        self.squared_speeds(demand)
            .iter()
            .map(|&u| crate::safe_sqrt(u))
            .collect()
    }

    /// Duty rates producing `demand`, each clamped to `0..=1`.
    pub fn output(&self, demand: &Wrench) -> MixerOutput {
        let mut limit = Limit::default();

        let duty = self
            .squared_speeds(demand)
            .iter()
            .map(|&u| {
                if u < 0. {
                    limit.throttle_lower = true;
                }
                let duty = self.model.duty(crate::safe_sqrt(u));
                if duty > 1. {
                    limit.throttle_upper = true;
                }
                crate::constrain_float(duty, 0., 1.)
            })
            .collect();

        MixerOutput { duty, limit }
    }
}
