use crate::sensor::SensorKind;

/// An error raised while building or running an aircraft.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("mass must be positive, got {0} kg")]
    NonPositiveMass(f64),

    #[error("inertia about the {axis} axis must be positive, got {value} kg*m^2")]
    NonPositiveInertia { axis: char, value: f64 },

    #[error("rotor resistance must be positive, got {0} ohm")]
    NonPositiveResistance(f64),

    #[error("rotor inertia must be positive, got {0} kg*m^2")]
    NonPositiveRotorInertia(f64),

    #[error("rotor time constant must be positive, got {0} s")]
    NonPositiveTimeConstant(f64),

    #[error("thrust coefficient must be positive, got {0}")]
    NonPositiveThrustCoefficient(f64),

    #[error("timestep must be positive, got {0} s")]
    NonPositiveTimeStep(f64),

    #[error("timestep must be a whole number of microseconds, got {0} s")]
    FractionalTimeStep(f64),

    #[error("gravity must be positive to hover, got {0} m/s^2")]
    NonPositiveGravity(f64),

    #[error("battery voltage must be positive, got {0} V")]
    NonPositiveBatteryVoltage(f64),

    #[error("motor constant must be positive with a battery, got {0}")]
    NonPositiveMotorConstant(f64),

    #[error("expected {expected} rotor positions, got {actual}")]
    RotorCountMismatch { expected: usize, actual: usize },

    #[error("mixer allocation matrix is singular")]
    SingularMixer,

    #[error("sample window of the {0:?} sensor must hold at least one sample")]
    EmptySampleWindow(SensorKind),

    #[error("invalid noise distribution: {0}")]
    Noise(#[from] rand_distr::NormalError),

    #[error("expected {expected} duty commands, got {actual}")]
    DutyCountMismatch { expected: usize, actual: usize },

    #[error("the aircraft has not run a tick yet")]
    NotYetRun,
}

pub type Result<T> = core::result::Result<T, Error>;
