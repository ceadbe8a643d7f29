//! # copter-sim
//! A fixed-timestep flight dynamics and flight control engine for multirotor aircraft.
//!
//! # Physics
//! [`rotor`] models each rotor's electromechanics (first-order lag or battery coupled).
//!
//! [`thrust`] combines rotor thrusts and torques into a body [`Wrench`](thrust::Wrench).
//!
//! [`dynamics`] integrates the rigid body, resolves collisions and applies the
//! boundary disturbance and out-of-bounds reset policy.
//!
//! [`sensor`] derives noisy, window-averaged accelerometer, gyroscope, GPS,
//! barometer and magnetometer samples.
//!
//! # Control
//! [`control`] contains the cascaded PID controllers, radio-control handling and
//! the [`Mixer`](control::Mixer) that allocates a thrust/torque demand to rotor duties.
//!
//! # Aircraft
//! [`Aircraft`] ties everything together and runs one tick at a time
//! (see [`AircraftBuilder`] to construct one from an [`AircraftConfig`]).

pub mod aircraft;
pub use aircraft::{Aircraft, AircraftBuilder, AircraftInput, SimulationContext};

pub mod atmosphere;

pub mod config;
pub use config::AircraftConfig;

pub mod control;

pub mod dynamics;

mod error;
pub use error::{Error, Result};

pub mod filter;

pub mod frame;

pub mod rotor;

pub mod sensor;

pub mod thrust;

/// Standard gravity (m/s^2).
pub const GRAVITY: f64 = 9.81;

/// Constrain a value between `low` and `high`, mapping NaN to the midpoint.
pub fn constrain_float<T: num_traits::Float>(amt: T, low: T, high: T) -> T {
    if amt.is_nan() {
        return (low + high) / (T::one() + T::one());
    }

    if amt < low {
        return low;
    }

    if amt > high {
        return high;
    }

    amt
}

/// Square root that returns zero instead of NaN.
pub fn safe_sqrt<T: num_traits::Float>(v: T) -> T {
    let ret = v.sqrt();
    if ret.is_nan() {
        return T::zero();
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constrain_handles_nan() {
        assert_eq!(constrain_float(f64::NAN, 0., 1.), 0.5);
        assert_eq!(constrain_float(2.0f64, 0., 1.), 1.);
        assert_eq!(constrain_float(-2.0f64, 0., 1.), 0.);
    }

    #[test]
    fn safe_sqrt_of_negative_is_zero() {
        assert_eq!(safe_sqrt(-4.0f64), 0.);
        assert_eq!(safe_sqrt(4.0f64), 2.);
    }
}
