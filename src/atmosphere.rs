//! Standard atmosphere.

/// Sea-level pressure (hPa).
pub const SEA_LEVEL_PRESSURE_HPA: f64 = 1013.25;

/// Temperature lapse rate of the troposphere (K/m).
const LAPSE_RATE: f64 = 0.0065;

const PRESSURE_EXPONENT: f64 = 5.2561;

/// Temperature of the standard atmosphere at sea level (Celsius).
pub const STANDARD_TEMPERATURE_CELSIUS: f64 = 15.;

/// Atmospheric pressure at `altitude` meters above sea level, scaled from `sea_level_atm`.
///
/// Returns pressure in the same unit as `sea_level_atm`.
pub fn atmospheric_pressure(sea_level_atm: f64, altitude: f64, ground_temp_celsius: f64) -> f64 {
    let t0 = ground_temp_celsius + 273.15;
    let ratio = (1. - LAPSE_RATE * altitude / t0).max(0.);
    sea_level_atm * ratio.powf(PRESSURE_EXPONENT)
}
