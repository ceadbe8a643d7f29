use super::{Sensor, SensorConfig, SensorKind, VectorChannel};
use crate::Result;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Equatorial Earth radius (m).
pub const EARTH_RADIUS: f64 = 6_378_137.;

/// Geodetic origin of the NED ground frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoReference {
    pub latitude_deg: f64,
    pub longitude_deg: f64,

    /// Altitude of the ground frame origin above sea level (m).
    pub altitude: f64,
}

impl Default for GeoReference {
    fn default() -> Self {
        Self {
            latitude_deg: 35.6809591,
            longitude_deg: 139.7673068,
            altitude: 0.,
        }
    }
}

impl GeoReference {
    /// Latitude and longitude (deg) of a NED offset from the reference.
    pub fn coordinates(&self, north: f64, east: f64) -> (f64, f64) {
        let lat = self.latitude_deg + (north / EARTH_RADIUS).to_degrees();
        let lon = self.longitude_deg
            + (east / (EARTH_RADIUS * self.latitude_deg.to_radians().cos())).to_degrees();
        (lat, lon)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GpsInput {
    /// Ground frame (m).
    pub position: Vector3<f64>,

    /// Ground frame (m/s).
    pub ground_velocity: Vector3<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsSample {
    pub latitude_deg: f64,
    pub longitude_deg: f64,

    /// Above sea level (m).
    pub altitude: f64,

    /// North, east, down (m/s).
    pub velocity: [f64; 3],

    /// Horizontal speed (m/s).
    pub ground_speed: f64,

    /// Course over ground in `[0, 360)` (deg).
    pub course_deg: f64,
}

/// Position and velocity around a geodetic reference.
#[derive(Clone, Debug)]
pub struct Gps {
    reference: GeoReference,
    position: VectorChannel,
    velocity: VectorChannel,
    value: GpsSample,
}

impl Gps {
    pub fn new(config: &SensorConfig, reference: GeoReference, seed: Option<u64>) -> Result<Self> {
        // Velocity noise draws from its own sequence
        let velocity_seed = seed.map(|seed| seed ^ 0x9e37_79b9_7f4a_7c15);
        Ok(Self {
            reference,
            position: VectorChannel::new(config, seed)?,
            velocity: VectorChannel::new(config, velocity_seed)?,
            value: Self::sample(&reference, &Vector3::zeros(), &Vector3::zeros()),
        })
    }

    pub fn reference(&self) -> &GeoReference {
        &self.reference
    }

    fn sample(reference: &GeoReference, position: &Vector3<f64>, velocity: &Vector3<f64>) -> GpsSample {
        let (latitude_deg, longitude_deg) = reference.coordinates(position.x, position.y);
        let course_deg = velocity.y.atan2(velocity.x).to_degrees().rem_euclid(360.);

        GpsSample {
            latitude_deg,
            longitude_deg,
            altitude: reference.altitude - position.z,
            velocity: [velocity.x, velocity.y, velocity.z],
            ground_speed: velocity.x.hypot(velocity.y),
            course_deg,
        }
    }
}

impl Sensor for Gps {
    type Input = GpsInput;
    type Sample = GpsSample;

    const KIND: SensorKind = SensorKind::Gps;

    fn run(&mut self, input: &Self::Input) {
        self.position.add_data(&input.position);
        self.velocity.add_data(&input.ground_velocity);

        // Noise is in meters before the conversion to degrees
        let position = self.position.noisy();
        let velocity = self.velocity.noisy();
        self.value = Self::sample(&self.reference, &position, &velocity);
    }

    fn sensor_value(&self) -> Self::Sample {
        self.value
    }

    fn reset(&mut self) {
        self.position.reset();
        self.velocity.reset();
        self.value = Self::sample(&self.reference, &Vector3::zeros(), &Vector3::zeros());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn gps() -> Gps {
        let reference = GeoReference {
            latitude_deg: 0.,
            longitude_deg: 0.,
            altitude: 100.,
        };
        Gps::new(&SensorConfig::default(), reference, None).unwrap()
    }

    #[test]
    fn origin_is_reference() {
        let mut gps = gps();
        gps.run(&GpsInput::default());
        let sample = gps.sensor_value();
        assert_eq!(sample.latitude_deg, 0.);
        assert_eq!(sample.longitude_deg, 0.);
        assert_eq!(sample.altitude, 100.);
    }

    #[test]
    fn north_offset_moves_latitude() {
        let mut gps = gps();
        let one_degree = EARTH_RADIUS * 1f64.to_radians();
        gps.run(&GpsInput {
            position: Vector3::new(one_degree, 0., -10.),
            ..Default::default()
        });
        let sample = gps.sensor_value();
        assert_relative_eq!(sample.latitude_deg, 1., epsilon = 1e-9);
        assert_relative_eq!(sample.altitude, 110.);
    }

    #[test]
    fn course_and_speed() {
        let mut gps = gps();
        gps.run(&GpsInput {
            ground_velocity: Vector3::new(-3., -4., 1.),
            ..Default::default()
        });
        let sample = gps.sensor_value();
        assert_relative_eq!(sample.ground_speed, 5.);
        // heading south west
        assert!(sample.course_deg > 180. && sample.course_deg < 270.);
        assert_eq!(sample.velocity, [-3., -4., 1.]);
    }
}
