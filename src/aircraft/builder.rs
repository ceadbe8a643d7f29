use super::Aircraft;
use crate::{
    config::AircraftConfig,
    control::{ControlMode, ControlStack, DutyModel, Mixer},
    dynamics::RigidBodyDynamics,
    rotor::Rotor,
    sensor::SensorSuite,
    thrust::{ThrustAggregator, Wrench},
    Result,
};
use embedded_time::duration::Microseconds;
use log::info;

/// Builds the parts of an [`Aircraft`] in order and hands them over.
#[derive(Clone, Debug, Default)]
pub struct AircraftBuilder {
    config: Option<AircraftConfig>,
    noise_seed: Option<u64>,
    control_mode: Option<ControlMode>,
    direct_rotor_control: Option<bool>,
}

impl AircraftBuilder {
    pub fn config(mut self, config: AircraftConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the configured noise seed.
    pub fn noise_seed(mut self, seed: u64) -> Self {
        self.noise_seed = Some(seed);
        self
    }

    pub fn control_mode(mut self, mode: ControlMode) -> Self {
        self.control_mode = Some(mode);
        self
    }

    pub fn direct_rotor_control(mut self, enabled: bool) -> Self {
        self.direct_rotor_control = Some(enabled);
        self
    }

    /// # Errors
    /// Returns the first fatal configuration error found.
    pub fn build(self) -> Result<Aircraft> {
        let mut config = self.config.unwrap_or_default();
        if let Some(seed) = self.noise_seed {
            config.noise_seed = Some(seed);
        }
        if let Some(mode) = self.control_mode {
            config.control_mode = mode;
        }
        if let Some(enabled) = self.direct_rotor_control {
            config.direct_rotor_control = enabled;
        }
        config.validate()?;

        let dt = config.time_step;
        let hover = config.hover_rad_per_sec();
        let rad_per_sec_max = config.rad_per_sec_max();
        let time_constant = config.rotor_time_constant();

        // 1. Actuators
        let rotors = (0..config.rotor_count)
            .map(|_| match config.battery {
                Some(battery) => Rotor::battery(config.rotor, battery, rad_per_sec_max, dt),
                None => Rotor::lag(config.rotor, rad_per_sec_max, time_constant, dt),
            })
            .collect::<Result<Vec<_>>>()?;
        let aggregator = ThrustAggregator::new(config.rotors.clone(), config.rotor);

        // 2. Body and sensors
        let body = config.body_params();
        let dynamics = RigidBodyDynamics::new(
            body,
            config.dynamics_options(),
            config.attitude,
            config.initial_position(),
            config.initial_euler(),
            dt,
        )?;
        let sensors = SensorSuite::new(
            &config.sensors,
            config.reference,
            config.magnetic_field,
            dt,
            config.gravity,
            config.noise_seed,
        )?;

        // 3. Controller and mixer
        let duty_model = match config.battery {
            Some(battery) => DutyModel::Battery {
                battery,
                constants: config.rotor,
            },
            None => DutyModel::Lag { rad_per_sec_max },
        };
        let mixer = Mixer::new(&config.rotors, &config.rotor, duty_model)?;
        let control = ControlStack::new(
            config.control_mode,
            config.control,
            &body,
            config.thrust_max(),
            mixer,
            dt,
        );

        info!(
            "Aircraft ready: {} rotors, hover {:.1} rad/s, max {:.1} rad/s, time constant {:.4} s",
            config.rotor_count, hover, rad_per_sec_max, time_constant
        );
        info!("Mixer ready for {:?} control", config.control_mode);

        Ok(Aircraft {
            dt_usec: config.time_step_usec(),
            duty: vec![0.; rotors.len()],
            rotors,
            aggregator,
            dynamics,
            sensors,
            control,
            demand: Wrench::default(),
            time: Microseconds(0),
            ticks: 0,
            last_input: None,
            config,
        })
    }
}
