//! Cascaded flight control.
//!
//! Altitude, heading and position stages produce a collective thrust, a yaw-rate and
//! tilt targets. The angular-rate stage turns those into a body torque and the
//! [`Mixer`] allocates the resulting [`Wrench`] to rotor duty rates.

use crate::{dynamics::BodyParams, frame::wrap_pi, sensor::BodySnapshot, thrust::Wrench};
use log::trace;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

mod altitude;
pub use altitude::AltitudeController;

mod angular_rate;
pub use angular_rate::AngularRateController;

mod heading;
pub use heading::HeadingController;

mod mixer;
pub use mixer::{DutyModel, Limit, Mixer, MixerOutput};

pub mod pid;
pub use pid::{Pid, PidGains};

mod position;
pub use position::{PositionController, TiltTarget};

mod radio;
pub use radio::{Button, RadioCommand, RadioState, StickAxis};

/// Gains and limits of every control stage.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlParams {
    /// Altitude error to climb rate.
    pub altitude_p: f64,
    pub climb_rate: PidGains,

    /// (m/s)
    pub max_climb_rate: f64,

    /// Yaw error to yaw-rate.
    pub heading_p: f64,

    /// (rad/s)
    pub max_yaw_rate: f64,

    /// Horizontal position error to velocity.
    pub position_p: f64,
    pub velocity: PidGains,

    /// Horizontal speed of radio control at full stick (m/s).
    pub max_speed: f64,

    /// (rad)
    pub max_roll: f64,

    /// (rad)
    pub max_pitch: f64,

    /// Angle error to body rate.
    pub angle_p: f64,
    pub roll_rate: PidGains,
    pub pitch_rate: PidGains,
    pub yaw_rate: PidGains,

    /// Largest torque magnitude (N*m).
    pub max_torque: f64,

    /// Stick travel back toward center per undriven tick.
    pub stick_decay: f64,

    /// How long a button stays pressed (us).
    pub button_ttl_usec: u64,
}

impl Default for ControlParams {
    fn default() -> Self {
        Self {
            altitude_p: 1.,
            climb_rate: PidGains {
                kp: 3.,
                ki: 0.5,
                kd: 0.,
                imax: 2.,
                filter_d_hz: 0.,
            },
            max_climb_rate: 2.,
            heading_p: 2.,
            max_yaw_rate: 1.5,
            position_p: 1.,
            velocity: PidGains {
                kp: 2.,
                ki: 0.1,
                kd: 0.,
                imax: 1.,
                filter_d_hz: 0.,
            },
            max_speed: 5.,
            max_roll: 0.35,
            max_pitch: 0.35,
            angle_p: 6.,
            roll_rate: PidGains::p(20.),
            pitch_rate: PidGains::p(20.),
            yaw_rate: PidGains::p(5.),
            max_torque: 1.,
            stick_decay: 0.001,
            button_ttl_usec: 100_000,
        }
    }
}

/// How targets reach the controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ControlMode {
    /// Scripted position, altitude and heading targets.
    #[default]
    Api,

    /// Stick input. With `angle_direct` the sticks command roll and pitch
    /// instead of horizontal velocity.
    RadioControl { angle_direct: bool },
}

/// Setpoint of the scripted mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiTarget {
    /// (m)
    pub north: f64,

    /// (m)
    pub east: f64,

    /// Above the ground frame origin (m).
    pub altitude: f64,

    /// (rad)
    pub yaw: f64,

    /// Horizontal speed limit (m/s).
    pub speed: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlTarget {
    Api(ApiTarget),
    Radio(RadioCommand),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControlOutput {
    /// Thrust and torque asked of the rotors.
    pub demand: Wrench,

    /// Duty rate of each rotor.
    pub duty: Vec<f64>,
}

/// Every control stage plus the mixer.
#[derive(Clone, Debug)]
pub struct ControlStack {
    mode: ControlMode,
    params: ControlParams,
    dt: f64,
    dt_usec: u64,

    altitude: AltitudeController,
    heading: HeadingController,
    position: PositionController,
    angular_rate: AngularRateController,
    mixer: Mixer,
    radio: RadioState,

    api_target: Option<ApiTarget>,
    radio_altitude: Option<f64>,
    radio_yaw: Option<f64>,
}

impl ControlStack {
    pub fn new(
        mode: ControlMode,
        params: ControlParams,
        body: &BodyParams,
        thrust_max: f64,
        mixer: Mixer,
        dt: f64,
    ) -> Self {
        Self {
            mode,
            params,
            dt,
            dt_usec: (dt * 1e6).round() as u64,
            altitude: AltitudeController::new(&params, body.mass, body.gravity, thrust_max, dt),
            heading: HeadingController::new(params.heading_p, params.max_yaw_rate),
            position: PositionController::new(&params, body.gravity, dt),
            angular_rate: AngularRateController::new(&params, body.inertia, dt),
            mixer,
            radio: RadioState::new(params.stick_decay, params.button_ttl_usec),
            api_target: None,
            radio_altitude: None,
            radio_yaw: None,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn params(&self) -> &ControlParams {
        &self.params
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    pub fn radio(&self) -> &RadioState {
        &self.radio
    }

    /// The scripted target being tracked, if any.
    pub fn api_target(&self) -> Option<&ApiTarget> {
        self.api_target.as_ref()
    }

    /// Compute the next rotor duties from the body state and the latest target.
    ///
    /// Targets that do not match the mode are ignored.
    pub fn run(&mut self, state: &BodySnapshot, target: Option<&ControlTarget>) -> ControlOutput {
        let euler = state.euler;
        let altitude = -state.position.z;
        let climb_rate = -state.ground_velocity.z;
        let position = Vector2::new(state.position.x, state.position.y);
        let velocity = Vector2::new(state.ground_velocity.x, state.ground_velocity.y);

        let (target_altitude, target_yaw, tilt) = match self.mode {
            ControlMode::Api => {
                if let Some(ControlTarget::Api(api)) = target {
                    self.api_target = Some(*api);
                }
                // Hold the current pose until a target arrives
                let max_speed = self.params.max_speed;
                let api = *self.api_target.get_or_insert(ApiTarget {
                    north: position.x,
                    east: position.y,
                    altitude,
                    yaw: euler.z,
                    speed: max_speed,
                });

                let tilt = self.position.run(
                    &Vector2::new(api.north, api.east),
                    &position,
                    &velocity,
                    euler.z,
                    api.speed,
                );
                (api.altitude, api.yaw, tilt)
            }
            ControlMode::RadioControl { angle_direct } => {
                let command = match target {
                    Some(ControlTarget::Radio(command)) => Some(command),
                    _ => None,
                };
                self.radio.update(command, self.dt_usec);

                let vertical = self.radio.stick(StickAxis::Vertical);
                let heading = self.radio.stick(StickAxis::Heading);
                let forward = self.radio.stick(StickAxis::Forward);
                let horizontal = self.radio.stick(StickAxis::Horizontal);

                // 1. Move the altitude and heading targets with the sticks
                let target_altitude = self.radio_altitude.get_or_insert(altitude);
                *target_altitude += vertical * self.params.max_climb_rate * self.dt;
                let target_altitude = *target_altitude;

                let target_yaw = self.radio_yaw.get_or_insert(euler.z);
                *target_yaw = wrap_pi(*target_yaw + heading * self.params.max_yaw_rate * self.dt);
                let target_yaw = *target_yaw;

                // 2. Tilt straight from the sticks or through the velocity loop
                let tilt = if angle_direct {
                    TiltTarget {
                        roll: horizontal * self.params.max_roll,
                        pitch: -forward * self.params.max_pitch,
                    }
                } else {
                    let (sin_yaw, cos_yaw) = euler.z.sin_cos();
                    let speed = self.params.max_speed;
                    let target_velocity = Vector2::new(
                        (cos_yaw * forward - sin_yaw * horizontal) * speed,
                        (sin_yaw * forward + cos_yaw * horizontal) * speed,
                    );
                    self.position.run_speed(&target_velocity, &velocity, euler.z)
                };

                (target_altitude, target_yaw, tilt)
            }
        };

        let thrust = self.altitude.run(target_altitude, altitude, climb_rate, &euler);
        let yaw_rate = self.heading.run(target_yaw, euler.z);
        let torque = self.angular_rate.run(
            &euler,
            &state.angular_velocity,
            tilt.roll,
            tilt.pitch,
            yaw_rate,
        );

        let demand = Wrench::new(thrust, torque);
        let MixerOutput { duty, limit } = self.mixer.output(&demand);
        self.altitude
            .set_limit(limit.throttle_lower || limit.throttle_upper);

        trace!(
            "control: thrust {:.3} torque [{:.4}, {:.4}, {:.4}] tilt ({:.3}, {:.3})",
            thrust,
            torque.x,
            torque.y,
            torque.z,
            tilt.roll,
            tilt.pitch
        );

        ControlOutput { demand, duty }
    }

    /// Clear every integrator, the sticks and the held targets.
    pub fn reset(&mut self) {
        self.altitude.reset();
        self.position.reset();
        self.angular_rate.reset();
        self.radio.reset();
        self.api_target = None;
        self.radio_altitude = None;
        self.radio_yaw = None;
    }
}
