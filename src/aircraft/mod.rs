//! One simulated aircraft advanced a fixed timestep at a time.

use crate::{
    config::AircraftConfig,
    control::{ControlStack, ControlTarget},
    dynamics::{
        collision::CollisionEvent, Disturbance, DynamicsInput, ManualPose, RigidBodyDynamics,
    },
    rotor::{Rotor, RotorState},
    sensor::{BodySnapshot, SensorKind, SensorSample, SensorSuite},
    thrust::{ThrustAggregator, Wrench},
    Error, Result,
};
use embedded_time::duration::Microseconds;
use log::{info, trace, warn};
use nalgebra::{UnitQuaternion, Vector3};

mod builder;
pub use builder::AircraftBuilder;

/// Feature switches of a simulation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationFlags {
    /// Apply disturbance samples. Also needs `enable_disturbance` in the configuration.
    pub disturbance: bool,

    /// Log every tick at trace level.
    pub trace: bool,
}

impl Default for SimulationFlags {
    fn default() -> Self {
        Self {
            disturbance: true,
            trace: false,
        }
    }
}

/// Clock and flags handed to every tick.
#[derive(Clone, Copy, Debug)]
pub struct SimulationContext {
    pub time: Microseconds<u64>,
    pub flags: SimulationFlags,
}

impl Default for SimulationContext {
    fn default() -> Self {
        Self::new(SimulationFlags::default())
    }
}

impl SimulationContext {
    pub fn new(flags: SimulationFlags) -> Self {
        Self {
            time: Microseconds(0),
            flags,
        }
    }

    pub fn advance(&mut self, step: Microseconds<u64>) {
        self.time = Microseconds(self.time.0 + step.0);
    }
}

/// Everything an aircraft consumes in one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AircraftInput {
    /// Rotor duties, used with direct rotor control.
    pub duty: Option<Vec<f64>>,

    /// Pose override, used with manual control.
    pub manual: Option<ManualPose>,
    pub disturbance: Option<Disturbance>,
    pub target: Option<ControlTarget>,

    /// Thrust and torque fed straight to the dynamics instead of the rotors' wrench.
    pub wrench: Option<Wrench>,
}

pub struct Aircraft {
    config: AircraftConfig,
    dt_usec: u64,

    rotors: Vec<Rotor>,
    aggregator: ThrustAggregator,
    dynamics: RigidBodyDynamics,
    sensors: SensorSuite,
    control: ControlStack,

    duty: Vec<f64>,
    demand: Wrench,
    time: Microseconds<u64>,
    ticks: u64,
    last_input: Option<AircraftInput>,
}

impl Aircraft {
    /// Build an aircraft from `config`.
    pub fn new(config: AircraftConfig) -> Result<Self> {
        AircraftBuilder::default().config(config).build()
    }

    /// Advance one timestep.
    ///
    /// # Errors
    /// Returns [`Error::DutyCountMismatch`] if the input carries a duty per rotor count
    /// other than the aircraft's. The aircraft is left untouched in that case.
    pub fn run(&mut self, ctx: &SimulationContext, input: &AircraftInput) -> Result<()> {
        // 1. Pick this tick's duties
        if let Some(duty) = &input.duty {
            if duty.len() != self.rotors.len() {
                return Err(Error::DutyCountMismatch {
                    expected: self.rotors.len(),
                    actual: duty.len(),
                });
            }
            if self.config.direct_rotor_control {
                self.duty.clone_from(duty);
            }
        }

        let disturbance = if self.config.enable_disturbance && ctx.flags.disturbance {
            input.disturbance
        } else {
            None
        };

        // 2. Spin the rotors
        for (rotor, &duty) in self.rotors.iter_mut().zip(&self.duty) {
            rotor.run(duty);
        }

        // 3. Combine them, thinner air when disturbed
        let atm = match disturbance {
            Some(_) => self.sensors.sensor_value_without_noise_in_atm(),
            None => 1.,
        };
        let mut wrench = self.aggregator.run_rotors(&self.rotors, atm);
        if let Some(demand) = input.wrench {
            wrench = demand;
        }

        // 4. Move the body
        self.dynamics.run(&DynamicsInput {
            wrench,
            manual: input.manual,
            disturbance,
        });

        // 5. Sample it
        let snapshot = BodySnapshot {
            disturbance,
            ..self.snapshot()
        };
        self.sensors.run(&snapshot);

        // 6. Compute the next duties
        if !self.config.direct_rotor_control {
            let output = self.control.run(&snapshot, input.target.as_ref());
            self.demand = output.demand;
            self.duty = output.duty;
        }

        self.time = Microseconds(self.time.0 + self.dt_usec);
        self.ticks += 1;
        self.last_input = Some(input.clone());

        if ctx.flags.trace {
            trace!(
                "t={}us tick {}: pos [{:.3}, {:.3}, {:.3}] euler [{:.3}, {:.3}, {:.3}] thrust {:.3}",
                ctx.time.0,
                self.ticks,
                snapshot.position.x,
                snapshot.position.y,
                snapshot.position.z,
                snapshot.euler.x,
                snapshot.euler.y,
                snapshot.euler.z,
                wrench.thrust
            );
        }

        Ok(())
    }

    /// Queue a collision for the next tick. A later call replaces an unconsumed event.
    pub fn set_collision(&mut self, event: CollisionEvent) {
        self.dynamics.set_collision(event);
    }

    /// Return to the freshly built state, including the noise sequences.
    pub fn reset(&mut self) {
        for rotor in &mut self.rotors {
            rotor.reset();
        }
        self.aggregator.reset();
        self.dynamics.reset();
        self.sensors.reset();
        self.control.reset();

        self.duty = vec![0.; self.rotors.len()];
        self.demand = Wrench::default();
        self.time = Microseconds(0);
        self.ticks = 0;
        self.last_input = None;

        info!("Aircraft reset");
    }

    fn snapshot(&self) -> BodySnapshot {
        BodySnapshot {
            position: self.dynamics.position(),
            ground_velocity: self.dynamics.ground_velocity(),
            body_velocity: self.dynamics.body_velocity(),
            angular_velocity: self.dynamics.angular_velocity(),
            euler: self.dynamics.euler(),
            disturbance: None,
        }
    }

    /// Input of the last tick.
    pub fn last_input(&self) -> Result<&AircraftInput> {
        self.last_input.as_ref().ok_or(Error::NotYetRun)
    }

    /// Latest sample of the sensor `kind`.
    pub fn sensor(&self, kind: SensorKind) -> Result<SensorSample> {
        if self.ticks == 0 {
            warn!("{:?} read before the first tick", kind);
            return Err(Error::NotYetRun);
        }
        Ok(self.sensors.sample(kind))
    }

    pub fn sensors(&self) -> &SensorSuite {
        &self.sensors
    }

    pub fn config(&self) -> &AircraftConfig {
        &self.config
    }

    pub fn dynamics(&self) -> &RigidBodyDynamics {
        &self.dynamics
    }

    pub fn dynamics_mut(&mut self) -> &mut RigidBodyDynamics {
        &mut self.dynamics
    }

    pub fn control(&self) -> &ControlStack {
        &self.control
    }

    /// Ground frame (m).
    pub fn position(&self) -> Vector3<f64> {
        self.dynamics.position()
    }

    /// `(roll, pitch, yaw)` (rad).
    pub fn euler(&self) -> Vector3<f64> {
        self.dynamics.euler()
    }

    pub fn quaternion(&self) -> UnitQuaternion<f64> {
        self.dynamics.quaternion()
    }

    pub fn body_velocity(&self) -> Vector3<f64> {
        self.dynamics.body_velocity()
    }

    pub fn ground_velocity(&self) -> Vector3<f64> {
        self.dynamics.ground_velocity()
    }

    pub fn angular_velocity(&self) -> Vector3<f64> {
        self.dynamics.angular_velocity()
    }

    /// Body frame acceleration of the last tick (m/s^2).
    pub fn acceleration(&self) -> Vector3<f64> {
        self.dynamics.acceleration()
    }

    pub fn rotors(&self) -> &[Rotor] {
        &self.rotors
    }

    pub fn rotor_states(&self) -> Vec<RotorState> {
        self.rotors.iter().map(|rotor| *rotor.state()).collect()
    }

    /// Thrust (N) of each rotor at sea level pressure.
    pub fn rotor_thrusts(&self) -> Vec<f64> {
        self.rotors.iter().map(|rotor| rotor.thrust(1.)).collect()
    }

    /// Wrench of the rotors in the last tick.
    pub fn wrench(&self) -> Wrench {
        self.aggregator.wrench()
    }

    /// Duties applied on the next tick.
    pub fn duty(&self) -> &[f64] {
        &self.duty
    }

    /// Thrust and torque last asked of the mixer.
    pub fn demand(&self) -> Wrench {
        self.demand
    }

    /// Fixed timestep.
    pub fn time_step(&self) -> Microseconds<u64> {
        Microseconds(self.dt_usec)
    }

    /// Simulated time elapsed.
    pub fn time(&self) -> Microseconds<u64> {
        self.time
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.ticks as f64 * self.config.time_step
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
