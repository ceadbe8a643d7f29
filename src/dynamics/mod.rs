//! Six degree of freedom rigid body dynamics.
//!
//! Velocity is integrated in the body frame and position in the ground frame (NED).

use crate::{
    frame::{acceleration_in_body_frame, angular_acceleration_in_body_frame, Drag},
    thrust::Wrench,
    Error, Result,
};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

mod attitude;
pub use attitude::{Attitude, AttitudeKind, EulerAttitude, QuaternionAttitude};

mod boundary;
pub use boundary::{Boundary, BoundaryDisturbance, BOUNDARY_RANGE_IN_ROTOR_RADII};

mod bounds;
pub use bounds::{KinematicState, OutOfBoundsReset};

pub mod collision;
use collision::{
    delta_angular_velocity_from_impulse, delta_velocity_from_impulse, impulse_by_collision,
    inverse_diagonal, velocity_after_contact_with_point, CollisionBody, CollisionEvent,
    ImpulseCollision, SimpleCollision,
};

/// How velocity feeds the position and attitude update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationScheme {
    /// Position and attitude advance with the velocities from the start of the tick.
    #[default]
    ExplicitEuler,

    /// Position and attitude advance with the velocities updated this tick.
    SemiImplicitEuler,
}

/// Physical properties of the airframe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyParams {
    /// Mass (kg).
    pub mass: f64,

    /// Diagonal moment of inertia (kg*m^2).
    pub inertia: Vector3<f64>,

    /// Gravity (m/s^2).
    pub gravity: f64,

    pub drag: Drag,

    /// Rotor radius (m), the length scale of the boundary disturbance.
    pub rotor_radius: f64,
}

impl BodyParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.mass > 0.) {
            return Err(Error::NonPositiveMass(self.mass));
        }
        for (axis, &value) in ['x', 'y', 'z'].into_iter().zip(self.inertia.iter()) {
            if !(value > 0.) {
                return Err(Error::NonPositiveInertia { axis, value });
            }
        }
        Ok(())
    }
}

/// Behavior switches fixed at construction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DynamicsOptions {
    pub manual_control: bool,
    pub collision_detection: bool,

    /// Keep the body from sinking below z = 0.
    pub ground_contact: bool,
    pub integration: IntegrationScheme,
    pub out_of_bounds_reset: Option<OutOfBoundsReset>,
    pub boundary_disturbance: Option<BoundaryDisturbance>,
}

/// Pose set directly by an operator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ManualPose {
    /// Ground frame (m).
    pub position: Vector3<f64>,

    /// `(roll, pitch, yaw)` (rad).
    pub euler: Vector3<f64>,
}

/// Environment sample for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Disturbance {
    /// Ground temperature (Celsius).
    pub temperature: f64,

    /// Wind in the ground frame (m/s).
    pub wind: Vector3<f64>,

    /// Sea level pressure (atm).
    pub sea_level_atm: f64,

    /// Surface reflecting the rotor downwash.
    pub boundary: Option<Boundary>,
}

impl Default for Disturbance {
    fn default() -> Self {
        Self {
            temperature: crate::atmosphere::STANDARD_TEMPERATURE_CELSIUS,
            wind: Vector3::zeros(),
            sea_level_atm: 1.,
            boundary: None,
        }
    }
}

/// Everything the dynamics consume in one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DynamicsInput {
    pub wrench: Wrench,
    pub manual: Option<ManualPose>,
    pub disturbance: Option<Disturbance>,
}

#[derive(Debug)]
pub struct RigidBodyDynamics {
    params: BodyParams,
    options: DynamicsOptions,
    dt: f64,

    position: Vector3<f64>,
    velocity: Vector3<f64>,
    angular_velocity: Vector3<f64>,
    acceleration: Vector3<f64>,
    attitude: Box<dyn Attitude>,

    initial: KinematicState,
    initial_euler: Vector3<f64>,

    collision: Option<CollisionEvent>,
}

impl RigidBodyDynamics {
    /// Create a body at rest at `position` with attitude `euler`.
    pub fn new(
        params: BodyParams,
        options: DynamicsOptions,
        attitude: AttitudeKind,
        position: Vector3<f64>,
        euler: Vector3<f64>,
        dt: f64,
    ) -> Result<Self> {
        params.validate()?;
        if !(dt > 0.) {
            return Err(Error::NonPositiveTimeStep(dt));
        }

        Ok(Self {
            params,
            options,
            dt,
            position,
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            acceleration: Vector3::zeros(),
            attitude: attitude.build(&euler),
            initial: KinematicState {
                position,
                ..Default::default()
            },
            initial_euler: euler,
            collision: None,
        })
    }

    /// Queue a collision for the next tick. A later call replaces an unconsumed event.
    pub fn set_collision(&mut self, event: CollisionEvent) {
        if self.collision.replace(event).is_some() {
            log::debug!("Pending collision replaced before it was applied");
        }
    }

    pub fn pending_collision(&self) -> Option<&CollisionEvent> {
        self.collision.as_ref()
    }

    /// Advance the body one timestep.
    pub fn run(&mut self, input: &DynamicsInput) {
        let collision = self.collision.take();

        if self.options.manual_control {
            if let Some(pose) = &input.manual {
                self.position = pose.position;
                self.attitude.set_euler(&pose.euler);
                return;
            }
        }

        self.integrate(input);

        if self.options.ground_contact {
            self.hold_above_ground();
        }

        if let Some(event) = collision {
            if self.options.collision_detection {
                self.collide(&event);
            }
        }

        if let Some(policy) = self.options.out_of_bounds_reset {
            let mut state = self.kinematic_state();
            if policy.apply(&mut state, &self.initial) {
                log::debug!("Out of bounds, reset to {:?}", state);
                self.set_kinematic_state(&state);
            }
        }
    }

    fn integrate(&mut self, input: &DynamicsInput) {
        let dt = self.dt;
        let euler = self.attitude.euler();
        let disturbance = input.disturbance.unwrap_or_default();

        let external_force = self.boundary_force(&disturbance, input.wrench.thrust);
        self.acceleration = acceleration_in_body_frame(
            &self.velocity,
            &euler,
            &self.angular_velocity,
            input.wrench.thrust,
            self.params.mass,
            self.params.gravity,
            &disturbance.wind,
            &self.params.drag,
            &external_force,
        );
        let angular_acceleration = angular_acceleration_in_body_frame(
            &self.angular_velocity,
            &input.wrench.torque,
            &self.params.inertia,
        );

        let velocity = self.velocity + self.acceleration * dt;
        let angular_velocity = self.angular_velocity + angular_acceleration * dt;

        let (translate, rotate) = match self.options.integration {
            IntegrationScheme::ExplicitEuler => (self.velocity, self.angular_velocity),
            IntegrationScheme::SemiImplicitEuler => (velocity, angular_velocity),
        };
        self.position += self.attitude.rotation() * translate * dt;
        self.attitude.integrate(&rotate, dt);

        self.velocity = velocity;
        self.angular_velocity = angular_velocity;
    }

    fn boundary_force(&self, disturbance: &Disturbance, thrust: f64) -> Vector3<f64> {
        match (&self.options.boundary_disturbance, &disturbance.boundary) {
            (Some(params), Some(boundary)) => {
                let downwash = self.attitude.rotation() * Vector3::z();
                params.force(
                    boundary,
                    &self.position,
                    &downwash,
                    thrust,
                    self.params.rotor_radius,
                )
            }
            _ => Vector3::zeros(),
        }
    }

    fn hold_above_ground(&mut self) {
        if self.position.z < 0. {
            return;
        }

        let mut velocity = self.ground_velocity();
        if self.position.z == 0. && velocity.z <= 0. {
            return;
        }

        self.position.z = 0.;
        velocity.z = velocity.z.min(0.);
        self.set_ground_velocity(&velocity);
        self.angular_velocity = Vector3::zeros();
    }

    fn collide(&mut self, event: &CollisionEvent) {
        match event {
            CollisionEvent::Simple(collision) => self.collide_simple(collision),
            CollisionEvent::Impulse(collision) => self.collide_impulse(collision),
        }
    }

    fn collide_simple(&mut self, collision: &SimpleCollision) {
        let relative_velocity = Vector3::from(collision.relative_velocity);
        let Some(reflected) = velocity_after_contact_with_point(
            &relative_velocity,
            &self.position,
            &Vector3::from(collision.contact_position),
            collision.restitution,
        ) else {
            log::warn!("Ignoring collision with a contact point at the body center");
            return;
        };

        let velocity = self.ground_velocity() + (reflected - relative_velocity);
        log::debug!("Collision changed velocity to {:?}", velocity);
        self.set_ground_velocity(&velocity);
    }

    fn collide_impulse(&mut self, collision: &ImpulseCollision) {
        let inverse_inertia = inverse_diagonal(&self.params.inertia);
        let body = CollisionBody {
            velocity: self.velocity,
            angular_velocity: self.angular_velocity,
            contact_vector: Vector3::from(collision.self_contact_vector),
            mass: self.params.mass,
            inverse_inertia,
        };
        let target = collision.target_body(&self.attitude.euler());

        let Some(impulse) = impulse_by_collision(
            &body,
            target.as_ref(),
            &Vector3::from(collision.normal),
            collision.restitution,
        ) else {
            log::warn!("Ignoring impulse collision with a zero-length normal");
            return;
        };

        self.velocity += delta_velocity_from_impulse(&impulse, self.params.mass);
        self.angular_velocity +=
            delta_angular_velocity_from_impulse(&impulse, &body.contact_vector, &inverse_inertia);
        log::debug!("Impulse collision {:?} applied", impulse);
    }

    /// Restore the flagged axes of the out-of-bounds policy regardless of divergence.
    pub fn force_out_of_bounds_reset(&mut self) {
        if let Some(policy) = self.options.out_of_bounds_reset {
            let mut state = self.kinematic_state();
            policy.reset(&mut state, &self.initial);
            self.set_kinematic_state(&state);
        }
    }

    pub fn kinematic_state(&self) -> KinematicState {
        KinematicState {
            position: self.position,
            velocity: self.ground_velocity(),
            angular_velocity: self.angular_velocity,
        }
    }

    fn set_kinematic_state(&mut self, state: &KinematicState) {
        self.position = state.position;
        self.set_ground_velocity(&state.velocity);
        self.angular_velocity = state.angular_velocity;
    }

    /// Restore the initial pose and bring the body to rest.
    pub fn reset(&mut self) {
        self.position = self.initial.position;
        self.velocity = Vector3::zeros();
        self.angular_velocity = Vector3::zeros();
        self.acceleration = Vector3::zeros();
        self.attitude.set_euler(&self.initial_euler);
        self.collision = None;
    }

    pub fn position(&self) -> Vector3<f64> {
        self.position
    }

    pub fn set_position(&mut self, position: Vector3<f64>) {
        self.position = position;
    }

    pub fn euler(&self) -> Vector3<f64> {
        self.attitude.euler()
    }

    pub fn set_euler(&mut self, euler: Vector3<f64>) {
        self.attitude.set_euler(&euler);
    }

    pub fn quaternion(&self) -> UnitQuaternion<f64> {
        self.attitude.quaternion()
    }

    pub fn attitude_kind(&self) -> AttitudeKind {
        self.attitude.kind()
    }

    /// Velocity in the body frame (m/s).
    pub fn body_velocity(&self) -> Vector3<f64> {
        self.velocity
    }

    /// Velocity in the ground frame (m/s).
    pub fn ground_velocity(&self) -> Vector3<f64> {
        self.attitude.rotation() * self.velocity
    }

    pub fn set_ground_velocity(&mut self, velocity: &Vector3<f64>) {
        self.velocity = self.attitude.rotation().transpose() * velocity;
    }

    /// Body angular velocity (rad/s).
    pub fn angular_velocity(&self) -> Vector3<f64> {
        self.angular_velocity
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: Vector3<f64>) {
        self.angular_velocity = angular_velocity;
    }

    /// Body frame acceleration of the last tick (m/s^2).
    pub fn acceleration(&self) -> Vector3<f64> {
        self.acceleration
    }

    pub fn params(&self) -> &BodyParams {
        &self.params
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f64 = 0.001;

    fn params() -> BodyParams {
        BodyParams {
            mass: 1.,
            inertia: Vector3::new(0.01, 0.01, 0.02),
            gravity: crate::GRAVITY,
            drag: Drag::default(),
            rotor_radius: 0.1,
        }
    }

    fn body(options: DynamicsOptions) -> RigidBodyDynamics {
        RigidBodyDynamics::new(
            params(),
            options,
            AttitudeKind::Euler,
            Vector3::new(0., 0., -10.),
            Vector3::zeros(),
            DT,
        )
        .unwrap()
    }

    fn hover() -> DynamicsInput {
        DynamicsInput {
            wrench: Wrench::new(crate::GRAVITY, Vector3::zeros()),
            ..Default::default()
        }
    }

    fn build(params: BodyParams, dt: f64) -> Result<RigidBodyDynamics> {
        RigidBodyDynamics::new(
            params,
            Default::default(),
            AttitudeKind::Euler,
            Vector3::zeros(),
            Vector3::zeros(),
            dt,
        )
    }

    #[test]
    fn rejects_invalid_params() {
        let mut bad = params();
        bad.mass = 0.;
        assert!(matches!(build(bad, DT), Err(Error::NonPositiveMass(_))));

        let mut bad = params();
        bad.inertia.y = -1.;
        assert!(matches!(
            build(bad, DT),
            Err(Error::NonPositiveInertia { axis: 'y', .. })
        ));

        assert!(matches!(
            build(params(), 0.),
            Err(Error::NonPositiveTimeStep(_))
        ));
    }

    #[test]
    fn hover_thrust_holds_position() {
        let mut body = body(Default::default());
        for _ in 0..1000 {
            body.run(&hover());
        }
        assert_relative_eq!(body.position(), Vector3::new(0., 0., -10.), epsilon = 1e-9);
        assert_relative_eq!(body.acceleration(), Vector3::zeros(), epsilon = 1e-9);
    }

    #[test]
    fn free_fall_follows_scheme() {
        let mut explicit = body(Default::default());
        let mut semi = body(DynamicsOptions {
            integration: IntegrationScheme::SemiImplicitEuler,
            ..Default::default()
        });

        let n = 100;
        for _ in 0..n {
            explicit.run(&DynamicsInput::default());
            semi.run(&DynamicsInput::default());
        }

        let g = crate::GRAVITY;
        let n = n as f64;
        assert_relative_eq!(explicit.ground_velocity().z, g * n * DT, epsilon = 1e-9);
        // sum of k*g*dt^2 for k in 0..n and 1..=n
        let fallen = g * DT * DT * n / 2.;
        assert_relative_eq!(explicit.position().z, -10. + fallen * (n - 1.), epsilon = 1e-9);
        assert_relative_eq!(semi.position().z, -10. + fallen * (n + 1.), epsilon = 1e-9);
    }

    #[test]
    fn ground_stops_the_fall() {
        let mut body = body(DynamicsOptions {
            ground_contact: true,
            ..Default::default()
        });
        for _ in 0..5000 {
            body.run(&DynamicsInput::default());
        }
        assert_eq!(body.position().z, 0.);
        assert!(body.ground_velocity().z <= 0.);
    }

    #[test]
    fn torque_spins_up_body() {
        let mut body = body(Default::default());
        let input = DynamicsInput {
            wrench: Wrench::new(crate::GRAVITY, Vector3::new(0., 0., 0.02)),
            ..Default::default()
        };
        for _ in 0..1000 {
            body.run(&input);
        }
        // 0.02 N*m on 0.02 kg*m^2 for one second
        assert_relative_eq!(body.angular_velocity().z, 1., epsilon = 1e-9);
        assert!(body.euler().z > 0.49 && body.euler().z < 0.51);
    }

    #[test]
    fn manual_pose_overrides_integration() {
        let mut body = body(DynamicsOptions {
            manual_control: true,
            ..Default::default()
        });
        let pose = ManualPose {
            position: Vector3::new(1., 2., -3.),
            euler: Vector3::new(0., 0., 0.5),
        };
        let input = DynamicsInput {
            manual: Some(pose),
            ..Default::default()
        };
        body.run(&input);
        body.run(&input);
        assert_eq!(body.position(), pose.position);
        assert_relative_eq!(body.euler(), pose.euler);
    }

    #[test]
    fn manual_pose_ignored_when_disabled() {
        let mut body = body(Default::default());
        let input = DynamicsInput {
            manual: Some(ManualPose {
                position: Vector3::new(1., 2., -3.),
                euler: Vector3::zeros(),
            }),
            ..Default::default()
        };
        body.run(&input);
        assert_relative_eq!(body.position(), Vector3::new(0., 0., -10.));
    }

    #[test]
    fn collision_is_consumed_once() {
        let mut body = body(DynamicsOptions {
            collision_detection: true,
            ..Default::default()
        });
        body.set_ground_velocity(&Vector3::new(2., 0., 0.));
        body.set_collision(CollisionEvent::Simple(SimpleCollision {
            contact_position: [1., 0., -10.],
            relative_velocity: [2., 0., 0.],
            restitution: 1.,
        }));

        body.run(&hover());
        assert!(body.pending_collision().is_none());
        assert_relative_eq!(body.ground_velocity(), Vector3::new(-2., 0., 0.), epsilon = 1e-9);

        body.run(&hover());
        assert_relative_eq!(body.ground_velocity(), Vector3::new(-2., 0., 0.), epsilon = 1e-9);
    }

    #[test]
    fn last_collision_wins() {
        let mut body = body(DynamicsOptions {
            collision_detection: true,
            ..Default::default()
        });
        body.set_ground_velocity(&Vector3::new(2., 0., 0.));

        let elastic = SimpleCollision {
            contact_position: [1., 0., -10.],
            relative_velocity: [2., 0., 0.],
            restitution: 1.,
        };
        body.set_collision(CollisionEvent::Simple(elastic));
        body.set_collision(CollisionEvent::Simple(SimpleCollision {
            restitution: 0.,
            ..elastic
        }));

        body.run(&hover());
        assert_relative_eq!(body.ground_velocity(), Vector3::zeros(), epsilon = 1e-9);
    }

    #[test]
    fn collisions_ignored_without_detection() {
        let mut body = body(Default::default());
        body.set_ground_velocity(&Vector3::new(2., 0., 0.));
        body.set_collision(CollisionEvent::Simple(SimpleCollision {
            contact_position: [1., 0., -10.],
            relative_velocity: [2., 0., 0.],
            restitution: 1.,
        }));
        body.run(&hover());
        assert_relative_eq!(body.ground_velocity(), Vector3::new(2., 0., 0.), epsilon = 1e-9);
        assert!(body.pending_collision().is_none());
    }

    #[test]
    fn impulse_collision_changes_velocity_by_impulse_over_mass() {
        let mut body = body(DynamicsOptions {
            collision_detection: true,
            ..Default::default()
        });
        body.set_ground_velocity(&Vector3::new(1., 0., 0.));
        body.set_collision(CollisionEvent::Impulse(ImpulseCollision {
            is_target_static: false,
            restitution: 1.,
            self_contact_vector: [0.; 3],
            normal: [-1., 0., 0.],
            target_contact_vector: [0.; 3],
            target_velocity: [0.; 3],
            target_angular_velocity: [0.; 3],
            target_euler: [0.; 3],
            target_inertia: [0.01, 0.01, 0.02],
            target_mass: 1.,
        }));
        body.run(&hover());
        assert_relative_eq!(body.ground_velocity(), Vector3::zeros(), epsilon = 1e-9);
    }

    #[test]
    fn diverged_state_resets_flagged_axes() {
        let mut body = body(DynamicsOptions {
            out_of_bounds_reset: Some(OutOfBoundsReset {
                position: [true, false, false],
                position_limit: 5.,
                ..Default::default()
            }),
            ..Default::default()
        });
        body.set_position(Vector3::new(6., 1., -10.));
        body.run(&hover());
        assert_relative_eq!(body.position(), Vector3::new(0., 1., -10.), epsilon = 1e-9);
    }

    #[test]
    fn forced_reset_leaves_unflagged_axes() {
        let mut body = body(DynamicsOptions {
            out_of_bounds_reset: Some(OutOfBoundsReset {
                velocity: [false, true, false],
                ..Default::default()
            }),
            ..Default::default()
        });
        body.set_position(Vector3::new(3., 4., -5.));
        body.set_ground_velocity(&Vector3::new(1., 2., 3.));

        body.force_out_of_bounds_reset();
        assert_relative_eq!(body.ground_velocity(), Vector3::new(1., 0., 3.), epsilon = 1e-12);
        assert_eq!(body.position(), Vector3::new(3., 4., -5.));
    }

    #[test]
    fn boundary_lifts_body_near_ground() {
        let mut body = RigidBodyDynamics::new(
            params(),
            DynamicsOptions {
                boundary_disturbance: Some(BoundaryDisturbance::default()),
                ..Default::default()
            },
            AttitudeKind::Euler,
            Vector3::new(0., 0., -0.2),
            Vector3::zeros(),
            DT,
        )
        .unwrap();

        let input = DynamicsInput {
            disturbance: Some(Disturbance {
                boundary: Some(Boundary {
                    point: [0.; 3],
                    normal: [0., 0., 1.],
                }),
                ..Default::default()
            }),
            ..hover()
        };
        body.run(&input);
        assert!(body.acceleration().z < 0.);
    }

    #[test]
    fn wind_drags_body_along() {
        let mut p = params();
        p.drag = Drag {
            linear: 0.5,
            quadratic: 0.,
        };
        let mut body = RigidBodyDynamics::new(
            p,
            Default::default(),
            AttitudeKind::Quaternion,
            Vector3::new(0., 0., -10.),
            Vector3::zeros(),
            DT,
        )
        .unwrap();

        let input = DynamicsInput {
            disturbance: Some(Disturbance {
                wind: Vector3::new(0., 3., 0.),
                ..Default::default()
            }),
            ..hover()
        };
        body.run(&input);
        assert_relative_eq!(body.acceleration().y, 1.5, epsilon = 1e-9);
    }

    #[test]
    fn reset_restores_initial_pose() {
        let mut body = body(Default::default());
        let input = DynamicsInput {
            wrench: Wrench::new(0., Vector3::new(0.01, 0., 0.)),
            ..Default::default()
        };
        for _ in 0..100 {
            body.run(&input);
        }
        body.reset();
        assert_eq!(body.position(), Vector3::new(0., 0., -10.));
        assert_eq!(body.body_velocity(), Vector3::zeros());
        assert_eq!(body.angular_velocity(), Vector3::zeros());
        assert_eq!(body.euler(), Vector3::zeros());
    }
}
