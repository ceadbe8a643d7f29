use approx::{assert_abs_diff_eq, assert_relative_eq};
use copter_sim::{
    control::{ControlMode, DutyModel, Mixer},
    dynamics::{
        collision::{CollisionEvent, SimpleCollision},
        Disturbance, ManualPose, OutOfBoundsReset,
    },
    frame::Drag,
    rotor::{RotorConstants, RotorState},
    sensor::{SensorKind, SensorSample},
    thrust::{ThrustAggregator, Wrench},
    Aircraft, AircraftConfig, AircraftInput, Error, SimulationContext,
};
use nalgebra::Vector3;

fn drifting() -> AircraftConfig {
    AircraftConfig {
        initial_position: [0., 0., -10.],
        drag: Drag::default(),
        gravity: 0.,
        ground_contact: false,
        direct_rotor_control: true,
        noise_seed: Some(9),
        ..Default::default()
    }
}

fn tick(aircraft: &mut Aircraft, input: &AircraftInput) {
    aircraft.run(&SimulationContext::default(), input).unwrap();
}

#[test]
fn wall_collision_reflects_velocity_once() {
    let mut aircraft = Aircraft::new(drifting()).unwrap();
    aircraft
        .dynamics_mut()
        .set_ground_velocity(&Vector3::new(1., 0., 0.));

    aircraft.set_collision(CollisionEvent::Simple(SimpleCollision {
        contact_position: [0.1, 0., -10.],
        relative_velocity: [1., 0., 0.],
        restitution: 1.,
    }));
    tick(&mut aircraft, &AircraftInput::default());
    assert_relative_eq!(aircraft.ground_velocity(), Vector3::new(-1., 0., 0.), epsilon = 1e-12);

    // consumed, so the next tick keeps the reflected velocity
    tick(&mut aircraft, &AircraftInput::default());
    assert_relative_eq!(aircraft.ground_velocity(), Vector3::new(-1., 0., 0.), epsilon = 1e-12);
}

#[test]
fn inelastic_collision_stops_normal_motion() {
    let mut aircraft = Aircraft::new(drifting()).unwrap();
    aircraft
        .dynamics_mut()
        .set_ground_velocity(&Vector3::new(1., 1., 0.));

    aircraft.set_collision(CollisionEvent::Simple(SimpleCollision {
        contact_position: [0.2, 0.001, -10.],
        relative_velocity: [1., 1., 0.],
        restitution: 0.,
    }));
    tick(&mut aircraft, &AircraftInput::default());
    assert_relative_eq!(aircraft.ground_velocity(), Vector3::new(0., 1., 0.), epsilon = 1e-12);
}

#[test]
fn later_collision_replaces_pending_one() {
    let mut aircraft = Aircraft::new(drifting()).unwrap();
    aircraft
        .dynamics_mut()
        .set_ground_velocity(&Vector3::new(1., 0., 0.));

    let bounce = |restitution| {
        CollisionEvent::Simple(SimpleCollision {
            contact_position: [0.1, 0., -10.],
            relative_velocity: [1., 0., 0.],
            restitution,
        })
    };
    aircraft.set_collision(bounce(1.));
    aircraft.set_collision(bounce(0.5));
    tick(&mut aircraft, &AircraftInput::default());
    assert_relative_eq!(aircraft.ground_velocity(), Vector3::new(-0.5, 0., 0.), epsilon = 1e-12);
}

#[test]
fn diverging_state_resets_flagged_axes() {
    let config = AircraftConfig {
        out_of_bounds_reset: Some(OutOfBoundsReset {
            position: [true, false, false],
            velocity: [true, false, false],
            position_limit: 1.,
            ..Default::default()
        }),
        ..drifting()
    };
    let mut aircraft = Aircraft::new(config).unwrap();
    aircraft.dynamics_mut().set_position(Vector3::new(5., 3., -10.));
    aircraft
        .dynamics_mut()
        .set_ground_velocity(&Vector3::new(2., 2., 0.));

    tick(&mut aircraft, &AircraftInput::default());

    let position = aircraft.position();
    assert_eq!(position.x, 0.);
    assert_relative_eq!(position.y, 3. + 2. * 0.001, epsilon = 1e-12);
    assert_abs_diff_eq!(aircraft.ground_velocity().x, 0., epsilon = 1e-12);
    assert_abs_diff_eq!(aircraft.ground_velocity().y, 2., epsilon = 1e-12);
}

#[test]
fn manual_pose_overrides_integration() {
    let config = AircraftConfig {
        manual_control: true,
        ..drifting()
    };
    let mut aircraft = Aircraft::new(config).unwrap();
    let input = AircraftInput {
        manual: Some(ManualPose {
            position: Vector3::new(1., 2., -3.),
            euler: Vector3::new(0., 0., 0.5),
        }),
        ..Default::default()
    };
    tick(&mut aircraft, &input);
    assert_eq!(aircraft.position(), Vector3::new(1., 2., -3.));
    assert_relative_eq!(aircraft.euler().z, 0.5, epsilon = 1e-12);
}

#[test]
fn wind_pushes_a_drifting_body() {
    let config = AircraftConfig {
        drag: Drag {
            linear: 0.5,
            quadratic: 0.,
        },
        enable_disturbance: true,
        ..drifting()
    };
    let mut aircraft = Aircraft::new(config).unwrap();
    let input = AircraftInput {
        disturbance: Some(Disturbance {
            wind: Vector3::new(0., 3., 0.),
            ..Default::default()
        }),
        ..Default::default()
    };
    for _ in 0..100 {
        tick(&mut aircraft, &input);
    }
    assert!(aircraft.ground_velocity().y > 0.);

    // disabled by the context flags
    let mut calm = Aircraft::new(AircraftConfig {
        drag: Drag {
            linear: 0.5,
            quadratic: 0.,
        },
        enable_disturbance: true,
        ..drifting()
    })
    .unwrap();
    let mut ctx = SimulationContext::default();
    ctx.flags.disturbance = false;
    for _ in 0..100 {
        calm.run(&ctx, &input).unwrap();
    }
    assert_eq!(calm.ground_velocity(), Vector3::zeros());
}

#[test]
fn reset_replays_a_fresh_aircraft() {
    let mut config = AircraftConfig {
        noise_seed: Some(21),
        ..Default::default()
    };
    config.sensors.accelerometer.noise_variance = 0.01;
    config.sensors.gps.noise_variance = 0.5;
    config.sensors.gps.sample_num = 4;

    let record = |aircraft: &mut Aircraft| {
        (0..200)
            .map(|_| {
                tick(aircraft, &AircraftInput::default());
                (
                    aircraft.position(),
                    aircraft.sensor(SensorKind::Accelerometer).unwrap(),
                    aircraft.sensor(SensorKind::Gps).unwrap(),
                )
            })
            .collect::<Vec<_>>()
    };

    let mut aircraft = Aircraft::new(config.clone()).unwrap();
    let first = record(&mut aircraft);
    aircraft.reset();
    assert!(matches!(aircraft.last_input(), Err(Error::NotYetRun)));
    assert_eq!(aircraft.ticks(), 0);
    let replay = record(&mut aircraft);
    assert_eq!(first, replay);

    let mut fresh = Aircraft::new(config).unwrap();
    assert_eq!(first, record(&mut fresh));
}

#[test]
fn mixer_output_reproduces_demand() {
    let config = AircraftConfig::default();
    let constants: RotorConstants = config.rotor;
    let rad_per_sec_max = config.rad_per_sec_max();
    let mixer = Mixer::new(&config.rotors, &constants, DutyModel::Lag { rad_per_sec_max }).unwrap();
    let mut aggregator = ThrustAggregator::new(config.rotors.clone(), constants);

    for demand in [
        Wrench::new(9.81, Vector3::zeros()),
        Wrench::new(12., Vector3::new(0.1, 0., 0.)),
        Wrench::new(8., Vector3::new(-0.05, 0.08, 0.01)),
    ] {
        let output = mixer.output(&demand);
        let states: Vec<RotorState> = output
            .duty
            .iter()
            .map(|&duty| RotorState {
                omega: duty * rad_per_sec_max,
                duty,
                ..Default::default()
            })
            .collect();

        let wrench = aggregator.run(&states, 1.);
        assert_relative_eq!(wrench.thrust, demand.thrust, epsilon = 1e-9);
        assert_relative_eq!(wrench.torque, demand.torque, epsilon = 1e-9);
    }
}

#[test]
fn configuration_from_json() {
    let json = r#"{
        "mass": 1.2,
        "rotor_count": 4,
        "battery": { "nominal_voltage": 14.8 },
        "control_mode": { "mode": "radio_control", "angle_direct": true },
        "attitude": "quaternion",
        "integration": "semi_implicit_euler",
        "sensors": { "barometer": { "sample_num": 5, "noise_variance": 0.01 } },
        "noise_seed": 3
    }"#;
    let config: AircraftConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.sensors.barometer.sample_num, 5);
    assert_eq!(config.sensors.gyroscope.sample_num, 1);

    let mut aircraft = Aircraft::new(config).unwrap();
    assert_eq!(
        aircraft.control().mode(),
        ControlMode::RadioControl { angle_direct: true }
    );
    assert!(aircraft.rotors().iter().all(|rotor| rotor.has_battery_dynamics()));

    tick(&mut aircraft, &AircraftInput::default());
    assert!(matches!(
        aircraft.sensor(SensorKind::Barometer),
        Ok(SensorSample::Barometer(_))
    ));
}

#[test]
fn invalid_configuration_is_fatal() {
    let config: AircraftConfig = serde_json::from_str(r#"{ "mass": -1.0 }"#).unwrap();
    assert!(matches!(Aircraft::new(config), Err(Error::NonPositiveMass(_))));
}
