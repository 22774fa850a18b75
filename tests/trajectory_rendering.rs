//! End-to-end trajectory rendering scenarios.

use core::f64::consts::FRAC_PI_2;

use tramline::trajectory::{render_trip, SpeedSegment, TrackSegment, TramState};

fn long_track() -> Vec<TrackSegment> {
    vec![
        TrackSegment::straight(100.0).unwrap(),
        TrackSegment::straight(900.0).unwrap(),
    ]
}

#[test]
fn full_drive_cycle_hits_the_expected_phases() {
    let trip = vec![
        SpeedSegment::stop(1.0).unwrap(),
        SpeedSegment::accelerate(10.0, 1.0).unwrap(),
        SpeedSegment::constant_speed(10.0, 100.0).unwrap(),
        SpeedSegment::accelerate(0.0, 1.0).unwrap(),
        SpeedSegment::stop(10.0).unwrap(),
    ];
    let trajectory = render_trip(&long_track(), &trip, 0.1, 1, TramState::default()).unwrap();

    let accel_phase = &trajectory[50];
    assert!((accel_phase.accel - 1.0).abs() < 1e-9);
    assert!(accel_phase.speed > 0.0 && accel_phase.speed < 10.0);

    let cruise_phase = &trajectory[150];
    assert!(cruise_phase.accel.abs() < 1e-9);
    assert!((cruise_phase.speed - 10.0).abs() < 1e-9);

    let decel_phase = &trajectory[250];
    assert!((decel_phase.accel + 1.0).abs() < 1e-9);
    assert!(decel_phase.speed > 0.0 && decel_phase.speed < 10.0);

    // The cycle is symmetric: accelerate over 50 m, cruise 100 m, brake
    // over 50 m, then stand still. Segment boundaries may land one
    // sample later depending on rounding, hence the loose tolerances.
    let last = trajectory.last().unwrap();
    assert!((last.distance - 200.0).abs() < 2.0);
    assert!(last.speed.abs() < 1e-9);
    assert!((last.time - 41.0).abs() < 0.5);
}

#[test]
fn smooth_acceleration_keeps_jerk_bounded() {
    let trip = vec![
        SpeedSegment::smoothly_accelerate(10.0, 1.0, 0.5).unwrap(),
        SpeedSegment::constant_speed(10.0, 50.0).unwrap(),
    ];
    let trajectory = render_trip(&long_track(), &trip, 0.1, 1, TramState::default()).unwrap();

    for state in &trajectory {
        assert!(state.jerk.abs() <= 0.5 + 1e-12);
        assert!(state.accel.abs() <= 1.0 + 1e-9);
        assert!(state.speed <= 10.0 + 1e-9);
    }

    // The jerk-limited ramp reaches the target speed (2 s ramps around an
    // 8 s cruise) and then coasts.
    let cruising = trajectory.iter().find(|s| s.time > 12.5).unwrap();
    assert!((cruising.speed - 10.0).abs() < 1e-9);
    assert!(cruising.accel.abs() < 1e-9);
}

#[test]
fn quarter_turn_rotates_the_heading() {
    let tracks = vec![
        TrackSegment::straight(5.0).unwrap(),
        TrackSegment::turn(FRAC_PI_2, 10.0, 1.0).unwrap(),
        TrackSegment::straight(100.0).unwrap(),
    ];
    let trip = vec![SpeedSegment::constant_speed(2.0, 60.0).unwrap()];
    let trajectory = render_trip(&tracks, &trip, 0.05, 2, TramState::default()).unwrap();

    let last = trajectory.last().unwrap();
    assert!((last.heading - FRAC_PI_2).abs() < 1e-3);

    // Entering along +x, leaving along +y.
    let before_turn = trajectory.iter().find(|s| s.distance > 2.0).unwrap();
    assert!(before_turn.heading.abs() < 1e-9);
    assert!(before_turn.y.abs() < 1e-6);
    assert!(last.y > 10.0);
}

#[test]
fn opposite_turns_cancel() {
    let tracks = vec![
        TrackSegment::turn(FRAC_PI_2, 20.0, 2.0).unwrap(),
        TrackSegment::turn(-FRAC_PI_2, 20.0, 2.0).unwrap(),
        TrackSegment::straight(50.0).unwrap(),
    ];
    let trip = vec![SpeedSegment::constant_speed(5.0, 120.0).unwrap()];
    let trajectory = render_trip(&tracks, &trip, 0.1, 1, TramState::default()).unwrap();

    let last = trajectory.last().unwrap();
    assert!(last.heading.abs() < 1e-3);
}

#[test]
fn renderer_initial_state_offsets_the_trajectory() {
    let initial = TramState { x: 100.0, y: -50.0, heading: FRAC_PI_2, ..Default::default() };
    let tracks = vec![TrackSegment::straight(20.0).unwrap()];
    let trip = vec![SpeedSegment::constant_speed(1.0, 10.0).unwrap()];

    let trajectory = render_trip(&tracks, &trip, 0.1, 1, initial).unwrap();
    let last = trajectory.last().unwrap();

    // Straight track along the initial heading: only y advances.
    assert!((last.x - 100.0).abs() < 1e-9);
    assert!((last.y - (-50.0 + last.distance)).abs() < 1e-9);
}

#[test]
fn stop_only_trip_holds_position() {
    let trip = vec![SpeedSegment::stop(2.0).unwrap()];
    let trajectory = render_trip(&long_track(), &trip, 0.1, 1, TramState::default()).unwrap();

    assert_eq!(trajectory.len(), 20);
    for state in &trajectory {
        assert!(state.distance.abs() < 1e-12);
        assert!(state.speed.abs() < 1e-12);
    }
}
