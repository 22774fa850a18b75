//! Trajectory renderer
//!
//! Chains track-geometry and speed-profile segments over a shared
//! kinematic state and integrates the rigid-body ODE with RK4. The two
//! chainers resolve segment transitions strictly between micro-steps,
//! never inside a single RK4 evaluation, so every stage evaluation sees a
//! consistent set of overwritten channels.
//!
//! The sampled segment values are written into the state *before* each
//! micro-step, the time channel is pinned to `(k−1)·dt/subsamples` to
//! avoid accumulated floating-point drift, and every `subsamples`-th
//! state is appended to the output. Exhausting either segment chain
//! terminates rendering normally.

use nalgebra::DVector;

use crate::models::{discretize, IntegrationMethod, StateEquation};
use crate::{Result, TramlineError};

use super::speed::{ActiveSpeedSegment, SpeedSegment, TrajectoryDrive};
use super::state::{TramKinematics, TramState};
use super::track::{ActiveTrackSegment, TrackCurvature, TrackSegment};

// ============================================================================
// Segment chainers
// ============================================================================

/// Ordered track descriptors with the currently active realization.
struct TrackChain {
    segments: Vec<TrackSegment>,
    index: usize,
    active: Option<ActiveTrackSegment>,
}

impl TrackChain {
    fn new(segments: Vec<TrackSegment>) -> Self {
        Self { segments, index: 0, active: None }
    }

    /// Samples the chain at `position`, activating successor segments as
    /// needed. `None` means the chain is exhausted.
    fn sample(&mut self, position: f64) -> Option<TrackCurvature> {
        loop {
            let segment = self.segments.get(self.index)?;
            let active = self.active.get_or_insert_with(|| segment.activate(position));
            match active.curvature(position) {
                Some(sample) => return Some(sample),
                None => {
                    self.index += 1;
                    self.active = None;
                }
            }
        }
    }
}

/// Ordered speed descriptors with the currently active realization.
struct SpeedChain {
    segments: Vec<SpeedSegment>,
    index: usize,
    active: Option<ActiveSpeedSegment>,
}

impl SpeedChain {
    fn new(segments: Vec<SpeedSegment>) -> Self {
        Self { segments, index: 0, active: None }
    }

    fn sample(&mut self, time: f64, position: f64, speed: f64, accel: f64) -> Option<TrajectoryDrive> {
        loop {
            let segment = self.segments.get(self.index)?;
            let active = self
                .active
                .get_or_insert_with(|| segment.activate(time, position, speed, accel));
            match active.drive(time, position, speed, accel) {
                Some(sample) => return Some(sample),
                None => {
                    self.index += 1;
                    self.active = None;
                }
            }
        }
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// Renders the ground-truth trajectory of a trip over a track.
///
/// `dt` is the output sampling period and `subsamples` the number of RK4
/// micro-steps per output sample. Rendering starts from `initial` and
/// ends normally when either segment list is exhausted; the trajectory
/// collected so far is returned. The initial state itself is not part of
/// the output: the first sample lies `dt` after it.
///
/// Empty descriptor lists, a nonpositive or non-finite `dt`, and zero
/// `subsamples` are domain errors.
pub fn render_trip(
    tracks: &[TrackSegment],
    trip: &[SpeedSegment],
    dt: f64,
    subsamples: usize,
    initial: TramState,
) -> Result<Vec<TramState>> {
    if tracks.is_empty() {
        return Err(TramlineError::InvalidArgument("track descriptor list is empty"));
    }
    if trip.is_empty() {
        return Err(TramlineError::InvalidArgument("trip descriptor list is empty"));
    }
    if !dt.is_finite() || dt <= 0.0 {
        return Err(TramlineError::InvalidArgument("sampling period must be positive and finite"));
    }
    if subsamples == 0 {
        return Err(TramlineError::InvalidArgument("subsamples must be at least 1"));
    }

    let micro_step = dt / subsamples as f64;
    let model = discretize(TramKinematics, IntegrationMethod::Rk4, micro_step, 1)?;

    let mut track_chain = TrackChain::new(tracks.to_vec());
    let mut speed_chain = SpeedChain::new(trip.to_vec());

    let mut state = initial.to_vector();
    let input = DVector::zeros(0);
    let mut trajectory = Vec::new();

    let mut iteration: usize = 0;
    loop {
        iteration += 1;

        // Segment transitions happen here, between micro-steps.
        let Some(curvature) = track_chain.sample(state[TramState::DISTANCE]) else {
            break;
        };
        let Some(drive) = speed_chain.sample(
            state[TramState::TIME],
            state[TramState::DISTANCE],
            state[TramState::SPEED],
            state[TramState::ACCEL],
        ) else {
            break;
        };

        state[TramState::CURVATURE] = curvature.curvature;
        state[TramState::DCURVATURE] = curvature.dcurvature;
        state[TramState::SPEED] = drive.speed;
        state[TramState::ACCEL] = drive.accel;
        state[TramState::JERK] = drive.jerk;

        // Pin the clock so long trajectories do not drift.
        state[TramState::TIME] = (iteration - 1) as f64 * micro_step;

        state = model.eval(&state, &input);

        if iteration % subsamples == 0 {
            trajectory.push(TramState::from_vector(&state)?);
        }
    }

    Ok(trajectory)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_track() -> Vec<TrackSegment> {
        vec![
            TrackSegment::straight(100.0).unwrap(),
            TrackSegment::straight(900.0).unwrap(),
        ]
    }

    #[test]
    fn test_parameter_validation() {
        let tracks = simple_track();
        let trip = vec![SpeedSegment::stop(1.0).unwrap()];

        assert!(render_trip(&[], &trip, 0.1, 1, TramState::default()).is_err());
        assert!(render_trip(&tracks, &[], 0.1, 1, TramState::default()).is_err());
        assert!(render_trip(&tracks, &trip, 0.0, 1, TramState::default()).is_err());
        assert!(render_trip(&tracks, &trip, f64::NAN, 1, TramState::default()).is_err());
        assert!(render_trip(&tracks, &trip, 0.1, 0, TramState::default()).is_err());
    }

    #[test]
    fn test_stop_only_trip_stays_at_rest() {
        let trip = vec![SpeedSegment::stop(1.0).unwrap()];
        let trajectory = render_trip(&simple_track(), &trip, 0.1, 1, TramState::default()).unwrap();

        // One second of samples at 10 Hz.
        assert_eq!(trajectory.len(), 10);
        let last = trajectory.last().unwrap();
        assert!((last.time - 1.0).abs() < 1e-9);
        assert!(last.distance.abs() < 1e-12);
        assert!(last.speed.abs() < 1e-12);
    }

    #[test]
    fn test_drive_profile_phases() {
        // Stop, ramp to 10 m/s, hold for 100 m, ramp back down, stop.
        let trip = vec![
            SpeedSegment::stop(1.0).unwrap(),
            SpeedSegment::accelerate(10.0, 1.0).unwrap(),
            SpeedSegment::constant_speed(10.0, 100.0).unwrap(),
            SpeedSegment::accelerate(0.0, 1.0).unwrap(),
            SpeedSegment::stop(10.0).unwrap(),
        ];
        let trajectory = render_trip(&simple_track(), &trip, 0.1, 1, TramState::default()).unwrap();

        // Acceleration phase.
        let sample = &trajectory[50];
        assert!((sample.accel - 1.0).abs() < 1e-9);
        assert!(sample.speed > 0.0 && sample.speed < 10.0);

        // Cruise phase.
        let sample = &trajectory[150];
        assert!(sample.accel.abs() < 1e-9);
        assert!((sample.speed - 10.0).abs() < 1e-9);

        // Deceleration phase.
        let sample = &trajectory[250];
        assert!((sample.accel + 1.0).abs() < 1e-9);
        assert!(sample.speed > 0.0 && sample.speed < 10.0);
    }

    #[test]
    fn test_time_and_distance_are_monotone() {
        let trip = vec![
            SpeedSegment::accelerate(5.0, 1.0).unwrap(),
            SpeedSegment::constant_speed(5.0, 50.0).unwrap(),
        ];
        let trajectory = render_trip(&simple_track(), &trip, 0.05, 4, TramState::default()).unwrap();
        assert!(!trajectory.is_empty());

        for pair in trajectory.windows(2) {
            assert!(pair[1].time > pair[0].time);
            assert!(pair[1].distance >= pair[0].distance);
        }
    }

    #[test]
    fn test_track_exhaustion_terminates() {
        // 10 m of track at 1 m/s ends the trip after ~10 s even though
        // the speed profile could go on for 100 s.
        let tracks = vec![TrackSegment::straight(10.0).unwrap()];
        let trip = vec![SpeedSegment::constant_speed(1.0, 100.0).unwrap()];
        let trajectory = render_trip(&tracks, &trip, 0.1, 1, TramState::default()).unwrap();

        let last = trajectory.last().unwrap();
        assert!((last.distance - 10.0).abs() < 0.2);
    }

    #[test]
    fn test_turn_accumulates_heading() {
        use ::core::f64::consts::FRAC_PI_2;

        let tracks = vec![
            TrackSegment::straight(5.0).unwrap(),
            TrackSegment::turn(FRAC_PI_2, 10.0, 1.0).unwrap(),
            TrackSegment::straight(100.0).unwrap(),
        ];
        let trip = vec![SpeedSegment::constant_speed(1.0, 40.0).unwrap()];
        let trajectory = render_trip(&tracks, &trip, 0.1, 1, TramState::default()).unwrap();

        // The turn spans [5, 5 + π/2·10 + 1); past it the heading holds a
        // quarter turn.
        let last = trajectory.last().unwrap();
        assert!((last.distance - 40.0).abs() < 0.2);
        assert!((last.heading - FRAC_PI_2).abs() < 1e-3);
        assert!(last.curvature.abs() < 1e-12);
    }

    #[test]
    fn test_subsampling_refines_integration_only() {
        let trip = vec![
            SpeedSegment::accelerate(8.0, 2.0).unwrap(),
            SpeedSegment::constant_speed(8.0, 30.0).unwrap(),
        ];
        let coarse = render_trip(&simple_track(), &trip, 0.2, 1, TramState::default()).unwrap();
        let fine = render_trip(&simple_track(), &trip, 0.2, 8, TramState::default()).unwrap();

        // Same output cadence either way.
        assert!((coarse[0].time - 0.2).abs() < 1e-12);
        assert!((fine[0].time - 0.2).abs() < 1e-12);

        // Both integrate the same profile to closely matching distances.
        let n = coarse.len().min(fine.len());
        let c = &coarse[n - 1];
        let f = &fine[n - 1];
        assert!((c.distance - f.distance).abs() < 1e-3);
    }
}
