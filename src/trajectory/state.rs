//! The tram rigid-body state and its kinematic ODE.

use nalgebra::DVector;

use crate::models::{Continuous, ModelScalar, StateEquation};
use crate::{Result, TramlineError};

// ============================================================================
// Tram state
// ============================================================================

/// Snapshot of the tram rigid-body state.
///
/// Time is monotonically nondecreasing along a trajectory; distance is
/// monotonically nondecreasing while the speed stays nonnegative; the
/// heading is unwrapped (not reduced modulo 2π).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TramState {
    /// Elapsed time along the trajectory
    pub time: f64,
    /// Arc length traveled along the track
    pub distance: f64,
    /// Planar position, east component
    pub x: f64,
    /// Planar position, north component
    pub y: f64,
    /// Longitudinal speed
    pub speed: f64,
    /// Longitudinal acceleration
    pub accel: f64,
    /// Longitudinal jerk
    pub jerk: f64,
    /// Heading angle (unwrapped)
    pub heading: f64,
    /// Track curvature at the current position
    pub curvature: f64,
    /// Curvature slope with respect to arc length
    pub dcurvature: f64,
}

impl TramState {
    /// Dimension of the flattened state vector.
    pub const DIM: usize = 10;

    /// Channel indices in the flattened state vector.
    pub const TIME: usize = 0;
    pub const DISTANCE: usize = 1;
    pub const POS_X: usize = 2;
    pub const POS_Y: usize = 3;
    pub const SPEED: usize = 4;
    pub const ACCEL: usize = 5;
    pub const JERK: usize = 6;
    pub const HEADING: usize = 7;
    pub const CURVATURE: usize = 8;
    pub const DCURVATURE: usize = 9;

    /// Flattens the state into a vector with the channel layout above.
    pub fn to_vector(&self) -> DVector<f64> {
        DVector::from_vec(vec![
            self.time,
            self.distance,
            self.x,
            self.y,
            self.speed,
            self.accel,
            self.jerk,
            self.heading,
            self.curvature,
            self.dcurvature,
        ])
    }

    /// Rebuilds a state from a flattened vector.
    pub fn from_vector(v: &DVector<f64>) -> Result<Self> {
        if v.len() != Self::DIM {
            return Err(TramlineError::DimensionMismatch { expected: Self::DIM, found: v.len() });
        }
        Ok(Self {
            time: v[Self::TIME],
            distance: v[Self::DISTANCE],
            x: v[Self::POS_X],
            y: v[Self::POS_Y],
            speed: v[Self::SPEED],
            accel: v[Self::ACCEL],
            jerk: v[Self::JERK],
            heading: v[Self::HEADING],
            curvature: v[Self::CURVATURE],
            dcurvature: v[Self::DCURVATURE],
        })
    }
}

// ============================================================================
// Kinematic ODE
// ============================================================================

/// Rigid-body kinematics of the tram.
///
/// With `v` the speed, `φ` the heading, `a` the acceleration, `j` the
/// jerk, `c` the curvature and `dc` its slope, the state derivative is
///
/// ```text
/// ẋ = [1, v, v·cos φ, v·sin φ, a, j, 0, v·c, v·dc, 0]
/// ```
///
/// Jerk and curvature slope have no dynamics of their own; the renderer
/// overwrites them from the segment streams between micro-steps.
#[derive(Debug, Clone, Copy, Default)]
pub struct TramKinematics;

impl StateEquation<Continuous> for TramKinematics {
    #[inline]
    fn n_states(&self) -> usize {
        TramState::DIM
    }

    #[inline]
    fn n_inputs(&self) -> usize {
        0
    }

    fn eval<T: ModelScalar>(&self, x: &DVector<T>, _u: &DVector<T>) -> DVector<T> {
        let speed = x[TramState::SPEED];
        let heading = x[TramState::HEADING];

        let mut dx = DVector::zeros(TramState::DIM);
        dx[TramState::TIME] = T::one();
        dx[TramState::DISTANCE] = speed;
        dx[TramState::POS_X] = speed * heading.cos();
        dx[TramState::POS_Y] = speed * heading.sin();
        dx[TramState::SPEED] = x[TramState::ACCEL];
        dx[TramState::ACCEL] = x[TramState::JERK];
        dx[TramState::HEADING] = speed * x[TramState::CURVATURE];
        dx[TramState::CURVATURE] = speed * x[TramState::DCURVATURE];
        dx
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{discretize, IntegrationMethod};
    use nalgebra::dvector;

    #[test]
    fn test_vector_round_trip() {
        let state = TramState {
            time: 1.0,
            distance: 2.0,
            x: 3.0,
            y: 4.0,
            speed: 5.0,
            accel: 6.0,
            jerk: 7.0,
            heading: 8.0,
            curvature: 9.0,
            dcurvature: 10.0,
        };
        let v = state.to_vector();
        assert_eq!(TramState::from_vector(&v).unwrap(), state);

        assert!(TramState::from_vector(&dvector![0.0]).is_err());
    }

    #[test]
    fn test_straight_line_motion() {
        // Constant speed, zero curvature: position advances along the
        // heading, distance equals speed times time.
        let state = TramState {
            speed: 2.0,
            heading: std::f64::consts::FRAC_PI_2,
            ..Default::default()
        };

        let model = discretize(TramKinematics, IntegrationMethod::Rk4, 0.5, 5).unwrap();
        let advanced = model.eval(&state.to_vector(), &dvector![]);
        let advanced = TramState::from_vector(&advanced).unwrap();

        assert!((advanced.time - 0.5).abs() < 1e-12);
        assert!((advanced.distance - 1.0).abs() < 1e-12);
        assert!(advanced.x.abs() < 1e-12);
        assert!((advanced.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_curvature_turns_heading() {
        // v·c integrates the heading: after traveling a quarter of a
        // circle of radius 10 the heading has turned by π/2.
        let state = TramState { speed: 1.0, curvature: 0.1, ..Default::default() };

        let quarter = std::f64::consts::FRAC_PI_2 * 10.0;
        let model = discretize(TramKinematics, IntegrationMethod::Rk4, quarter, 1000).unwrap();
        let advanced = model.eval(&state.to_vector(), &dvector![]);
        let advanced = TramState::from_vector(&advanced).unwrap();

        assert!((advanced.heading - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert!((advanced.x - 10.0).abs() < 1e-6);
        assert!((advanced.y - 10.0).abs() < 1e-6);
    }
}
