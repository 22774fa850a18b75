//! Extended Kalman filter
//!
//! Handles nonlinear state and measurement equations by linearizing them
//! at the current mean and reusing the linear filter's covariance and
//! innovation paths. On linear models the EKF reproduces the linear
//! Kalman filter exactly, because linearization recovers the underlying
//! system matrices.
//!
//! # Reference
//!
//! Smith, G. L., Schmidt, S. F., & McGee, L. A. (1962). "Application of
//! Statistical Filter Theory to the Optimal Estimation of Position and
//! Velocity on Board a Circumlunar Vehicle." NASA TR R-135.

use nalgebra::DVector;

use crate::models::{
    linearize_measurement, linearize_state, Discrete, MeasurementEquation, StateEquation,
};
use crate::Result;

use super::estimate::KalmanEstimate;
use super::kalman::{check_measurement_dims, check_state_dims};

/// The extended Kalman filter for nonlinear models.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtendedKalmanFilter;

impl ExtendedKalmanFilter {
    /// Nonlinear time update.
    ///
    /// The predicted mean is `f(μ, u) + q`; the covariance (or factor)
    /// propagates through `A = ∂f/∂x` evaluated at the prior mean.
    pub fn forward_step<B, E>(
        model: &E,
        prior: &B,
        input: &DVector<f64>,
        noise: &B,
    ) -> Result<B>
    where
        B: KalmanEstimate,
        E: StateEquation<Discrete>,
    {
        check_state_dims(model.n_states(), model.n_inputs(), prior, input, noise)?;

        let linearized = linearize_state(model, prior.mean(), input)?;
        let mean = model.eval(prior.mean(), input) + noise.mean();
        B::propagate(mean, linearized.a(), prior, noise)
    }

    /// Nonlinear data update.
    ///
    /// The innovation is `z − g(μ, u)`; the gain flows through
    /// `C = ∂g/∂x` evaluated at the prior mean.
    pub fn data_step<B, G>(
        model: &G,
        prior: &B,
        input: &DVector<f64>,
        observation: &B,
    ) -> Result<B>
    where
        B: KalmanEstimate,
        G: MeasurementEquation,
    {
        check_measurement_dims(model, prior, input, observation)?;

        let linearized = linearize_measurement(model, prior.mean(), input)?;
        let innovation = observation.mean() - model.eval(prior.mean(), input);
        B::correct(prior, linearized.c(), &innovation, observation)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::LinearKalmanFilter;
    use crate::models::{LtiMeasurementEquation, LtiStateEquation, ModelScalar};
    use crate::types::belief::{Belief, Gaussian};
    use nalgebra::{dmatrix, dvector};

    /// Scalar quadratic measurement g(x) = x².
    struct Quadratic;

    impl MeasurementEquation for Quadratic {
        fn n_states(&self) -> usize {
            1
        }

        fn n_inputs(&self) -> usize {
            0
        }

        fn n_outputs(&self) -> usize {
            1
        }

        fn eval<T: ModelScalar>(&self, x: &DVector<T>, _u: &DVector<T>) -> DVector<T> {
            DVector::from_vec(vec![x[0] * x[0]])
        }
    }

    #[test]
    fn test_ekf_equals_lkf_on_linear_models() {
        let state_model =
            LtiStateEquation::<Discrete>::new(dmatrix![1.0, 0.1; 0.0, 0.9], dmatrix![0.0; 1.0])
                .unwrap();
        let meas_model = LtiMeasurementEquation::output_only(dmatrix![1.0, 0.0]).unwrap();

        let prior = Gaussian::new(dvector![1.0, -0.5], dmatrix![2.0, 0.1; 0.1, 1.0]).unwrap();
        let noise = Gaussian::new(dvector![0.0, 0.0], dmatrix![0.05, 0.0; 0.0, 0.05]).unwrap();
        let observation = Gaussian::new(dvector![1.2], dmatrix![0.3]).unwrap();
        let input = dvector![0.4];

        let lkf_pred =
            LinearKalmanFilter::forward_step(&state_model, &prior, &input, &noise).unwrap();
        let ekf_pred =
            ExtendedKalmanFilter::forward_step(&state_model, &prior, &input, &noise).unwrap();
        assert!(ekf_pred.mean().relative_eq(lkf_pred.mean(), 1e-12, 1e-12));
        assert!(ekf_pred.covariance().relative_eq(&lkf_pred.covariance(), 1e-12, 1e-12));

        let lkf_post =
            LinearKalmanFilter::data_step(&meas_model, &lkf_pred, &dvector![], &observation)
                .unwrap();
        let ekf_post =
            ExtendedKalmanFilter::data_step(&meas_model, &ekf_pred, &dvector![], &observation)
                .unwrap();
        assert!(ekf_post.mean().relative_eq(lkf_post.mean(), 1e-12, 1e-12));
        assert!(ekf_post.covariance().relative_eq(&lkf_post.covariance(), 1e-12, 1e-12));
    }

    #[test]
    fn test_quadratic_measurement_update() {
        // Prior N(1, 1), observation N(1, 1) of g(x) = x²: the innovation
        // vanishes, so the mean stays at 1 while the variance drops to
        // 1 - K·C·P = 0.2 with C = 2.
        let prior = Gaussian::new(dvector![1.0], dmatrix![1.0]).unwrap();
        let observation = Gaussian::new(dvector![1.0], dmatrix![1.0]).unwrap();

        let posterior =
            ExtendedKalmanFilter::data_step(&Quadratic, &prior, &dvector![], &observation)
                .unwrap();
        assert!((posterior.mean()[0] - 1.0).abs() < 1e-12);
        assert!((posterior.covariance()[(0, 0)] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_quadratic_update_in_sqrt_form() {
        let prior = Gaussian::new(dvector![1.0], dmatrix![1.0]).unwrap().to_sqrt().unwrap();
        let observation =
            Gaussian::new(dvector![1.0], dmatrix![1.0]).unwrap().to_sqrt().unwrap();

        let posterior =
            ExtendedKalmanFilter::data_step(&Quadratic, &prior, &dvector![], &observation)
                .unwrap();
        assert!((posterior.mean()[0] - 1.0).abs() < 1e-10);
        assert!((posterior.covariance()[(0, 0)] - 0.2).abs() < 1e-10);
    }
}
