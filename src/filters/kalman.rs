//! Linear Kalman filter and Rauch-Tung-Striebel smoother
//!
//! The filter is a parameter-free object: every step takes the model, the
//! belief, and the noise explicitly and returns a new belief of the same
//! representation. Dense beliefs use the covariance recursions with the
//! Joseph-form update; square-root beliefs use LQ factor updates. See
//! [`KalmanEstimate`] for the underlying machinery.
//!
//! # Example
//!
//! ```
//! use nalgebra::{dmatrix, dvector};
//! use tramline::filters::LinearKalmanFilter;
//! use tramline::models::{Discrete, LtiStateEquation, LtiMeasurementEquation};
//! use tramline::types::belief::{Belief, Gaussian};
//!
//! // Scalar integrator with unit process noise.
//! let model = LtiStateEquation::<Discrete>::new(dmatrix![1.0], dmatrix![1.0]).unwrap();
//! let prior = Gaussian::new(dvector![0.0], dmatrix![1.0]).unwrap();
//! let noise = Gaussian::new(dvector![0.0], dmatrix![1.0]).unwrap();
//!
//! let predicted = LinearKalmanFilter::forward_step(&model, &prior, &dvector![1.0], &noise).unwrap();
//! assert!((predicted.mean()[0] - 1.0).abs() < 1e-12);
//! assert!((predicted.covariance()[(0, 0)] - 2.0).abs() < 1e-12);
//! ```

use nalgebra::DVector;

use crate::models::{Discrete, LtiMeasurementEquation, LtiStateEquation, MeasurementEquation, StateEquation};
use crate::types::belief::Belief;
use crate::{Result, TramlineError};

use super::estimate::KalmanEstimate;

// ============================================================================
// Linear Kalman filter
// ============================================================================

/// The linear Kalman filter: time update, data update, and the RTS
/// backward step for linear-Gaussian models.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearKalmanFilter;

impl LinearKalmanFilter {
    /// Time update: propagates the prior through `x⁺ = A·x + B·u + q`.
    ///
    /// `noise` is the process-noise belief `(q, Q)`; its mean shifts the
    /// predicted state.
    pub fn forward_step<B: KalmanEstimate>(
        model: &LtiStateEquation<Discrete>,
        prior: &B,
        input: &DVector<f64>,
        noise: &B,
    ) -> Result<B> {
        check_state_dims(model.n_states(), model.n_inputs(), prior, input, noise)?;

        let mean = model.eval(prior.mean(), input) + noise.mean();
        B::propagate(mean, model.a(), prior, noise)
    }

    /// Data update: folds the observation `(z, R)` into the prior.
    ///
    /// The innovation is `z − (C·μ + D·u)`; dense beliefs apply the
    /// Joseph-form covariance update, square-root beliefs the LQ factor
    /// update.
    pub fn data_step<B: KalmanEstimate>(
        model: &LtiMeasurementEquation,
        prior: &B,
        input: &DVector<f64>,
        observation: &B,
    ) -> Result<B> {
        check_measurement_dims(model, prior, input, observation)?;

        let innovation = observation.mean() - model.eval(prior.mean(), input);
        B::correct(prior, model.c(), &innovation, observation)
    }

    /// RTS backward step.
    ///
    /// Combines the filtered posterior at step `k` with the one-step
    /// prior and the smoothed belief at step `k+1`, using the smoother
    /// gain `F = P·Aᵀ·(P_{k+1}⁻)⁻¹`.
    pub fn backward_step<B: KalmanEstimate>(
        model: &LtiStateEquation<Discrete>,
        posterior: &B,
        next_prior: &B,
        next_smoothed: &B,
    ) -> Result<B> {
        let n = model.n_states();
        for dim in [posterior.dim(), next_prior.dim(), next_smoothed.dim()] {
            if dim != n {
                return Err(TramlineError::DimensionMismatch { expected: n, found: dim });
            }
        }
        B::smooth(posterior, model.a(), next_prior, next_smoothed)
    }
}

// ============================================================================
// Full smoothing pass
// ============================================================================

/// One recorded step of a forward filtering pass, kept for smoothing.
#[derive(Debug, Clone)]
pub struct SmootherStep<B> {
    /// Belief after the time update, before the data update.
    pub predicted: B,
    /// Belief after the data update.
    pub updated: B,
}

/// Runs the RTS backward recursion over a recorded forward pass.
///
/// `steps[k].predicted` must be the one-step prior at time `k` and
/// `steps[k].updated` the filtered posterior at time `k`. Returns the
/// smoothed beliefs in chronological order; the last smoothed belief
/// equals the last filtered one.
pub fn rts_pass<B: KalmanEstimate>(
    model: &LtiStateEquation<Discrete>,
    steps: &[SmootherStep<B>],
) -> Result<Vec<B>> {
    let n = steps.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut smoothed: Vec<B> = Vec::with_capacity(n);
    smoothed.push(steps[n - 1].updated.clone());

    for k in (0..n - 1).rev() {
        let next_smoothed = smoothed.last().expect("nonempty by construction");
        let belief = LinearKalmanFilter::backward_step(
            model,
            &steps[k].updated,
            &steps[k + 1].predicted,
            next_smoothed,
        )?;
        smoothed.push(belief);
    }

    smoothed.reverse();
    Ok(smoothed)
}

// ============================================================================
// Dimension checks
// ============================================================================

pub(crate) fn check_state_dims<B: Belief>(
    n_states: usize,
    n_inputs: usize,
    prior: &B,
    input: &DVector<f64>,
    noise: &B,
) -> Result<()> {
    if prior.dim() != n_states {
        return Err(TramlineError::DimensionMismatch { expected: n_states, found: prior.dim() });
    }
    if noise.dim() != n_states {
        return Err(TramlineError::DimensionMismatch { expected: n_states, found: noise.dim() });
    }
    if input.len() != n_inputs {
        return Err(TramlineError::DimensionMismatch { expected: n_inputs, found: input.len() });
    }
    Ok(())
}

pub(crate) fn check_measurement_dims<B: Belief, G: MeasurementEquation>(
    model: &G,
    prior: &B,
    input: &DVector<f64>,
    observation: &B,
) -> Result<()> {
    if prior.dim() != model.n_states() {
        return Err(TramlineError::DimensionMismatch {
            expected: model.n_states(),
            found: prior.dim(),
        });
    }
    if observation.dim() != model.n_outputs() {
        return Err(TramlineError::DimensionMismatch {
            expected: model.n_outputs(),
            found: observation.dim(),
        });
    }
    if input.len() != model.n_inputs() {
        return Err(TramlineError::DimensionMismatch {
            expected: model.n_inputs(),
            found: input.len(),
        });
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
