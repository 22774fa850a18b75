//! Per-representation Kalman update machinery
//!
//! The filters in this module's siblings are generic over the belief
//! representation. [`KalmanEstimate`] carries the three primitive
//! operations — covariance propagation, the innovation path, and the
//! smoothing combination — implemented once for dense beliefs (Joseph
//! form) and once for square-root beliefs (block LQ factor updates).
//!
//! Keeping the representation a type parameter makes "square-root in,
//! square-root out" a compile-time contract: a dense prior cannot be
//! combined with a factored observation.

use nalgebra::{Cholesky, DMatrix, DVector};

use crate::types::belief::{Belief, Gaussian, SqrtGaussian};
use crate::{Result, TramlineError};

// ============================================================================
// LQ factor helper
// ============================================================================

/// Lower-triangular `L` with `L·Lᵀ = M·Mᵀ`, via QR of `Mᵀ`.
///
/// Column signs are flipped so the diagonal comes out nonnegative (the
/// sign matrix is absorbed into the discarded orthogonal factor).
pub(crate) fn lq_factor(m: &DMatrix<f64>) -> DMatrix<f64> {
    let qr = m.transpose().qr();
    let mut l = qr.r().transpose();
    for j in 0..l.ncols() {
        if l[(j, j)] < 0.0 {
            for i in j..l.nrows() {
                l[(i, j)] = -l[(i, j)];
            }
        }
    }
    l
}

// ============================================================================
// Kalman estimate capability
// ============================================================================

/// Belief representations that support the Kalman predict, correct and
/// smooth primitives.
///
/// `propagate` and `correct` take the raw system matrices so that the
/// linear, extended, and iterated filters can all reuse the same paths
/// with whatever matrices and innovations they computed.
pub trait KalmanEstimate: Belief {
    /// Propagates uncertainty through `x⁺ = A·x (+ …)`.
    ///
    /// `mean` is the already-computed predicted mean (including any
    /// input and noise contributions); only the uncertainty flows
    /// through `A` and the process noise here.
    fn propagate(mean: DVector<f64>, a: &DMatrix<f64>, prior: &Self, noise: &Self) -> Result<Self>;

    /// Folds the innovation `ν` through the measurement matrix `C`
    /// against the observation noise.
    fn correct(
        prior: &Self,
        c: &DMatrix<f64>,
        innovation: &DVector<f64>,
        observation: &Self,
    ) -> Result<Self>;

    /// Rauch-Tung-Striebel backward combination.
    fn smooth(posterior: &Self, a: &DMatrix<f64>, next_prior: &Self, next_smoothed: &Self)
        -> Result<Self>;

    /// Replaces the mean, keeping the uncertainty untouched.
    fn with_mean(self, mean: DVector<f64>) -> Self;
}

// ============================================================================
// Dense (covariance) form
// ============================================================================

impl KalmanEstimate for Gaussian {
    fn propagate(mean: DVector<f64>, a: &DMatrix<f64>, prior: &Self, noise: &Self) -> Result<Self> {
        let p = a * prior.covariance() * a.transpose() + noise.covariance();
        Gaussian::new(mean, p)
    }

    fn correct(
        prior: &Self,
        c: &DMatrix<f64>,
        innovation: &DVector<f64>,
        observation: &Self,
    ) -> Result<Self> {
        let p = prior.covariance();
        let r = observation.covariance();

        // S = C·P·Cᵀ + R, inverted only through its Cholesky factor.
        let s = c * &p * c.transpose() + &r;
        let chol = Cholesky::new(s).ok_or(TramlineError::NotPositiveDefinite)?;
        let gain = chol.solve(&(c * &p)).transpose();

        let mean = prior.mean() + &gain * innovation;

        // Joseph form keeps the posterior symmetric positive semidefinite
        // under finite precision.
        let identity = DMatrix::identity(prior.dim(), prior.dim());
        let residual_map = identity - &gain * c;
        let posterior = &residual_map * p * residual_map.transpose()
            + &gain * r * gain.transpose();

        Gaussian::new(mean, posterior)
    }

    fn smooth(
        posterior: &Self,
        a: &DMatrix<f64>,
        next_prior: &Self,
        next_smoothed: &Self,
    ) -> Result<Self> {
        let p = posterior.covariance();
        let p_pred = next_prior.covariance();

        // F = P·Aᵀ·P_pred⁻¹, via a Cholesky solve of P_pred.
        let chol = Cholesky::new(p_pred.clone()).ok_or(TramlineError::NotPositiveDefinite)?;
        let gain = chol.solve(&(a * &p)).transpose();

        let mean = posterior.mean() + &gain * (next_smoothed.mean() - next_prior.mean());
        let cov = &p - &gain * (p_pred - next_smoothed.covariance()) * gain.transpose();

        Gaussian::new(mean, cov)
    }

    fn with_mean(self, mean: DVector<f64>) -> Self {
        let covariance = self.covariance();
        Gaussian::from_parts(mean, covariance)
    }
}

// ============================================================================
// Square-root form
// ============================================================================

impl KalmanEstimate for SqrtGaussian {
    fn propagate(mean: DVector<f64>, a: &DMatrix<f64>, prior: &Self, noise: &Self) -> Result<Self> {
        let n = prior.dim();
        if noise.dim() != n {
            return Err(TramlineError::DimensionMismatch { expected: n, found: noise.dim() });
        }

        // Factor of the LQ decomposition of [ L_Q | A·L_prior ].
        let mut block = DMatrix::zeros(n, 2 * n);
        block.view_mut((0, 0), (n, n)).copy_from(noise.factor());
        block.view_mut((0, n), (n, n)).copy_from(&(a * prior.factor()));

        Ok(SqrtGaussian::from_parts(mean, lq_factor(&block)))
    }

    fn correct(
        prior: &Self,
        c: &DMatrix<f64>,
        innovation: &DVector<f64>,
        observation: &Self,
    ) -> Result<Self> {
        let n = prior.dim();
        let p = observation.dim();

        // Pre-array
        //   M = [ L_R        C·L_prior ]
        //       [ 0          L_prior   ]
        // whose LQ factor partitions into the innovation factor L_y, the
        // factored gain K̃, and the posterior factor.
        let mut block = DMatrix::zeros(p + n, p + n);
        block.view_mut((0, 0), (p, p)).copy_from(observation.factor());
        block.view_mut((0, p), (p, n)).copy_from(&(c * prior.factor()));
        block.view_mut((p, p), (n, n)).copy_from(prior.factor());

        let l = lq_factor(&block);
        let l_y = l.view((0, 0), (p, p)).clone_owned();
        let gain = l.view((p, 0), (n, p)).clone_owned();
        let posterior_factor = l.view((p, p), (n, n)).clone_owned();

        let whitened = l_y
            .solve_lower_triangular(innovation)
            .ok_or(TramlineError::SingularMatrix)?;
        let mean = prior.mean() + gain * whitened;

        Ok(SqrtGaussian::from_parts(mean, posterior_factor))
    }

    fn smooth(
        posterior: &Self,
        a: &DMatrix<f64>,
        next_prior: &Self,
        next_smoothed: &Self,
    ) -> Result<Self> {
        // The backward combination has no pre-array form as convenient as
        // the forward ones; run the dense recursion and re-factor.
        let dense = Gaussian::smooth(
            &posterior.to_dense(),
            a,
            &next_prior.to_dense(),
            &next_smoothed.to_dense(),
        )?;
        dense.to_sqrt()
    }

    fn with_mean(self, mean: DVector<f64>) -> Self {
        let factor = self.factor().clone();
        SqrtGaussian::from_parts(mean, factor)
    }
}

// ============================================================================
// Tests
// ============================================================================
