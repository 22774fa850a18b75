//! Gaussian beliefs over state vectors
//!
//! A belief is an immutable probability distribution over an n-vector.
//! Two representations are provided: [`Gaussian`] carries the full
//! covariance matrix, [`SqrtGaussian`] carries its lower Cholesky factor.
//! The factored form is preferred for long filtering horizons, where it
//! keeps covariances symmetric and positive semidefinite by construction.

use ::core::f64::consts::PI;
use nalgebra::{Cholesky, DMatrix, DVector};

use crate::{Result, TramlineError};

// ============================================================================
// Belief capability set
// ============================================================================

/// Common capability set of Gaussian belief representations.
pub trait Belief: Clone {
    /// Dimension of the underlying vector.
    fn dim(&self) -> usize;

    /// Mean of the distribution.
    fn mean(&self) -> &DVector<f64>;

    /// Covariance matrix (materialized for factored representations).
    fn covariance(&self) -> DMatrix<f64>;

    /// Log-density at `y`.
    fn logpdf(&self, y: &DVector<f64>) -> Result<f64>;

    /// Density at `y`.
    fn pdf(&self, y: &DVector<f64>) -> Result<f64> {
        Ok(self.logpdf(y)?.exp())
    }
}

/// Log-density of `N(mean, L·Lᵀ)` at `y`, with `L` lower triangular.
///
/// Uses the triangular solve `L·w = y − μ` so that the Mahalanobis term is
/// `‖w‖²`; the covariance itself is never inverted.
fn factored_logpdf(mean: &DVector<f64>, factor: &DMatrix<f64>, y: &DVector<f64>) -> Result<f64> {
    let n = mean.len();
    if y.len() != n {
        return Err(TramlineError::DimensionMismatch { expected: n, found: y.len() });
    }

    let mut log_det = 0.0;
    for i in 0..n {
        let l_ii = factor[(i, i)];
        if l_ii <= 0.0 {
            return Err(TramlineError::SingularMatrix);
        }
        log_det += l_ii.ln();
    }

    let w = factor
        .solve_lower_triangular(&(y - mean))
        .ok_or(TramlineError::SingularMatrix)?;

    let half = 0.5;
    Ok(-(n as f64) * half * (2.0 * PI).ln() - log_det - half * w.norm_squared())
}

// ============================================================================
// Dense representation
// ============================================================================

/// A Gaussian belief carrying mean and full covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct Gaussian {
    mean: DVector<f64>,
    covariance: DMatrix<f64>,
}

impl Gaussian {
    /// Creates a belief from its moments.
    ///
    /// The covariance must be square and match the mean's dimension;
    /// positive semidefiniteness is the caller's responsibility and is
    /// checked where it matters (Cholesky-based operations).
    pub fn new(mean: DVector<f64>, covariance: DMatrix<f64>) -> Result<Self> {
        let n = mean.len();
        if n == 0 {
            return Err(TramlineError::InvalidArgument("belief dimension must be nonzero"));
        }
        if covariance.nrows() != n || covariance.ncols() != n {
            return Err(TramlineError::DimensionMismatch { expected: n, found: covariance.nrows() });
        }
        Ok(Self { mean, covariance })
    }

    /// Internal constructor for moments whose shapes are guaranteed by
    /// the caller.
    #[inline]
    pub(crate) fn from_parts(mean: DVector<f64>, covariance: DMatrix<f64>) -> Self {
        Self { mean, covariance }
    }

    /// Creates a belief with a diagonal covariance.
    pub fn from_diagonal(mean: DVector<f64>, variances: &DVector<f64>) -> Result<Self> {
        let cov = DMatrix::from_diagonal(variances);
        Self::new(mean, cov)
    }

    /// Converts to the square-root representation.
    ///
    /// Fails with [`TramlineError::NotPositiveDefinite`] if the covariance
    /// has no Cholesky factorization.
    pub fn to_sqrt(&self) -> Result<SqrtGaussian> {
        let chol = Cholesky::new(self.covariance.clone())
            .ok_or(TramlineError::NotPositiveDefinite)?;
        Ok(SqrtGaussian::from_parts(self.mean.clone(), chol.l()))
    }
}

impl Belief for Gaussian {
    #[inline]
    fn dim(&self) -> usize {
        self.mean.len()
    }

    #[inline]
    fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    #[inline]
    fn covariance(&self) -> DMatrix<f64> {
        self.covariance.clone()
    }

    fn logpdf(&self, y: &DVector<f64>) -> Result<f64> {
        let chol = Cholesky::new(self.covariance.clone())
            .ok_or(TramlineError::NotPositiveDefinite)?;
        factored_logpdf(&self.mean, &chol.l(), y)
    }
}

// ============================================================================
// Square-root representation
// ============================================================================

/// A Gaussian belief carrying mean and the lower Cholesky factor `L` of
/// its covariance, `cov = L·Lᵀ`.
///
/// The diagonal of `L` is kept nonnegative. All density evaluations go
/// through triangular solves against `L`.
#[derive(Debug, Clone, PartialEq)]
pub struct SqrtGaussian {
    mean: DVector<f64>,
    factor: DMatrix<f64>,
}

impl SqrtGaussian {
    /// Creates a belief from its mean and lower-triangular factor.
    ///
    /// The factor must be square, match the mean's dimension, be lower
    /// triangular, and have a nonnegative diagonal.
    pub fn new(mean: DVector<f64>, factor: DMatrix<f64>) -> Result<Self> {
        let n = mean.len();
        if n == 0 {
            return Err(TramlineError::InvalidArgument("belief dimension must be nonzero"));
        }
        if factor.nrows() != n || factor.ncols() != n {
            return Err(TramlineError::DimensionMismatch { expected: n, found: factor.nrows() });
        }
        for i in 0..n {
            if factor[(i, i)] < 0.0 {
                return Err(TramlineError::InvalidArgument("factor diagonal must be nonnegative"));
            }
            for j in (i + 1)..n {
                if factor[(i, j)] != 0.0 {
                    return Err(TramlineError::InvalidArgument("factor must be lower triangular"));
                }
            }
        }
        Ok(Self { mean, factor })
    }

    /// Creates a belief from moments by taking the Cholesky factor.
    pub fn from_moments(mean: DVector<f64>, covariance: DMatrix<f64>) -> Result<Self> {
        Gaussian::new(mean, covariance)?.to_sqrt()
    }

    /// Internal constructor for factors produced by this crate's own
    /// factorizations, which are triangular by construction.
    #[inline]
    pub(crate) fn from_parts(mean: DVector<f64>, factor: DMatrix<f64>) -> Self {
        Self { mean, factor }
    }

    /// The lower Cholesky factor.
    #[inline]
    pub fn factor(&self) -> &DMatrix<f64> {
        &self.factor
    }

    /// Converts to the dense representation by materializing `L·Lᵀ`.
    pub fn to_dense(&self) -> Gaussian {
        Gaussian {
            mean: self.mean.clone(),
            covariance: &self.factor * self.factor.transpose(),
        }
    }
}

impl Belief for SqrtGaussian {
    #[inline]
    fn dim(&self) -> usize {
        self.mean.len()
    }

    #[inline]
    fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    #[inline]
    fn covariance(&self) -> DMatrix<f64> {
        &self.factor * self.factor.transpose()
    }

    fn logpdf(&self, y: &DVector<f64>) -> Result<f64> {
        factored_logpdf(&self.mean, &self.factor, y)
    }
}

impl From<SqrtGaussian> for Gaussian {
    fn from(belief: SqrtGaussian) -> Self {
        belief.to_dense()
    }
}

// ============================================================================
// Tests
// ============================================================================
