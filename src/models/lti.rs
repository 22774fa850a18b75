//! Linear time-invariant state and measurement equations.

use ::core::marker::PhantomData;
use nalgebra::{DMatrix, DVector};

use crate::{Result, TramlineError};

use super::equation::{mat_vec, MeasurementEquation, ModelScalar, StateEquation, TimeDomain};

// ============================================================================
// LTI state equation
// ============================================================================

/// A linear time-invariant state equation `x' = A·x + B·u`.
///
/// When the equation has no inputs, `B` is the empty `n×0` matrix and the
/// input term is dropped. `Time` marks whether `x'` is a derivative
/// ([`Continuous`](super::Continuous)) or the next state
/// ([`Discrete`](super::Discrete)).
#[derive(Debug, Clone, PartialEq)]
pub struct LtiStateEquation<Time: TimeDomain> {
    a: DMatrix<f64>,
    b: DMatrix<f64>,
    _time: PhantomData<Time>,
}

impl<Time: TimeDomain> LtiStateEquation<Time> {
    /// Creates an equation from its system matrices.
    ///
    /// `A` must be square and nonempty; `B` must be empty or have as many
    /// rows as `A`.
    pub fn new(a: DMatrix<f64>, b: DMatrix<f64>) -> Result<Self> {
        let n = a.nrows();
        if n == 0 {
            return Err(TramlineError::InvalidArgument("system matrix must be nonempty"));
        }
        if a.ncols() != n {
            return Err(TramlineError::DimensionMismatch { expected: n, found: a.ncols() });
        }
        let b = if b.ncols() == 0 {
            DMatrix::zeros(n, 0)
        } else {
            if b.nrows() != n {
                return Err(TramlineError::DimensionMismatch { expected: n, found: b.nrows() });
            }
            b
        };
        Ok(Self { a, b, _time: PhantomData })
    }

    /// Creates an input-free equation `x' = A·x`.
    pub fn autonomous(a: DMatrix<f64>) -> Result<Self> {
        let n = a.nrows();
        Self::new(a, DMatrix::zeros(n, 0))
    }

    /// The system matrix `A`.
    #[inline]
    pub fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    /// The input matrix `B` (`n×0` when input-free).
    #[inline]
    pub fn b(&self) -> &DMatrix<f64> {
        &self.b
    }
}

impl<Time: TimeDomain> StateEquation<Time> for LtiStateEquation<Time> {
    #[inline]
    fn n_states(&self) -> usize {
        self.a.nrows()
    }

    #[inline]
    fn n_inputs(&self) -> usize {
        self.b.ncols()
    }

    fn eval<T: ModelScalar>(&self, x: &DVector<T>, u: &DVector<T>) -> DVector<T> {
        let mut out = mat_vec(&self.a, x);
        if self.n_inputs() > 0 {
            out += mat_vec(&self.b, u);
        }
        out
    }
}

// ============================================================================
// LTI measurement equation
// ============================================================================

/// A linear time-invariant measurement equation `y = C·x + D·u`.
///
/// `C` must be nonempty; `D` is empty (`p×0`) or `p×m`.
#[derive(Debug, Clone, PartialEq)]
pub struct LtiMeasurementEquation {
    c: DMatrix<f64>,
    d: DMatrix<f64>,
}

impl LtiMeasurementEquation {
    /// Creates an equation from its output matrices.
    pub fn new(c: DMatrix<f64>, d: DMatrix<f64>) -> Result<Self> {
        let p = c.nrows();
        if p == 0 || c.ncols() == 0 {
            return Err(TramlineError::InvalidArgument("output matrix must be nonempty"));
        }
        let d = if d.ncols() == 0 {
            DMatrix::zeros(p, 0)
        } else {
            if d.nrows() != p {
                return Err(TramlineError::DimensionMismatch { expected: p, found: d.nrows() });
            }
            d
        };
        Ok(Self { c, d })
    }

    /// Creates an input-free equation `y = C·x`.
    pub fn output_only(c: DMatrix<f64>) -> Result<Self> {
        let p = c.nrows();
        Self::new(c, DMatrix::zeros(p, 0))
    }

    /// The output matrix `C`.
    #[inline]
    pub fn c(&self) -> &DMatrix<f64> {
        &self.c
    }

    /// The feedthrough matrix `D` (`p×0` when input-free).
    #[inline]
    pub fn d(&self) -> &DMatrix<f64> {
        &self.d
    }
}

impl MeasurementEquation for LtiMeasurementEquation {
    #[inline]
    fn n_states(&self) -> usize {
        self.c.ncols()
    }

    #[inline]
    fn n_inputs(&self) -> usize {
        self.d.ncols()
    }

    #[inline]
    fn n_outputs(&self) -> usize {
        self.c.nrows()
    }

    fn eval<T: ModelScalar>(&self, x: &DVector<T>, u: &DVector<T>) -> DVector<T> {
        let mut out = mat_vec(&self.c, x);
        if self.n_inputs() > 0 {
            out += mat_vec(&self.d, u);
        }
        out
    }
}

// ============================================================================
// Tests
// ============================================================================
