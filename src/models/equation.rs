//! State and measurement equation traits
//!
//! Equations are evaluated generically over a scalar algebra so that a
//! single model definition serves both plain evaluation (`f64`) and
//! dual-number linearization.

use nalgebra::{DMatrix, DVector};
use num_dual::DualNum;

// ============================================================================
// Time-domain markers
// ============================================================================

/// Marker type for continuous-time state equations (`f(x, u)` is a derivative)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Continuous;

/// Marker type for discrete-time state equations (`f(x, u)` is the next state)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discrete;

/// Time domains a state equation can live in.
pub trait TimeDomain {}

impl TimeDomain for Continuous {}
impl TimeDomain for Discrete {}

// ============================================================================
// Evaluation scalar
// ============================================================================

/// Scalar algebra that model equations are evaluated over.
///
/// Implemented by `f64` for plain evaluation and by `num_dual::Dual64`
/// during linearization, so Jacobians come out of the same model code
/// that produces values.
pub trait ModelScalar: DualNum<f64> + nalgebra::Scalar + Copy {}

impl<T: DualNum<f64> + nalgebra::Scalar + Copy> ModelScalar for T {}

// ============================================================================
// Equation traits
// ============================================================================

/// A state equation `f(x, u)`.
///
/// For `Time = Continuous` the output is the state derivative; for
/// `Time = Discrete` it is the next state. The output length must equal
/// [`n_states`](StateEquation::n_states). `n_inputs` may be zero, in
/// which case `u` is an empty vector and is ignored.
pub trait StateEquation<Time: TimeDomain> {
    /// State dimension.
    fn n_states(&self) -> usize;

    /// Input dimension (may be zero).
    fn n_inputs(&self) -> usize;

    /// Evaluates the equation at `(x, u)`.
    fn eval<T: ModelScalar>(&self, x: &DVector<T>, u: &DVector<T>) -> DVector<T>;
}

/// A measurement equation `g(x, u)` with `n_outputs` observations.
pub trait MeasurementEquation {
    /// State dimension.
    fn n_states(&self) -> usize;

    /// Input dimension (may be zero).
    fn n_inputs(&self) -> usize;

    /// Output dimension.
    fn n_outputs(&self) -> usize;

    /// Evaluates the equation at `(x, u)`.
    fn eval<T: ModelScalar>(&self, x: &DVector<T>, u: &DVector<T>) -> DVector<T>;
}

// ============================================================================
// Mixed-scalar helpers
// ============================================================================

/// Multiplies a plain `f64` matrix by a generic-scalar vector.
///
/// nalgebra's operators require both sides to share a scalar; model
/// matrices stay `f64` while the vector may carry dual numbers.
pub(crate) fn mat_vec<T: ModelScalar>(m: &DMatrix<f64>, v: &DVector<T>) -> DVector<T> {
    DVector::from_fn(m.nrows(), |i, _| {
        (0..m.ncols()).fold(T::zero(), |acc, j| acc + v[j] * m[(i, j)])
    })
}
