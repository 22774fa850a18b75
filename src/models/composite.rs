//! Output-concatenating composite measurements.

use nalgebra::DVector;

use crate::{Result, TramlineError};

use super::equation::{MeasurementEquation, ModelScalar};

/// Concatenation of two measurement equations over the same state and
/// input.
///
/// The combined output stacks the first equation's outputs above the
/// second's. Longer stacks are built by chaining [`and`](Self::and):
///
/// ```
/// use nalgebra::dmatrix;
/// use tramline::models::{CompositeMeasurement, LtiMeasurementEquation, MeasurementEquation};
///
/// let position = LtiMeasurementEquation::output_only(dmatrix![1.0, 0.0]).unwrap();
/// let velocity = LtiMeasurementEquation::output_only(dmatrix![0.0, 1.0]).unwrap();
/// let sum = LtiMeasurementEquation::output_only(dmatrix![1.0, 1.0]).unwrap();
///
/// let stacked = CompositeMeasurement::new(position, velocity)
///     .unwrap()
///     .and(sum)
///     .unwrap();
/// assert_eq!(stacked.n_outputs(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeMeasurement<A, B> {
    first: A,
    second: B,
}

impl<A, B> CompositeMeasurement<A, B>
where
    A: MeasurementEquation,
    B: MeasurementEquation,
{
    /// Combines two measurements sharing state and input dimensions.
    pub fn new(first: A, second: B) -> Result<Self> {
        if first.n_states() != second.n_states() {
            return Err(TramlineError::DimensionMismatch {
                expected: first.n_states(),
                found: second.n_states(),
            });
        }
        if first.n_inputs() != second.n_inputs() {
            return Err(TramlineError::DimensionMismatch {
                expected: first.n_inputs(),
                found: second.n_inputs(),
            });
        }
        Ok(Self { first, second })
    }

    /// Appends a further measurement to the stack.
    pub fn and<C: MeasurementEquation>(self, next: C) -> Result<CompositeMeasurement<Self, C>> {
        CompositeMeasurement::new(self, next)
    }
}

impl<A, B> MeasurementEquation for CompositeMeasurement<A, B>
where
    A: MeasurementEquation,
    B: MeasurementEquation,
{
    #[inline]
    fn n_states(&self) -> usize {
        self.first.n_states()
    }

    #[inline]
    fn n_inputs(&self) -> usize {
        self.first.n_inputs()
    }

    #[inline]
    fn n_outputs(&self) -> usize {
        self.first.n_outputs() + self.second.n_outputs()
    }

    fn eval<T: ModelScalar>(&self, x: &DVector<T>, u: &DVector<T>) -> DVector<T> {
        let top = self.first.eval(x, u);
        let bottom = self.second.eval(x, u);
        let split = top.len();
        DVector::from_fn(split + bottom.len(), |i, _| {
            if i < split {
                top[i]
            } else {
                bottom[i - split]
            }
        })
    }
}
