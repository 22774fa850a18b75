//! Automatic linearization of nonlinear equations.
//!
//! Jacobians are computed with forward-mode dual numbers: the equation is
//! evaluated once per input column with a unit dual seed, and the
//! derivative parts form the corresponding Jacobian column. For an
//! already-linear equation the result recovers the underlying system
//! matrices exactly (up to floating point).

use nalgebra::{DMatrix, DVector};
use num_dual::Dual64;

use crate::{Result, TramlineError};

use super::equation::{MeasurementEquation, StateEquation, TimeDomain};
use super::lti::{LtiMeasurementEquation, LtiStateEquation};

/// Lifts a plain vector into dual space with the `seed`-th entry marked
/// for differentiation. `seed = None` lifts constants only.
fn seeded(v: &DVector<f64>, seed: Option<usize>) -> DVector<Dual64> {
    DVector::from_fn(v.len(), |i, _| {
        let d = Dual64::from_re(v[i]);
        if Some(i) == seed {
            d.derivative()
        } else {
            d
        }
    })
}

/// Jacobian columns of `f` with respect to its first argument, one dual
/// evaluation per column.
fn jacobian<F>(f: F, rows: usize, x: &DVector<f64>, u: &DVector<f64>, wrt_input: bool) -> Result<DMatrix<f64>>
where
    F: Fn(&DVector<Dual64>, &DVector<Dual64>) -> DVector<Dual64>,
{
    let cols = if wrt_input { u.len() } else { x.len() };
    let mut jac = DMatrix::zeros(rows, cols);
    for j in 0..cols {
        let (xd, ud) = if wrt_input {
            (seeded(x, None), seeded(u, Some(j)))
        } else {
            (seeded(x, Some(j)), seeded(u, None))
        };
        let out = f(&xd, &ud);
        if out.len() != rows {
            return Err(TramlineError::DimensionMismatch { expected: rows, found: out.len() });
        }
        for i in 0..rows {
            jac[(i, j)] = out[i].eps;
        }
    }
    Ok(jac)
}

fn check_point(n_states: usize, n_inputs: usize, x: &DVector<f64>, u: &DVector<f64>) -> Result<()> {
    if x.len() != n_states {
        return Err(TramlineError::DimensionMismatch { expected: n_states, found: x.len() });
    }
    if u.len() != n_inputs {
        return Err(TramlineError::DimensionMismatch { expected: n_inputs, found: u.len() });
    }
    Ok(())
}

/// Linearizes a state equation at the operating point `(x, u)`.
///
/// Returns the LTI surrogate with `A = ∂f/∂x` and `B = ∂f/∂u` (the empty
/// `n×0` matrix when the equation has no inputs).
pub fn linearize_state<Time, E>(
    eq: &E,
    x: &DVector<f64>,
    u: &DVector<f64>,
) -> Result<LtiStateEquation<Time>>
where
    Time: TimeDomain,
    E: StateEquation<Time>,
{
    let n = eq.n_states();
    check_point(n, eq.n_inputs(), x, u)?;

    let a = jacobian(|xd, ud| eq.eval(xd, ud), n, x, u, false)?;
    let b = jacobian(|xd, ud| eq.eval(xd, ud), n, x, u, true)?;
    LtiStateEquation::new(a, b)
}

/// Linearizes a measurement equation at the operating point `(x, u)`.
///
/// Returns the LTI surrogate with `C = ∂g/∂x` and `D = ∂g/∂u` (the empty
/// `p×0` matrix when the equation has no inputs).
pub fn linearize_measurement<G>(
    eq: &G,
    x: &DVector<f64>,
    u: &DVector<f64>,
) -> Result<LtiMeasurementEquation>
where
    G: MeasurementEquation,
{
    let p = eq.n_outputs();
    check_point(eq.n_states(), eq.n_inputs(), x, u)?;

    let c = jacobian(|xd, ud| eq.eval(xd, ud), p, x, u, false)?;
    let d = jacobian(|xd, ud| eq.eval(xd, ud), p, x, u, true)?;
    LtiMeasurementEquation::new(c, d)
}

// ============================================================================
// Tests
// ============================================================================
