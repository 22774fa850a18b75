//! Step-size controllers for iterated measurement updates.
//!
//! A controller receives an objective `V`, the current point, and a
//! proposed step, and returns the step actually taken. [`IdentityStepping`]
//! accepts the proposal unchanged; [`BacktrackingLineSearch`] contracts it
//! until the Armijo sufficient-decrease condition holds, falling back to
//! the zero step when no contraction produces a decrease.

use nalgebra::DVector;

use crate::{Result, TramlineError};

// ============================================================================
// Step control contract
// ============================================================================

/// A step-size controller `(V, x0, s0) → s`.
pub trait StepControl {
    /// Chooses the step to take from `x0` along the proposal `proposed`,
    /// judging progress with `objective`.
    fn step<V>(&self, objective: V, x0: &DVector<f64>, proposed: &DVector<f64>) -> DVector<f64>
    where
        V: Fn(&DVector<f64>) -> f64;
}

/// Accepts every proposed step unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityStepping;

impl StepControl for IdentityStepping {
    fn step<V>(&self, _objective: V, _x0: &DVector<f64>, proposed: &DVector<f64>) -> DVector<f64>
    where
        V: Fn(&DVector<f64>) -> f64,
    {
        proposed.clone()
    }
}

// ============================================================================
// Backtracking line search
// ============================================================================

/// Backtracking line search with the Armijo sufficient-decrease rule.
///
/// Starting from multiplier `α = 1`, the step `α·s0` is accepted once the
/// achieved decrease exceeds `strictness·α·|∇V·s0|`; otherwise `α` is
/// contracted by `reduction`. On exhaustion the last contracted step is
/// taken if it still decreases the objective, else the zero step is
/// returned, signaling "do not move". The fallback protects Gauss-Newton
/// iterations against indefinite or badly conditioned curvature.
#[derive(Debug, Clone, Copy)]
pub struct BacktrackingLineSearch {
    strictness: f64,
    reduction: f64,
    max_iters: usize,
}

impl BacktrackingLineSearch {
    /// Creates a controller with the given Armijo parameters.
    ///
    /// `strictness` and `reduction` must lie in `(0, 1)`; `max_iters`
    /// must be at least 1.
    pub fn new(strictness: f64, reduction: f64, max_iters: usize) -> Result<Self> {
        if !(0.0..1.0).contains(&strictness) || strictness == 0.0 {
            return Err(TramlineError::InvalidArgument("strictness must lie in (0, 1)"));
        }
        if !(0.0..1.0).contains(&reduction) || reduction == 0.0 {
            return Err(TramlineError::InvalidArgument("reduction must lie in (0, 1)"));
        }
        if max_iters < 1 {
            return Err(TramlineError::InvalidArgument("max_iters must be at least 1"));
        }
        Ok(Self { strictness, reduction, max_iters })
    }
}

impl StepControl for BacktrackingLineSearch {
    fn step<V>(&self, objective: V, x0: &DVector<f64>, proposed: &DVector<f64>) -> DVector<f64>
    where
        V: Fn(&DVector<f64>) -> f64,
    {
        let v0 = objective(x0);
        let gradient = numerical_gradient(&objective, x0);
        let required_slope = -gradient.dot(proposed) * self.strictness;

        let mut alpha = 1.0;
        for _ in 0..self.max_iters {
            let step = proposed * alpha;
            let decrease = v0 - objective(&(x0 + &step));
            if decrease > required_slope * alpha {
                return step;
            }
            alpha *= self.reduction;
        }

        // Exhausted: keep the last contracted step only if it still helps.
        let step = proposed * alpha;
        if objective(&(x0 + &step)) < v0 {
            step
        } else {
            DVector::zeros(x0.len())
        }
    }
}

/// Central-difference gradient with per-component scaled spacing.
fn numerical_gradient<V>(objective: &V, x: &DVector<f64>) -> DVector<f64>
where
    V: Fn(&DVector<f64>) -> f64,
{
    let mut gradient = DVector::zeros(x.len());
    for i in 0..x.len() {
        let h = f64::EPSILON.cbrt() * (1.0 + x[i].abs());
        let mut forward = x.clone();
        forward[i] += h;
        let mut backward = x.clone();
        backward[i] -= h;
        gradient[i] = (objective(&forward) - objective(&backward)) / (2.0 * h);
    }
    gradient
}

// ============================================================================
// Tests
// ============================================================================
