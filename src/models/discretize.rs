//! Fixed-step integrators and continuous-to-discrete wrapping.

use nalgebra::DVector;

use crate::{Result, TramlineError};

use super::equation::{Continuous, Discrete, ModelScalar, StateEquation};

// ============================================================================
// Integrator steps
// ============================================================================

/// One forward-Euler step: `x + f(x, u)·dt`.
pub fn euler_step<E, T>(eq: &E, x: &DVector<T>, u: &DVector<T>, dt: f64) -> DVector<T>
where
    E: StateEquation<Continuous>,
    T: ModelScalar,
{
    x + eq.eval(x, u) * T::from(dt)
}

/// One classic fourth-order Runge-Kutta step.
///
/// Stages are evaluated at `(x, u)`, `(x + k1·dt/2, u)`, `(x + k2·dt/2, u)`
/// and `(x + k3·dt, u)`; the input is held constant across the step.
pub fn rk4_step<E, T>(eq: &E, x: &DVector<T>, u: &DVector<T>, dt: f64) -> DVector<T>
where
    E: StateEquation<Continuous>,
    T: ModelScalar,
{
    let half = T::from(0.5 * dt);
    let full = T::from(dt);
    let two = T::from(2.0);

    let k1 = eq.eval(x, u);
    let k2 = eq.eval(&(x + &k1 * half), u);
    let k3 = eq.eval(&(x + &k2 * half), u);
    let k4 = eq.eval(&(x + &k3 * full), u);

    x + (k1 + k2 * two + k3 * two + k4) * T::from(dt / 6.0)
}

/// Fixed-step integration schemes for wrapping continuous equations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationMethod {
    /// Forward Euler (first order)
    Euler,
    /// Classic Runge-Kutta (fourth order)
    Rk4,
}

impl IntegrationMethod {
    /// Advances `x` by one step of this method.
    pub fn step<E, T>(&self, eq: &E, x: &DVector<T>, u: &DVector<T>, dt: f64) -> DVector<T>
    where
        E: StateEquation<Continuous>,
        T: ModelScalar,
    {
        match self {
            IntegrationMethod::Euler => euler_step(eq, x, u, dt),
            IntegrationMethod::Rk4 => rk4_step(eq, x, u, dt),
        }
    }
}

// ============================================================================
// Discretized state equation
// ============================================================================

/// A continuous-time state equation advanced over a fixed sampling period.
///
/// One discrete step applies the integration method `subsamples` times
/// with micro-step `ts / subsamples`. Built with [`discretize`].
#[derive(Debug, Clone, PartialEq)]
pub struct DiscretizedStateEquation<E: StateEquation<Continuous>> {
    inner: E,
    method: IntegrationMethod,
    ts: f64,
    subsamples: usize,
}

/// Wraps a continuous-time equation into a discrete-time one.
///
/// Fails with a domain error on `ts ≤ 0`, non-finite `ts`, or
/// `subsamples < 1`.
pub fn discretize<E: StateEquation<Continuous>>(
    eq: E,
    method: IntegrationMethod,
    ts: f64,
    subsamples: usize,
) -> Result<DiscretizedStateEquation<E>> {
    if !ts.is_finite() || ts <= 0.0 {
        return Err(TramlineError::InvalidArgument("sampling period must be positive and finite"));
    }
    if subsamples < 1 {
        return Err(TramlineError::InvalidArgument("subsamples must be at least 1"));
    }
    Ok(DiscretizedStateEquation { inner: eq, method, ts, subsamples })
}

impl<E: StateEquation<Continuous>> DiscretizedStateEquation<E> {
    /// The wrapped continuous-time equation.
    #[inline]
    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// The sampling period.
    #[inline]
    pub fn ts(&self) -> f64 {
        self.ts
    }

    /// Integration micro-steps per sampling period.
    #[inline]
    pub fn subsamples(&self) -> usize {
        self.subsamples
    }

    /// The integration method.
    #[inline]
    pub fn method(&self) -> IntegrationMethod {
        self.method
    }
}

impl<E: StateEquation<Continuous>> StateEquation<Discrete> for DiscretizedStateEquation<E> {
    #[inline]
    fn n_states(&self) -> usize {
        self.inner.n_states()
    }

    #[inline]
    fn n_inputs(&self) -> usize {
        self.inner.n_inputs()
    }

    fn eval<T: ModelScalar>(&self, x: &DVector<T>, u: &DVector<T>) -> DVector<T> {
        let dt = self.ts / self.subsamples as f64;
        let mut x = x.clone();
        for _ in 0..self.subsamples {
            x = self.method.step(&self.inner, &x, u, dt);
        }
        x
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LtiStateEquation;
    use nalgebra::{dmatrix, dvector, DMatrix};

    #[test]
    fn test_euler_matches_closed_form_on_linear_model() {
        let eq = LtiStateEquation::<Continuous>::new(
            dmatrix![0.0, 1.0; -2.0, -0.5],
            dmatrix![0.0; 1.0],
        )
        .unwrap();
        let x = dvector![1.0, -1.0];
        let u = dvector![0.3];
        let dt = 0.01;

        let stepped = euler_step(&eq, &x, &u, dt);
        let expected = &x + (eq.a() * &x + eq.b() * &u) * dt;
        assert!(stepped.relative_eq(&expected, 1e-14, 1e-14));
    }

    #[test]
    fn test_rk4_exact_for_constant_derivative() {
        // With A = 0 the derivative is the constant B·u, so one RK4 step
        // must land exactly on x + B·u·dt.
        let eq = LtiStateEquation::<Continuous>::new(
            DMatrix::zeros(2, 2),
            dmatrix![1.0; 2.0],
        )
        .unwrap();
        let x = dvector![0.0, 0.0];
        let u = dvector![3.0];

        let stepped = rk4_step(&eq, &x, &u, 0.5);
        assert!(stepped.relative_eq(&dvector![1.5, 3.0], 1e-14, 1e-14));
    }

    #[test]
    fn test_rk4_order_on_exponential_decay() {
        // dx/dt = -x from x = 1: the RK4 step error against e^{-dt} is
        // fifth order, far below the Euler error at the same step.
        let eq = LtiStateEquation::<Continuous>::autonomous(dmatrix![-1.0]).unwrap();
        let x = dvector![1.0];
        let u = dvector![];
        let dt = 0.1;

        let exact = (-dt as f64).exp();
        let rk4 = rk4_step(&eq, &x, &u, dt)[0];
        let euler = euler_step(&eq, &x, &u, dt)[0];
        assert!((rk4 - exact).abs() < 1e-6);
        assert!((euler - exact).abs() > 1e-4);
    }

    #[test]
    fn test_discretize_validates_parameters() {
        let eq = LtiStateEquation::<Continuous>::autonomous(dmatrix![-1.0]).unwrap();
        assert!(discretize(eq.clone(), IntegrationMethod::Rk4, 0.0, 1).is_err());
        assert!(discretize(eq.clone(), IntegrationMethod::Rk4, f64::NAN, 1).is_err());
        assert!(discretize(eq.clone(), IntegrationMethod::Rk4, -0.1, 1).is_err());
        assert!(discretize(eq, IntegrationMethod::Rk4, 0.1, 0).is_err());
    }

    #[test]
    fn test_subsampling_refines_the_step() {
        let eq = LtiStateEquation::<Continuous>::autonomous(dmatrix![-1.0]).unwrap();
        let coarse = discretize(eq.clone(), IntegrationMethod::Euler, 1.0, 1).unwrap();
        let fine = discretize(eq, IntegrationMethod::Euler, 1.0, 1000).unwrap();

        assert_eq!(fine.n_states(), 1);
        assert_eq!(fine.n_inputs(), 0);

        let x = dvector![1.0];
        let u = dvector![];
        let exact = (-1.0_f64).exp();
        let coarse_err = (coarse.eval(&x, &u)[0] - exact).abs();
        let fine_err = (fine.eval(&x, &u)[0] - exact).abs();
        assert!(fine_err < coarse_err / 100.0);
    }
}
