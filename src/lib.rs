//! Tramline: Gaussian state estimation for tram-like vehicles
//!
//! A library for state estimation of nonlinear dynamical systems under
//! Gaussian noise, together with a synthetic ground-truth generator for a
//! tram-like 2D vehicle.
//!
//! # Features
//!
//! - **Model algebra**: continuous/discrete state equations, composable
//!   measurement equations, automatic linearization and ODE-based
//!   discretization
//! - **Gaussian filters**: linear Kalman filter with Rauch-Tung-Striebel
//!   smoothing, extended Kalman filter, and iterated extended Kalman
//!   filter with Gauss-Newton line search
//! - **Square-root forms**: every filter also runs on Cholesky-factored
//!   beliefs, with LQ-based factor updates for numerical robustness
//! - **Trajectory rendering**: piecewise track-geometry and speed-profile
//!   segments driving a rigid-body kinematic ODE with RK4 integration

pub mod types;
pub mod models;
pub mod filters;
pub mod trajectory;
pub mod utils;

pub mod prelude {
    pub use crate::types::belief::*;
    pub use crate::models::*;
    pub use crate::filters::*;
    pub use crate::trajectory::*;
    pub use crate::utils::interp::*;
}

/// Error types for the library
#[derive(Debug, Clone, PartialEq)]
pub enum TramlineError {
    /// A construction-time parameter violates its domain
    InvalidArgument(&'static str),
    /// Vector or matrix dimensions do not match the model
    DimensionMismatch { expected: usize, found: usize },
    /// A matrix that must be positive definite is not
    NotPositiveDefinite,
    /// A triangular solve or inversion hit a singular matrix
    SingularMatrix,
}

impl std::error::Error for TramlineError {}

impl ::core::fmt::Display for TramlineError {
    fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
        match self {
            TramlineError::InvalidArgument(what) => write!(f, "invalid argument: {}", what),
            TramlineError::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {}, found {}", expected, found)
            }
            TramlineError::NotPositiveDefinite => write!(f, "matrix is not positive definite"),
            TramlineError::SingularMatrix => write!(f, "matrix is singular"),
        }
    }
}

pub type Result<T> = ::core::result::Result<T, TramlineError>;
