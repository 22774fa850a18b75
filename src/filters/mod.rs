//! Gaussian Bayesian filters
//!
//! Linear Kalman filtering with Rauch-Tung-Striebel smoothing, extended
//! Kalman filtering, and iterated extended Kalman filtering, each running
//! on dense or square-root beliefs through the [`KalmanEstimate`]
//! machinery.

mod estimate;
mod kalman;
mod ekf;
mod line_search;
mod iekf;

pub use estimate::*;
pub use kalman::*;
pub use ekf::*;
pub use line_search::*;
pub use iekf::*;
