//! State-space model algebra
//!
//! This module defines the state and measurement equation abstractions,
//! their linear time-invariant specializations, output-concatenating
//! composite measurements, ODE-based discretization, and automatic
//! linearization.

mod equation;
mod lti;
mod composite;
mod discretize;
mod linearize;

pub use equation::*;
pub use lti::*;
pub use composite::*;
pub use discretize::*;
pub use linearize::*;
