//! Core value types: Gaussian beliefs in dense and square-root form.

pub mod belief;
