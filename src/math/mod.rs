//! Numeric helpers: two-decimal rounding and tenor interpolation.

pub mod interp;

pub use interp::*;
