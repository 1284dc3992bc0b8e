//! Domain types used throughout the pipeline.
//!
//! - observation records (`TenorValue`, `DateRecord`, `DerivedTenor`)
//! - prime-rate history rows and snapshots
//! - calendar windows and the external date formats (`dates`)

pub mod dates;
pub mod types;

pub use dates::Window;
pub use types::*;
