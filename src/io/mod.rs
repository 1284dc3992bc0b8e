//! Input/output helpers.
//!
//! - workbook cells and CSV persistence (`workbook`)
//! - exclusive run lock (`lock`)

pub mod lock;
pub mod workbook;

pub use lock::RunLock;
pub use workbook::{Grid, Workbook};
