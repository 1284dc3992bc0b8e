//! Reporting utilities: cell formatting, the fixed text of each sheet and
//! terminal summaries.

pub mod format;

pub use format::{format_build_summary, format_update_summary, percent, rate_fraction};
