//! `rate-ledger` library crate.
//!
//! The binary (`rate-ledger`) is a thin wrapper around this library so that:
//!
//! - ledger, cache and history logic is testable without the network
//! - sources and sheets can be added without touching the entry point

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod history;
pub mod io;
pub mod ledger;
pub mod math;
pub mod report;
