//! Data sources and their plumbing.
//!
//! - `http`: the blocking page-fetch capability
//! - `cache`: per-window response cache on disk
//! - `xml` / `html`: markup helpers
//! - `treasury` / `boc`: ledger sources for the two yield series
//! - `prime`: today's prime-rate snapshot

pub mod boc;
pub mod cache;
pub mod html;
pub mod http;
pub mod prime;
pub mod treasury;
pub mod xml;

pub use cache::SourceCache;
pub use http::{HttpFetcher, PageFetcher};
pub use prime::PrimeRateClient;
