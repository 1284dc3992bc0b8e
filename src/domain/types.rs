//! Shared domain types.
//!
//! These types are intentionally small and immutable once built:
//!
//! - `TenorValue` / `DateRecord` hold one source observation per calendar date
//! - `HistoryRow` is one entry of the rolling prime-rate table
//! - `RunConfig` is the resolved run configuration

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDate;

use crate::error::AppError;

/// A single named yield observation, e.g. the 2-year yield on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct TenorValue {
    pub tenor_name: String,
    pub raw_text: String,
    pub numeric_value: f64,
}

impl TenorValue {
    /// Parse `raw` as a percentage-like decimal (`"1.18"` means 1.18%).
    pub fn parse(tenor_name: &str, raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        let numeric_value = trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| AppError::parse(format!("invalid {tenor_name} value: '{raw}'")))?;
        Ok(Self {
            tenor_name: tenor_name.to_string(),
            raw_text: trimmed.to_string(),
            numeric_value,
        })
    }
}

/// All tenor values published for one calendar date, derived tenors included.
#[derive(Debug, Clone, PartialEq)]
pub struct DateRecord {
    pub date: NaiveDate,
    pub tenors: BTreeMap<String, TenorValue>,
}

impl DateRecord {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            tenors: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, value: TenorValue) {
        self.tenors.insert(value.tenor_name.clone(), value);
    }

    pub fn get(&self, tenor: &str) -> Option<&TenorValue> {
        self.tenors.get(tenor)
    }

    pub fn require(&self, tenor: &str) -> Result<&TenorValue, AppError> {
        self.get(tenor)
            .ok_or_else(|| AppError::parse(format!("missing {tenor} value for {}", self.date)))
    }
}

/// A tenor computed as the rounded mean of two neighbouring published tenors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedTenor {
    pub name: &'static str,
    pub lower: &'static str,
    pub upper: &'static str,
}

/// One row of a rolling history column group: `(effective date, value)`.
///
/// Values are kept exactly as displayed (`"4.50%"`) so that comparisons
/// between stored rows are byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub effective_date: String,
    pub value: String,
}

impl HistoryRow {
    pub fn new(effective_date: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            effective_date: effective_date.into(),
            value: value.into(),
        }
    }
}

/// Prime rates published by the bank page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BankPrimeRates {
    pub us: f64,
    pub canada: f64,
}

/// Today's point values for every tracked prime-rate series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimeSnapshot {
    pub date: NaiveDate,
    pub wsj: f64,
    pub bank: BankPrimeRates,
}

/// Resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Workbook directory (one CSV per sheet).
    pub output: PathBuf,
    /// Root of the per-source response cache.
    pub cache_dir: PathBuf,
    /// First day of the Bank of Canada sheet.
    pub boc_start: NaiveDate,
    /// First day of the US Treasury sheet.
    pub treasury_start: NaiveDate,
    /// Exclusive end of every day walk; captured once at startup.
    pub today: NaiveDate,
    pub http_timeout_secs: u64,
}
