//! Per-source date → record store.
//!
//! A `SourceLedger` holds the records of exactly one fetch window (a month).
//! When asked about a date outside that window it rebuilds itself from the
//! cache (or the network) for the new window, replacing all records.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::data::SourceCache;
use crate::domain::dates::{iso_date, parse_iso_date};
use crate::domain::{DateRecord, DerivedTenor, TenorValue, Window};
use crate::error::AppError;
use crate::math::interpolate;

pub mod walker;

pub use walker::{DayRow, NOT_AVAILABLE, walk_days};

/// One date's raw tenor strings as found in a source payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Date as published, marker/suffix included.
    pub date: String,
    /// Tenor name → raw text; tenors published empty or null are absent.
    pub values: BTreeMap<String, String>,
}

/// Source-specific schema: where a window comes from and how to read it.
pub trait LedgerSource {
    /// Short name, also the cache sub-directory.
    fn name(&self) -> &'static str;

    /// Cache key for `window`. `trigger` is the date whose lookup caused the load.
    fn cache_key(&self, window: Window, trigger: NaiveDate) -> String;

    /// Fetch the raw (already structured) payload for one window.
    fn fetch_window(&self, window: Window) -> Result<Vec<u8>, AppError>;

    fn parse_entries(&self, raw: &[u8]) -> Result<Vec<RawEntry>, AppError>;

    /// Marker every published date must end with; stripped before use.
    fn date_suffix(&self) -> &'static str;

    fn required_tenors(&self) -> &'static [&'static str];

    fn derived_tenors(&self) -> &'static [DerivedTenor];
}

pub struct SourceLedger<S: LedgerSource> {
    source: S,
    cache: SourceCache,
    window: Option<Window>,
    records: HashMap<NaiveDate, DateRecord>,
}

impl<S: LedgerSource> SourceLedger<S> {
    /// `cache_root` is shared between sources; each source gets its own sub-directory.
    pub fn new(source: S, cache_root: &std::path::Path) -> Self {
        let cache = SourceCache::new(cache_root.join(source.name()));
        Self {
            source,
            cache,
            window: None,
            records: HashMap::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn window(&self) -> Option<Window> {
        self.window
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replace the record set with the records of `window`.
    pub fn build_for_window(&mut self, window: Window, trigger: NaiveDate) -> Result<(), AppError> {
        let key = self.source.cache_key(window, trigger);
        let raw = self
            .cache
            .get_or_fetch(&key, || self.source.fetch_window(window))
            .map_err(|e| e.context(format!("{} window {window}", self.source.name())))?;

        let entries = self
            .source
            .parse_entries(&raw)
            .map_err(|e| e.context(format!("{} cache entry {key}", self.source.name())))?;
        let records = build_records(&self.source, entries)?;

        tracing::info!(
            source = self.source.name(),
            %window,
            key,
            records = records.len(),
            "ledger rebuilt"
        );
        self.records = records;
        self.window = Some(window);
        Ok(())
    }

    pub fn lookup(&self, date: NaiveDate) -> Option<&DateRecord> {
        self.records.get(&date)
    }

    /// Look `date` up, first rebuilding if it falls outside the loaded window.
    ///
    /// `Ok(None)` means the source published nothing for that date.
    pub fn resolve(&mut self, date: NaiveDate) -> Result<Option<DateRecord>, AppError> {
        let window = Window::containing(date);
        if self.window != Some(window) {
            self.build_for_window(window, date)?;
        }
        Ok(self.lookup(date).cloned())
    }
}

/// Validate dates, parse the required tenors and compute the derived ones.
pub fn build_records<S: LedgerSource + ?Sized>(
    source: &S,
    entries: Vec<RawEntry>,
) -> Result<HashMap<NaiveDate, DateRecord>, AppError> {
    let suffix = source.date_suffix();
    let mut out = HashMap::with_capacity(entries.len());

    for entry in entries {
        let bare = entry
            .date
            .strip_suffix(suffix)
            .ok_or_else(|| AppError::parse(format!("invalid date format: {}", entry.date)))?;
        let date = parse_iso_date(bare)?;
        if iso_date(date) != bare {
            return Err(AppError::parse(format!("invalid date format: {}", entry.date)));
        }

        let mut record = DateRecord::new(date);
        for &tenor in source.required_tenors() {
            let raw = entry
                .values
                .get(tenor)
                .ok_or_else(|| AppError::parse(format!("missing {tenor} value")).context(bare))?;
            record.insert(TenorValue::parse(tenor, raw).map_err(|e| e.context(bare))?);
        }
        for derived in source.derived_tenors() {
            let lower = record.require(derived.lower)?;
            let upper = record.require(derived.upper)?;
            let value = interpolate(derived.name, lower, upper).map_err(|e| e.context(bare))?;
            record.insert(value);
        }

        out.insert(date, record);
    }
    Ok(out)
}
