//! Calendar helpers.
//!
//! Internally every date is a `chrono::NaiveDate`. The string forms used by the
//! sources and the workbook are kept as explicit serializers:
//!
//! - `YYYY-MM-DD` for ledger keys and cache keys
//! - `D-Mon-YY` for the prime-rate history (`4-May-22`)
//! - `M/D/YYYY` for the date column of ledger sheets

use chrono::{Datelike, NaiveDate};

use crate::error::AppError;

/// The natural fetch granularity of a source: one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Window {
    pub year: i32,
    pub month: u32,
}

impl Window {
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(self) -> NaiveDate {
        let (y, m) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// Zero-padded `YYYYMM`.
    pub fn key(self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_iso_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| AppError::parse(format!("invalid date '{s}': {e}")))
}

/// `M/D/YYYY`, no zero padding.
pub fn sheet_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}

/// `D-Mon-YY`, e.g. `4-May-22`.
pub fn day_month_year(date: NaiveDate) -> String {
    date.format("%-d-%b-%y").to_string()
}

pub fn parse_day_month_year(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s.trim(), "%d-%b-%y")
        .map_err(|e| AppError::parse(format!("invalid history date '{s}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_short_history_dates() {
        assert_eq!(parse_day_month_year("4-May-22").unwrap(), ymd(2022, 5, 4));
        assert_eq!(parse_day_month_year("19-Sep-19").unwrap(), ymd(2019, 9, 19));
        assert!(parse_day_month_year("4-Foo-22").is_err());
    }

    #[test]
    fn formats_external_date_forms() {
        let d = ymd(2022, 5, 4);
        assert_eq!(day_month_year(d), "4-May-22");
        assert_eq!(sheet_date(d), "5/4/2022");
        assert_eq!(iso_date(d), "2022-05-04");
        assert_eq!(parse_iso_date("2022-05-04").unwrap(), d);
    }

    #[test]
    fn window_bounds_and_key() {
        let w = Window::containing(ymd(2024, 2, 17));
        assert_eq!(w.first_day(), ymd(2024, 2, 1));
        assert_eq!(w.last_day(), ymd(2024, 2, 29));
        assert_eq!(w.key(), "202402");

        let dec = Window::containing(ymd(2015, 12, 3));
        assert_eq!(dec.last_day(), ymd(2015, 12, 31));
    }
}
