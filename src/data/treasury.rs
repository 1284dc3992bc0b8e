//! US Treasury daily par yield curve.
//!
//! The Treasury publishes one XML feed per month. The feed is converted to JSON
//! before caching; parsing works on that JSON.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::data::http::PageFetcher;
use crate::data::xml;
use crate::domain::dates::iso_date;
use crate::domain::{DerivedTenor, Window};
use crate::error::AppError;
use crate::ledger::{LedgerSource, RawEntry};

const BASE_URL: &str = "https://home.treasury.gov/resource-center/data-chart-center/interest-rates/pages/xml?data=daily_treasury_yield_curve&field_tdr_date_value_month=";

/// Human-facing page for the same data, used in the sheet header.
pub const TEXT_VIEW_URL: &str = "https://home.treasury.gov/resource-center/data-chart-center/interest-rates/TextView?type=daily_treasury_yield_curve&field_tdr_date_value_month=";

const DATE_FIELD: &str = "NEW_DATE";
const DATE_SUFFIX: &str = "T00:00:00";

pub const BC_3MONTH: &str = "BC_3MONTH";
pub const BC_1YEAR: &str = "BC_1YEAR";
pub const BC_2YEAR: &str = "BC_2YEAR";
pub const BC_3YEAR: &str = "BC_3YEAR";
pub const BC_4YEAR: &str = "BC_4YEAR";
pub const BC_5YEAR: &str = "BC_5YEAR";
pub const BC_6YEAR: &str = "BC_6YEAR";
pub const BC_7YEAR: &str = "BC_7YEAR";
pub const BC_8YEAR: &str = "BC_8YEAR";
pub const BC_10YEAR: &str = "BC_10YEAR";

const REQUIRED: &[&str] = &[BC_3MONTH, BC_1YEAR, BC_2YEAR, BC_3YEAR, BC_5YEAR, BC_7YEAR, BC_10YEAR];

const DERIVED: &[DerivedTenor] = &[
    DerivedTenor { name: BC_4YEAR, lower: BC_3YEAR, upper: BC_5YEAR },
    DerivedTenor { name: BC_6YEAR, lower: BC_5YEAR, upper: BC_7YEAR },
    DerivedTenor { name: BC_8YEAR, lower: BC_7YEAR, upper: BC_10YEAR },
];

/// Sheet columns after the date, in order.
pub const SHEET_TENORS: &[&str] = &[
    BC_1YEAR, BC_2YEAR, BC_3YEAR, BC_4YEAR, BC_5YEAR, BC_6YEAR, BC_7YEAR, BC_8YEAR, BC_10YEAR,
];

pub fn month_url(window: Window) -> String {
    format!("{BASE_URL}{}", window.key())
}

pub struct TreasurySource<'a, F: PageFetcher> {
    fetcher: &'a F,
}

impl<'a, F: PageFetcher> TreasurySource<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self { fetcher }
    }
}

impl<F: PageFetcher> LedgerSource for TreasurySource<'_, F> {
    fn name(&self) -> &'static str {
        "treasury"
    }

    /// Keyed by the date that triggered the load, not the month.
    fn cache_key(&self, _window: Window, trigger: NaiveDate) -> String {
        iso_date(trigger)
    }

    fn fetch_window(&self, window: Window) -> Result<Vec<u8>, AppError> {
        let url = month_url(window);
        let body = self.fetcher.fetch_page(&url)?;
        xml::xml_to_json_bytes(&body).map_err(|e| e.context(&url))
    }

    fn parse_entries(&self, raw: &[u8]) -> Result<Vec<RawEntry>, AppError> {
        parse_feed_json(raw)
    }

    fn date_suffix(&self) -> &'static str {
        DATE_SUFFIX
    }

    fn required_tenors(&self) -> &'static [&'static str] {
        REQUIRED
    }

    fn derived_tenors(&self) -> &'static [DerivedTenor] {
        DERIVED
    }
}

#[derive(Debug, Deserialize)]
struct FeedDocument {
    feed: Feed,
}

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(default)]
    entry: OneOrMany<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    content: Content,
}

#[derive(Debug, Deserialize)]
struct Content {
    properties: BTreeMap<String, XmlValue>,
}

/// A converted XML element: bare text, or an object with attributes and
/// optional `#content` (absent for `m:null="true"` fields).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum XmlValue {
    Text(String),
    Node {
        #[serde(rename = "#content")]
        content: Option<String>,
    },
}

impl XmlValue {
    fn text(&self) -> Option<&str> {
        let s = match self {
            XmlValue::Text(s) => s.as_str(),
            XmlValue::Node { content } => content.as_deref()?,
        };
        let s = s.trim();
        if s.is_empty() { None } else { Some(s) }
    }
}

/// A single repeated XML element converts to an object rather than an array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(t) => vec![t],
        }
    }
}

fn parse_feed_json(raw: &[u8]) -> Result<Vec<RawEntry>, AppError> {
    let doc: FeedDocument = serde_json::from_slice(raw)
        .map_err(|e| AppError::parse(format!("failed to parse treasury feed: {e}")))?;

    let mut out = Vec::new();
    for entry in doc.feed.entry.into_vec() {
        let props = entry.content.properties;
        let date = props
            .get(DATE_FIELD)
            .and_then(XmlValue::text)
            .ok_or_else(|| AppError::parse(format!("treasury entry without {DATE_FIELD}")))?
            .to_string();

        let values = props
            .iter()
            .filter(|(k, _)| k.as_str() != DATE_FIELD)
            .filter_map(|(k, v)| v.text().map(|t| (k.clone(), t.to_string())))
            .collect();
        out.push(RawEntry { date, values });
    }
    Ok(out)
}


#[cfg(test)]
mod tests {
    use super::fixtures::FEB_2022_XML;
    use super::*;
    use crate::data::http::StaticFetcher;

    fn feb() -> Window {
        Window { year: 2022, month: 2 }
    }

    #[test]
    fn month_url_uses_padded_month() {
        assert!(month_url(feb()).ends_with("field_tdr_date_value_month=202202"));
    }

    #[test]
    fn fetch_converts_xml_feed_to_json_entries() {
        let fetcher = StaticFetcher::new().with_page(month_url(feb()), FEB_2022_XML);
        let source = TreasurySource::new(&fetcher);

        let raw = source.fetch_window(feb()).unwrap();
        let entries = source.parse_entries(&raw).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].date, "2022-02-01T00:00:00");
        assert_eq!(entries[0].values.get(BC_2YEAR).map(String::as_str), Some("1.18"));
        assert!(!entries[0].values.contains_key("BC_30YEARDISPLAY"));
        assert_eq!(entries[2].values.get(BC_10YEAR).map(String::as_str), Some("1.97"));
    }

    #[test]
    fn single_entry_feed_is_accepted() {
        let raw = br##"{"feed":{"entry":{"content":{"properties":{"NEW_DATE":{"#content":"2022-03-01T00:00:00"},"BC_1YEAR":"1.01"}}}}}"##;
        let entries = parse_feed_json(raw).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].values.get(BC_1YEAR).map(String::as_str), Some("1.01"));
    }

    #[test]
    fn feed_without_entries_is_empty() {
        let entries = parse_feed_json(br#"{"feed":{"title":"x"}}"#).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn cache_key_is_trigger_date() {
        let fetcher = StaticFetcher::new();
        let source = TreasurySource::new(&fetcher);
        let trigger = NaiveDate::from_ymd_opt(2015, 6, 19).unwrap();
        assert_eq!(source.cache_key(Window::containing(trigger), trigger), "2015-06-19");
    }
}
