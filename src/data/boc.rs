//! Bank of Canada benchmark bond yields (Valet API).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::data::http::PageFetcher;
use crate::domain::dates::iso_date;
use crate::domain::{DerivedTenor, Window};
use crate::error::AppError;
use crate::ledger::{LedgerSource, RawEntry};

const BASE_URL: &str = "https://www.bankofcanada.ca/valet/observations/group/bond_yields_all/json";

/// Human-facing page for the same data, used in the sheet header.
pub const INFO_URL: &str = "http://www.banqueducanada.ca/taux/taux-dinteret/obligations-canadiennes/";

pub const AVG_1_TO_3Y: &str = "CDN.AVG.1YTO3Y.AVG";
pub const YLD_2Y: &str = "BD.CDN.2YR.DQ.YLD";
pub const YLD_3Y: &str = "BD.CDN.3YR.DQ.YLD";
pub const YLD_4Y: &str = "BD.CDN.4YR.DERIVED";
pub const YLD_5Y: &str = "BD.CDN.5YR.DQ.YLD";

const REQUIRED: &[&str] = &[AVG_1_TO_3Y, YLD_2Y, YLD_3Y, YLD_5Y];

const DERIVED: &[DerivedTenor] = &[DerivedTenor { name: YLD_4Y, lower: YLD_3Y, upper: YLD_5Y }];

/// Sheet columns after the date, in order. The 1-year column repeats the
/// 2-year yield: the 1-year benchmark was discontinued on 2021-04-20.
pub const SHEET_TENORS: &[&str] = &[AVG_1_TO_3Y, YLD_2Y, YLD_2Y, YLD_3Y, YLD_4Y, YLD_5Y];

pub fn month_url(window: Window) -> String {
    format!(
        "{BASE_URL}?start_date={}&end_date={}",
        iso_date(window.first_day()),
        iso_date(window.last_day())
    )
}

pub struct BocSource<'a, F: PageFetcher> {
    fetcher: &'a F,
}

impl<'a, F: PageFetcher> BocSource<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self { fetcher }
    }
}

impl<F: PageFetcher> LedgerSource for BocSource<'_, F> {
    fn name(&self) -> &'static str {
        "boc"
    }

    fn cache_key(&self, window: Window, _trigger: NaiveDate) -> String {
        window.key()
    }

    fn fetch_window(&self, window: Window) -> Result<Vec<u8>, AppError> {
        let body = self.fetcher.fetch_page(&month_url(window))?;
        Ok(body.into_bytes())
    }

    fn parse_entries(&self, raw: &[u8]) -> Result<Vec<RawEntry>, AppError> {
        let resp: ObservationsResponse = serde_json::from_slice(raw)
            .map_err(|e| AppError::parse(format!("failed to parse Valet response: {e}")))?;

        Ok(resp
            .observations
            .into_iter()
            .map(|obs| RawEntry {
                date: obs.d,
                values: obs
                    .series
                    .into_iter()
                    .filter_map(|(k, v)| {
                        let v = v.v?.trim().to_string();
                        (!v.is_empty()).then_some((k, v))
                    })
                    .collect(),
            })
            .collect())
    }

    /// Valet dates are bare `YYYY-MM-DD`.
    fn date_suffix(&self) -> &'static str {
        ""
    }

    fn required_tenors(&self) -> &'static [&'static str] {
        REQUIRED
    }

    fn derived_tenors(&self) -> &'static [DerivedTenor] {
        DERIVED
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    d: String,
    #[serde(flatten)]
    series: BTreeMap<String, SeriesValue>,
}

#[derive(Debug, Deserialize)]
struct SeriesValue {
    v: Option<String>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::OCT_2014_JSON;
    use super::*;
    use crate::data::http::StaticFetcher;

    #[test]
    fn month_url_spans_the_whole_month() {
        let url = month_url(Window { year: 2016, month: 2 });
        assert!(url.ends_with("?start_date=2016-02-01&end_date=2016-02-29"));
    }

    #[test]
    fn parses_observations_and_drops_blank_values() {
        let fetcher = StaticFetcher::new();
        let source = BocSource::new(&fetcher);
        let entries = source.parse_entries(OCT_2014_JSON.as_bytes()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, "2014-10-24");
        assert_eq!(entries[0].values.get(YLD_3Y).map(String::as_str), Some("1.13"));
        assert!(!entries[1].values.contains_key("BD.CDN.10YR.DQ.YLD"));
    }

    #[test]
    fn cache_key_is_padded_month() {
        let fetcher = StaticFetcher::new();
        let source = BocSource::new(&fetcher);
        let d = NaiveDate::from_ymd_opt(2014, 10, 24).unwrap();
        assert_eq!(source.cache_key(Window::containing(d), d), "201410");
    }

    #[test]
    fn rejects_non_json_payload() {
        let fetcher = StaticFetcher::new();
        let err = BocSource::new(&fetcher).parse_entries(b"<html>").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Parse);
    }
}
