//! Prime-rate snapshot scraping.
//!
//! Two pages each publish today's value only (no history):
//!
//! - the bank page lists the Canadian and US prime rates in an `nbc-table`
//! - the WSJ history page flags the current rate with a marker phrase

use chrono::NaiveDate;

use crate::data::html;
use crate::data::http::PageFetcher;
use crate::domain::{BankPrimeRates, PrimeSnapshot};
use crate::error::AppError;

pub const BANK_URL: &str =
    "https://www.bnc.ca/fr/taux-et-analyses/taux-dinteret-et-rendements/taux-de-base.html";
pub const WSJ_URL: &str = "http://www.fedprimerate.com/wall_street_journal_prime_rate_history.htm";

const BANK_TABLE_CLASS: &str = "nbc-table";
const CANADA_MARKER: &str = "CA";
const WSJ_MARKER: &str = "(The Current U.S. Prime Rate)";

pub struct PrimeRateClient<'a, F: PageFetcher> {
    fetcher: &'a F,
}

impl<'a, F: PageFetcher> PrimeRateClient<'a, F> {
    pub fn new(fetcher: &'a F) -> Self {
        Self { fetcher }
    }

    pub fn fetch_bank_prime_rates(&self) -> Result<BankPrimeRates, AppError> {
        let body = self.fetcher.fetch_page(BANK_URL)?;
        parse_bank_page(&body).map_err(|e| e.context(BANK_URL))
    }

    pub fn fetch_wsj_prime_rate(&self) -> Result<f64, AppError> {
        let body = self.fetcher.fetch_page(WSJ_URL)?;
        parse_wsj_page(&body).map_err(|e| e.context(WSJ_URL))
    }

    pub fn fetch_snapshot(&self, date: NaiveDate) -> Result<PrimeSnapshot, AppError> {
        let bank = self.fetch_bank_prime_rates()?;
        let wsj = self.fetch_wsj_prime_rate()?;
        tracing::info!(%date, wsj, us = bank.us, canada = bank.canada, "fetched prime rates");
        Ok(PrimeSnapshot { date, wsj, bank })
    }
}

/// Classify the bank table rows and read one rate from each.
///
/// Row 0 is the column header. Row 1 is Canada when it carries the `CA`
/// marker; every other row is the US rate.
pub fn parse_bank_page(body: &str) -> Result<BankPrimeRates, AppError> {
    let table = html::table_body_by_class(body, BANK_TABLE_CLASS)
        .ok_or_else(|| AppError::parse(format!("table '.{BANK_TABLE_CLASS}' not found")))?;

    let mut us = None;
    let mut canada = None;
    for (i, row) in html::rows(table).iter().enumerate() {
        if i == 0 {
            continue;
        }
        let rate = leading_number(&row.text)
            .ok_or_else(|| AppError::parse(format!("no rate in row '{}'", row.text)))?;
        if i == 1 && row.text.contains(CANADA_MARKER) {
            canada = Some(rate);
        } else {
            us = Some(rate);
        }
    }

    match (us, canada) {
        (Some(us), Some(canada)) => Ok(BankPrimeRates { us, canada }),
        (us, canada) => Err(AppError::parse(format!(
            "failed to find all rates US: {us:?}, CAN: {canada:?}"
        ))),
    }
}

/// Find the row flagged as the current rate and read its second cell.
pub fn parse_wsj_page(body: &str) -> Result<f64, AppError> {
    let row = html::rows(body)
        .into_iter()
        .find(|r| r.text.contains(WSJ_MARKER))
        .ok_or_else(|| AppError::parse(format!("row containing '{WSJ_MARKER}' not found")))?;

    let cell = row
        .cells
        .get(1)
        .ok_or_else(|| AppError::parse(format!("current-rate row has no second cell: '{}'", row.text)))?;

    let text = cell.replace(WSJ_MARKER, "");
    let text = text.trim().trim_end_matches('%').trim();
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::parse(format!("invalid wsj rate: '{text}'")))
}

/// Parse the first run of digits in `text`, with an optional `.` or `,`
/// decimal part (`"Taux CA 6,95 %"` -> 6.95).
fn leading_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];

    let mut number = String::new();
    let mut seen_sep = false;
    for (i, c) in rest.char_indices() {
        if c.is_ascii_digit() {
            number.push(c);
        } else if (c == '.' || c == ',') && !seen_sep {
            let next_is_digit = rest[i + 1..].starts_with(|n: char| n.is_ascii_digit());
            if !next_is_digit {
                break;
            }
            seen_sep = true;
            number.push('.');
        } else {
            break;
        }
    }
    number.parse::<f64>().ok()
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const BANK_PAGE: &str = r#"<html><body>
<table class="nbc-table">
  <tbody>
    <tr><th>Taux</th><th>Valeur</th></tr>
    <tr><td>Taux de base CA</td><td>3,20 %</td></tr>
    <tr><td>Taux de base US</td><td>4,50 %</td></tr>
  </tbody>
</table></body></html>"#;

    pub const WSJ_PAGE: &str = r#"<table>
<tr><td>Date</td><td>Rate</td></tr>
<tr><td><b>May 5, 2022</b></td><td>4.00% <i>(The Current U.S. Prime Rate)</i></td></tr>
<tr><td>March 17, 2022</td><td>3.50%</td></tr>
</table>"#;
}

#[cfg(test)]
mod tests {
    use super::fixtures::{BANK_PAGE, WSJ_PAGE};
    use super::*;
    use crate::data::http::StaticFetcher;

    #[test]
    fn reads_bank_rates_by_row_classification() {
        let rates = parse_bank_page(BANK_PAGE).unwrap();
        assert_eq!(rates, BankPrimeRates { us: 4.5, canada: 3.2 });
    }

    #[test]
    fn missing_canada_row_is_an_error() {
        let page = BANK_PAGE.replace("Taux de base CA", "Taux de base");
        let err = parse_bank_page(&page).unwrap_err();
        assert!(err.to_string().contains("failed to find all rates"));
    }

    #[test]
    fn missing_bank_table_is_an_error() {
        assert!(parse_bank_page("<html></html>").is_err());
    }

    #[test]
    fn reads_current_wsj_rate() {
        assert_eq!(parse_wsj_page(WSJ_PAGE).unwrap(), 4.0);
    }

    #[test]
    fn wsj_page_without_marker_is_an_error() {
        let page = WSJ_PAGE.replace("(The Current U.S. Prime Rate)", "");
        let err = parse_wsj_page(&page).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Parse);
    }

    #[test]
    fn leading_number_handles_both_separators() {
        assert_eq!(leading_number("Taux 6,95 %"), Some(6.95));
        assert_eq!(leading_number("rate: 8.5%"), Some(8.5));
        assert_eq!(leading_number("7. end"), Some(7.0));
        assert_eq!(leading_number("none"), None);
    }

    #[test]
    fn snapshot_combines_both_pages() {
        let fetcher = StaticFetcher::new()
            .with_page(BANK_URL, BANK_PAGE)
            .with_page(WSJ_URL, WSJ_PAGE);
        let date = NaiveDate::from_ymd_opt(2022, 5, 30).unwrap();
        let snap = PrimeRateClient::new(&fetcher).fetch_snapshot(date).unwrap();
        assert_eq!(snap.wsj, 4.0);
        assert_eq!(snap.bank.canada, 3.2);
        assert_eq!(snap.bank.us, 4.5);
        assert_eq!(snap.date, date);
    }

    #[test]
    fn transport_failure_is_surfaced() {
        let fetcher = StaticFetcher::new().with_page(BANK_URL, BANK_PAGE);
        let err = PrimeRateClient::new(&fetcher).fetch_wsj_prime_rate().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Transport);
    }
}
