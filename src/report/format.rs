//! Cell formatting and fixed sheet text.
//!
//! We keep formatting code in one place so the ledger and history code never
//! deal with display strings beyond passing them through.

use chrono::NaiveDate;

use crate::app::pipeline::{BuildOutput, UpdateOutput};
use crate::data::{boc, prime, treasury};
use crate::domain::{RunConfig, Window};

/// Rate in percent → fraction with four decimals (`1.18` → `"0.0118"`).
pub fn rate_fraction(percent: f64) -> String {
    format!("{:.4}", percent / 100.0)
}

/// Two-decimal percentage display, truncated (`3.45565` → `"3.45%"`).
///
/// The small epsilon keeps values such as `2.7`, stored as `2.69999…`, from
/// dropping a cent.
pub fn percent(rate: f64) -> String {
    let cents = (rate * 100.0 + rate.signum() * 1e-6).trunc();
    format!("{:.2}%", cents / 100.0)
}

/// Header lines of the Bank of Canada sheet (column A, from row 1).
pub fn boc_header() -> Vec<String> {
    vec![
        "Historique taux des obligations".to_string(),
        boc::INFO_URL.to_string(),
        "** À partir du 20/04/2021,Taux 1 an = taux 2 ans".to_string(),
    ]
}

pub const BOC_LABELS: &[&str] = &[
    "Taux en date du:",
    "1 a 3 ans",
    "1 an",
    "2 ans",
    "3 ans",
    "4 ans",
    "5 ans",
];

/// Header lines of the US Treasury sheet; the link points at `today`'s month.
pub fn treasury_header(today: NaiveDate) -> Vec<String> {
    vec![
        "Historique taux des obligations".to_string(),
        String::new(),
        format!("{}{}", treasury::TEXT_VIEW_URL, Window::containing(today).key()),
    ]
}

pub const TREASURY_LABELS: &[&str] = &[
    "Date", "1 an", "2 ans", "3 ans", "4 ans", "5 ans", "6 ans", "7 ans", "8 ans", "10 ans",
];

/// Fixed title cells of the prime-rate sheet: `(row, column, text)`.
pub fn prime_titles() -> Vec<(usize, &'static str, &'static str)> {
    vec![
        (1, "A", "Wall Street #45"),
        (1, "B", "https://www.wsj.com/market-data/bonds"),
        (1, "G", "Prime US BNC(#3)"),
        (1, "J", "Prime CAN BNC (#2)"),
        (2, "A", prime::WSJ_URL),
        (2, "G", prime::BANK_URL),
    ]
}

/// Terminal summary of a `build` run.
pub fn format_build_summary(output: &BuildOutput, config: &RunConfig) -> String {
    let mut out = String::new();
    out.push_str("=== rate-ledger build ===\n");
    out.push_str(&format!("Output: {}\n", config.output.display()));
    out.push_str(&format!("Through: {} (exclusive)\n", config.today));
    for sheet in &output.sheets {
        out.push_str(&format!(
            "  {:<12} from {}  days={:<6} with data={}\n",
            sheet.name, sheet.first_day, sheet.days, sheet.available
        ));
    }
    out
}

/// Terminal summary of an `update` run.
pub fn format_update_summary(output: &UpdateOutput) -> String {
    let snap = &output.snapshot;
    let mut out = String::new();
    out.push_str(&format!("=== prime rates {} ===\n", snap.date));
    out.push_str(&format!(
        "WSJ {}  US {}  CAN {}\n",
        percent(snap.wsj),
        percent(snap.bank.us),
        percent(snap.bank.canada)
    ));
    if output.shifted.is_empty() {
        out.push_str("No change; history untouched.\n");
    } else {
        out.push_str(&format!("New history row: {}\n", output.shifted.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_truncates_to_two_decimals() {
        assert_eq!(percent(3.45565), "3.45%");
        assert_eq!(percent(4.5), "4.50%");
        assert_eq!(percent(2.7), "2.70%");
        assert_eq!(percent(0.29), "0.29%");
        assert_eq!(percent(3.999), "3.99%");
    }

    #[test]
    fn rate_fraction_uses_four_decimals() {
        assert_eq!(rate_fraction(1.18), "0.0118");
        assert_eq!(rate_fraction(0.03), "0.0003");
        assert_eq!(rate_fraction(5.0), "0.0500");
    }

    #[test]
    fn update_summary_names_shifted_groups() {
        use crate::domain::{BankPrimeRates, PrimeSnapshot};

        let output = UpdateOutput {
            snapshot: PrimeSnapshot {
                date: NaiveDate::from_ymd_opt(2022, 6, 16).unwrap(),
                wsj: 4.75,
                bank: BankPrimeRates { us: 4.5, canada: 3.2 },
            },
            shifted: vec!["Wall St Prime"],
        };
        let text = format_update_summary(&output);
        assert!(text.contains("WSJ 4.75%  US 4.50%  CAN 3.20%"));
        assert!(text.contains("New history row: Wall St Prime"));
    }

    #[test]
    fn treasury_header_links_current_month() {
        let today = NaiveDate::from_ymd_opt(2022, 5, 30).unwrap();
        assert!(treasury_header(today)[2].ends_with("field_tdr_date_value_month=202205"));
    }
}
