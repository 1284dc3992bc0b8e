//! Shared run logic used by every subcommand.
//!
//! build:  BoC ledger walk -> OEC sheet, Treasury ledger walk -> US sheet,
//!         seeded prime history -> prime sheet, then save
//! update: open saved workbook -> today's prime snapshot -> shift cycle -> save
//!
//! Nothing is saved when a step fails, so the output directory only ever
//! holds a complete workbook.

use chrono::NaiveDate;

use crate::data::boc::{self, BocSource};
use crate::data::treasury::{self, TreasurySource};
use crate::data::{PageFetcher, PrimeRateClient};
use crate::domain::{PrimeSnapshot, RunConfig};
use crate::error::AppError;
use crate::history::{self, HistoryLayout};
use crate::io::workbook::{Grid, Workbook};
use crate::ledger::{LedgerSource, SourceLedger, walk_days};
use crate::report::format;

pub const BOC_SHEET: &str = "OEC";
pub const TREASURY_SHEET: &str = "US Tresory";

/// Row holding the column labels of a ledger sheet; data starts below it.
pub const LABEL_ROW: usize = 5;

/// Row counts of one written ledger sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSummary {
    pub name: &'static str,
    pub first_day: NaiveDate,
    pub days: usize,
    /// Days the source published data for.
    pub available: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    pub sheets: Vec<SheetSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutput {
    pub snapshot: PrimeSnapshot,
    /// Column groups that received a new history row.
    pub shifted: Vec<&'static str>,
}

/// Fixed parts of one ledger sheet.
struct LedgerSheet<'a> {
    name: &'static str,
    header: Vec<String>,
    labels: &'a [&'a str],
    columns: &'a [&'a str],
    start: NaiveDate,
}

/// Build every sheet in memory. Nothing touches the output directory.
pub fn build_workbook<F: PageFetcher>(config: &RunConfig, fetcher: &F) -> Result<(Workbook, BuildOutput), AppError> {
    let mut book = Workbook::new();
    let mut sheets = Vec::with_capacity(2);

    let mut boc_ledger = SourceLedger::new(BocSource::new(fetcher), &config.cache_dir);
    let oec = LedgerSheet {
        name: BOC_SHEET,
        header: format::boc_header(),
        labels: format::BOC_LABELS,
        columns: boc::SHEET_TENORS,
        start: config.boc_start,
    };
    sheets.push(write_ledger_sheet(&mut book, &oec, &mut boc_ledger, config.today)?);

    let mut treasury_ledger = SourceLedger::new(TreasurySource::new(fetcher), &config.cache_dir);
    let us = LedgerSheet {
        name: TREASURY_SHEET,
        header: format::treasury_header(config.today),
        labels: format::TREASURY_LABELS,
        columns: treasury::SHEET_TENORS,
        start: config.treasury_start,
    };
    sheets.push(write_ledger_sheet(&mut book, &us, &mut treasury_ledger, config.today)?);

    write_prime_sheet(&mut book, &HistoryLayout::prime())?;

    Ok((book, BuildOutput { sheets }))
}

/// Build the workbook and save it to `config.output`.
pub fn run_build<F: PageFetcher>(config: &RunConfig, fetcher: &F) -> Result<BuildOutput, AppError> {
    let (book, output) = build_workbook(config, fetcher)?;
    book.save_as(&config.output)?;
    Ok(output)
}

/// Fold today's prime rates into the saved workbook.
pub fn run_update<F: PageFetcher>(config: &RunConfig, fetcher: &F) -> Result<UpdateOutput, AppError> {
    let mut book = Workbook::open(&config.output)?;
    let snapshot = PrimeRateClient::new(fetcher).fetch_snapshot(config.today)?;
    let shifted = apply_snapshot(&mut book, &HistoryLayout::prime(), &snapshot)?;
    book.save_as(&config.output)?;
    Ok(UpdateOutput { snapshot, shifted })
}

/// Write `snapshot` as the pending row and run one shift cycle.
pub fn apply_snapshot<G: Grid + ?Sized>(
    grid: &mut G,
    layout: &HistoryLayout,
    snapshot: &PrimeSnapshot,
) -> Result<Vec<&'static str>, AppError> {
    history::write_pending(grid, layout, snapshot)?;
    history::run_shift_cycle(grid, layout).map_err(|e| e.context("shift cycle"))
}

fn write_ledger_sheet<S: LedgerSource>(
    book: &mut Workbook,
    sheet: &LedgerSheet<'_>,
    ledger: &mut SourceLedger<S>,
    today: NaiveDate,
) -> Result<SheetSummary, AppError> {
    book.new_sheet(sheet.name)?;
    for (i, line) in sheet.header.iter().enumerate() {
        book.set_cell(sheet.name, i + 1, "A", line)?;
    }
    book.set_row(sheet.name, LABEL_ROW, sheet.labels)?;

    let mut days = 0;
    let mut available = 0;
    for row in walk_days(sheet.start, today, sheet.columns, |date| ledger.resolve(date)) {
        let row = row.map_err(|e| e.context(sheet.name))?;
        book.set_row(sheet.name, LABEL_ROW + 1 + days, &row.to_sheet_row())?;
        days += 1;
        if row.is_available() {
            available += 1;
        }
    }

    tracing::info!(sheet = sheet.name, days, available, "sheet written");
    Ok(SheetSummary {
        name: sheet.name,
        first_day: sheet.start,
        days,
        available,
    })
}

fn write_prime_sheet(book: &mut Workbook, layout: &HistoryLayout) -> Result<(), AppError> {
    book.new_sheet(layout.sheet)?;
    for (row, column, text) in format::prime_titles() {
        book.set_cell(layout.sheet, row, column, text)?;
    }
    history::write_seed(book, layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::http::StaticFetcher;
    use crate::data::prime::{self, fixtures::{BANK_PAGE, WSJ_PAGE}};
    use crate::domain::Window;
    use crate::error::ErrorKind;
    use crate::history::{PRIME_CAN, PRIME_SHEET, PRIME_US, WALL_STREET};
    use std::path::Path;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn config(root: &Path) -> RunConfig {
        RunConfig {
            output: root.join("ledger"),
            cache_dir: root.join("cache"),
            boc_start: ymd(2014, 10, 24),
            treasury_start: ymd(2014, 10, 24),
            today: ymd(2014, 10, 28),
            http_timeout_secs: 5,
        }
    }

    fn fetcher() -> StaticFetcher {
        let oct = Window { year: 2014, month: 10 };
        StaticFetcher::new()
            .with_page(boc::month_url(oct), boc::fixtures::OCT_2014_JSON)
            .with_page(treasury::month_url(oct), EMPTY_FEED)
            .with_page(prime::BANK_URL, BANK_PAGE)
            .with_page(prime::WSJ_URL, WSJ_PAGE)
    }

    const EMPTY_FEED: &str = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>none</title></feed>"#;

    #[test]
    fn build_writes_headers_labels_and_one_row_per_day() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let (book, output) = build_workbook(&cfg, &fetcher()).unwrap();

        assert_eq!(book.sheet_names(), vec![BOC_SHEET, TREASURY_SHEET, PRIME_SHEET]);
        assert_eq!(book.get_cell(BOC_SHEET, 2, "A").unwrap(), boc::INFO_URL);
        assert_eq!(book.get_cell(BOC_SHEET, 5, "A").unwrap(), "Taux en date du:");

        // 10/24 (Fri), 10/25, 10/26, 10/27 (Mon); today excluded.
        assert_eq!(book.get_cell(BOC_SHEET, 6, "A").unwrap(), "10/24/2014");
        assert_eq!(book.get_cell(BOC_SHEET, 6, "B").unwrap(), "0.0105");
        assert_eq!(book.get_cell(BOC_SHEET, 6, "C").unwrap(), "0.0104");
        assert_eq!(book.get_cell(BOC_SHEET, 6, "D").unwrap(), "0.0104");
        assert_eq!(book.get_cell(BOC_SHEET, 6, "F").unwrap(), "0.0128");
        assert_eq!(book.get_cell(BOC_SHEET, 7, "B").unwrap(), "n/a");
        assert_eq!(book.get_cell(BOC_SHEET, 9, "A").unwrap(), "10/27/2014");
        assert_eq!(book.get_cell(BOC_SHEET, 10, "A").unwrap(), "");

        assert_eq!(
            output.sheets[0],
            SheetSummary { name: BOC_SHEET, first_day: ymd(2014, 10, 24), days: 4, available: 2 }
        );
        assert_eq!(output.sheets[1].available, 0);
        assert_eq!(book.get_cell(TREASURY_SHEET, 5, "J").unwrap(), "10 ans");
        assert_eq!(book.get_cell(TREASURY_SHEET, 6, "J").unwrap(), "n/a");

        assert_eq!(book.get_cell(PRIME_SHEET, 1, "A").unwrap(), "Wall Street #45");
        assert_eq!(book.get_cell(PRIME_SHEET, 10, "B").unwrap(), "4.00%");
    }

    #[test]
    fn failed_fetch_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let only_boc = StaticFetcher::new().with_page(
            boc::month_url(Window { year: 2014, month: 10 }),
            boc::fixtures::OCT_2014_JSON,
        );

        let err = run_build(&cfg, &only_boc).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_string().starts_with(TREASURY_SHEET));
        assert!(!cfg.output.exists());
    }

    #[test]
    fn build_then_update_folds_todays_rates() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let fetcher = fetcher();
        run_build(&cfg, &fetcher).unwrap();

        // Bank page: US 4.50% and CAN 3.20% repeat; WSJ 4.00% repeats.
        let update = run_update(&cfg, &fetcher).unwrap();
        assert!(update.shifted.is_empty());

        let changed = StaticFetcher::new()
            .with_page(prime::BANK_URL, BANK_PAGE.replace("3,20", "3,70"))
            .with_page(prime::WSJ_URL, WSJ_PAGE);
        let update = run_update(&cfg, &changed).unwrap();
        assert_eq!(update.shifted, vec![PRIME_CAN.name]);

        let saved = Workbook::open(&cfg.output).unwrap();
        let layout = HistoryLayout::prime();
        let can = history::group_history(&saved, &layout, &PRIME_CAN).unwrap();
        assert_eq!(can[5].effective_date, "28-Oct-14");
        assert_eq!(can[5].value, "3.70%");
        assert_eq!(can[0].effective_date, "6-Mar-20");
        let us = history::group_history(&saved, &layout, &PRIME_US).unwrap();
        assert_eq!(us[5].value, "4.50%");
        let wsj = history::group_history(&saved, &layout, &WALL_STREET).unwrap();
        assert_eq!(wsj[0].effective_date, "19-Sep-19");

        // Ledger sheets survive the round trip through disk.
        assert_eq!(saved.get_cell(BOC_SHEET, 6, "F").unwrap(), "0.0128");
    }

    #[test]
    fn update_without_a_saved_workbook_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_update(&config(dir.path()), &fetcher()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Output);
    }

    #[test]
    fn failed_snapshot_leaves_saved_workbook_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        run_build(&cfg, &fetcher()).unwrap();
        let before = Workbook::open(&cfg.output).unwrap();

        let no_wsj = StaticFetcher::new().with_page(prime::BANK_URL, BANK_PAGE);
        assert!(run_update(&cfg, &no_wsj).is_err());
        assert_eq!(Workbook::open(&cfg.output).unwrap(), before);
    }
}
