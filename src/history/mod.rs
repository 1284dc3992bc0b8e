//! Rolling prime-rate history and its diff-and-shift update cycle.
//!
//! The prime sheet keeps a short table per rate series. Each series occupies a
//! column group (a date column and a value column) and the groups move
//! independently: a group only shifts when its newest observation differs from
//! the last confirmed one, so rows of different groups drift apart over time.
//!
//! Layout:
//!
//! ```text
//! row 5 .. row 9    older history (row 5 oldest)
//! row 10            confirmed (last stored observation)
//! row 11            pending (today's snapshot, removed by the cycle)
//! ```

use crate::domain::dates::{day_month_year, parse_day_month_year};
use crate::domain::{HistoryRow, PrimeSnapshot};
use crate::error::AppError;
use crate::io::workbook::Grid;
use crate::report::percent;

pub const PRIME_SHEET: &str = "Wall St Prime";

/// Which snapshot value feeds a column group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    WallStreet,
    BankUs,
    BankCanada,
}

impl Series {
    pub fn value(self, snapshot: &PrimeSnapshot) -> f64 {
        match self {
            Series::WallStreet => snapshot.wsj,
            Series::BankUs => snapshot.bank.us,
            Series::BankCanada => snapshot.bank.canada,
        }
    }
}

/// Two adjacent columns holding one series' history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnGroup {
    pub name: &'static str,
    pub series: Series,
    pub date_column: &'static str,
    pub value_column: &'static str,
}

pub const WALL_STREET: ColumnGroup = ColumnGroup {
    name: "Wall St Prime",
    series: Series::WallStreet,
    date_column: "A",
    value_column: "B",
};

pub const PRIME_US: ColumnGroup = ColumnGroup {
    name: "Prime US",
    series: Series::BankUs,
    date_column: "G",
    value_column: "H",
};

pub const PRIME_CAN: ColumnGroup = ColumnGroup {
    name: "Prime CAN",
    series: Series::BankCanada,
    date_column: "J",
    value_column: "K",
};

#[derive(Debug, Clone, Copy)]
pub struct HistoryLayout {
    pub sheet: &'static str,
    /// Oldest visible row.
    pub first_row: usize,
    /// Row holding today's not-yet-folded observation.
    pub pending_row: usize,
    pub groups: &'static [ColumnGroup],
}

impl HistoryLayout {
    pub const fn prime() -> Self {
        Self {
            sheet: PRIME_SHEET,
            first_row: 5,
            pending_row: 11,
            groups: &[WALL_STREET, PRIME_US, PRIME_CAN],
        }
    }

    pub fn confirmed_row(&self) -> usize {
        self.pending_row - 1
    }

    /// Visible history rows, oldest first (`first_row..=confirmed_row`).
    pub fn visible_rows(&self) -> std::ops::RangeInclusive<usize> {
        self.first_row..=self.confirmed_row()
    }
}

/// Known history as of 2022-05, oldest first, one entry per visible row.
pub const WALL_STREET_SEED: [(&str, &str); 6] = [
    ("19-Sep-19", "5.00%"),
    ("31-Oct-19", "4.75%"),
    ("4-Mar-20", "4.25%"),
    ("16-Mar-20", "3.25%"),
    ("17-Mar-22", "3.50%"),
    ("4-May-22", "4.00%"),
];

pub const PRIME_US_SEED: [(&str, &str); 6] = [
    ("20-Sep-19", "5.50%"),
    ("1-Nov-19", "5.25%"),
    ("6-Mar-20", "4.75%"),
    ("17-Mar-20", "3.75%"),
    ("17-Mar-22", "4.00%"),
    ("5-May-22", "4.50%"),
];

pub const PRIME_CAN_SEED: [(&str, &str); 6] = [
    ("25-Oct-18", "3.95%"),
    ("6-Mar-20", "3.45%"),
    ("17-Mar-20", "2.95%"),
    ("31-Mar-20", "2.45%"),
    ("3-Mar-22", "2.70%"),
    ("14-Mar-22", "3.20%"),
];

fn seed_for(series: Series) -> &'static [(&'static str, &'static str); 6] {
    match series {
        Series::WallStreet => &WALL_STREET_SEED,
        Series::BankUs => &PRIME_US_SEED,
        Series::BankCanada => &PRIME_CAN_SEED,
    }
}

pub fn read_row<G: Grid + ?Sized>(
    grid: &G,
    layout: &HistoryLayout,
    group: &ColumnGroup,
    row: usize,
) -> Result<HistoryRow, AppError> {
    Ok(HistoryRow {
        effective_date: grid.get_cell(layout.sheet, row, group.date_column)?,
        value: grid.get_cell(layout.sheet, row, group.value_column)?,
    })
}

pub fn write_row<G: Grid + ?Sized>(
    grid: &mut G,
    layout: &HistoryLayout,
    group: &ColumnGroup,
    row: usize,
    entry: &HistoryRow,
) -> Result<(), AppError> {
    grid.set_cell(layout.sheet, row, group.date_column, &entry.effective_date)?;
    grid.set_cell(layout.sheet, row, group.value_column, &entry.value)
}

/// The visible history of one group, oldest first.
pub fn group_history<G: Grid + ?Sized>(
    grid: &G,
    layout: &HistoryLayout,
    group: &ColumnGroup,
) -> Result<Vec<HistoryRow>, AppError> {
    layout
        .visible_rows()
        .map(|row| read_row(grid, layout, group, row))
        .collect()
}

/// Fill the visible rows of every group with the known history.
pub fn write_seed<G: Grid + ?Sized>(grid: &mut G, layout: &HistoryLayout) -> Result<(), AppError> {
    for group in layout.groups {
        for (row, (date, value)) in layout.visible_rows().zip(seed_for(group.series)) {
            write_row(grid, layout, group, row, &HistoryRow::new(*date, *value))?;
        }
    }
    Ok(())
}

/// Write today's snapshot into the pending row of every group.
pub fn write_pending<G: Grid + ?Sized>(
    grid: &mut G,
    layout: &HistoryLayout,
    snapshot: &PrimeSnapshot,
) -> Result<(), AppError> {
    let date = day_month_year(snapshot.date);
    for group in layout.groups {
        let entry = HistoryRow::new(date.clone(), percent(group.series.value(snapshot)));
        write_row(grid, layout, group, layout.pending_row, &entry)?;
    }
    Ok(())
}

/// Run one diff-and-shift cycle and return the names of the groups that moved.
///
/// Every group whose pending value differs from its confirmed value is moved
/// up one row; the pending row is then removed for all groups. The first cell
/// error aborts the cycle. Groups already shifted stay shifted.
pub fn run_shift_cycle<G: Grid + ?Sized>(
    grid: &mut G,
    layout: &HistoryLayout,
) -> Result<Vec<&'static str>, AppError> {
    let mut rows = Vec::with_capacity(layout.groups.len());
    for group in layout.groups {
        let confirmed = read_row(grid, layout, group, layout.confirmed_row())?;
        let pending = read_row(grid, layout, group, layout.pending_row)?;
        if pending.value.is_empty() {
            return Err(AppError::cell(format!(
                "{}: pending row {} is empty",
                group.name, layout.pending_row
            )));
        }
        rows.push((group, confirmed, pending));
    }

    let mut shifted = Vec::new();
    for (group, confirmed, pending) in rows {
        if pending.value == confirmed.value {
            tracing::debug!(group = group.name, value = %pending.value, "unchanged");
            continue;
        }

        if let (Ok(prev), Ok(next)) = (
            parse_day_month_year(&confirmed.effective_date),
            parse_day_month_year(&pending.effective_date),
        ) {
            if next < prev {
                tracing::warn!(group = group.name, %prev, %next, "pending observation predates confirmed row");
            }
        }
        tracing::info!(
            group = group.name,
            from = %confirmed.value,
            to = %pending.value,
            since = %pending.effective_date,
            "rate changed, shifting history"
        );
        shift_group(grid, layout, group).map_err(|e| e.context(group.name))?;
        shifted.push(group.name);
    }

    grid.remove_row(layout.sheet, layout.pending_row)?;
    Ok(shifted)
}

/// Move both columns of `group` up one row over `first_row..=pending_row`.
fn shift_group<G: Grid + ?Sized>(grid: &mut G, layout: &HistoryLayout, group: &ColumnGroup) -> Result<(), AppError> {
    for column in [group.date_column, group.value_column] {
        for row in layout.first_row..layout.pending_row {
            let below = grid.get_cell(layout.sheet, row + 1, column)?;
            grid.set_cell(layout.sheet, row, column, &below)?;
        }
    }
    Ok(())
}
