//! Day-by-day walk from a start date to today.
//!
//! Every calendar day gets exactly one row, whether or not the source
//! published anything for it. Weekends and holidays become `n/a` rows.

use chrono::NaiveDate;

use crate::domain::DateRecord;
use crate::domain::dates::sheet_date;
use crate::error::AppError;
use crate::report::format::rate_fraction;

/// Marker written to every data column of a day without an observation.
pub const NOT_AVAILABLE: &str = "n/a";

/// One output row: the date and one formatted cell per configured tenor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRow {
    pub date: NaiveDate,
    pub cells: Vec<String>,
}

impl DayRow {
    /// The date column as shown in the sheet (`M/D/YYYY`).
    pub fn date_cell(&self) -> String {
        sheet_date(self.date)
    }

    pub fn is_available(&self) -> bool {
        !self.cells.iter().all(|c| c == NOT_AVAILABLE)
    }

    /// Date cell followed by the data cells.
    pub fn to_sheet_row(&self) -> Vec<String> {
        let mut row = Vec::with_capacity(self.cells.len() + 1);
        row.push(self.date_cell());
        row.extend(self.cells.iter().cloned());
        row
    }
}

/// Iterator over `[start, end)`. Yields the first resolve error and then stops.
pub struct DayWalk<'c, R> {
    next: Option<NaiveDate>,
    end: NaiveDate,
    columns: &'c [&'c str],
    resolve: R,
}

/// Walk every day in `[start, end)`, resolving each through `resolve`.
///
/// `resolve` returns `Ok(None)` for days without an observation. The walk is
/// single-use: iterating again means calling `walk_days` again.
pub fn walk_days<'c, R>(start: NaiveDate, end: NaiveDate, columns: &'c [&'c str], resolve: R) -> DayWalk<'c, R>
where
    R: FnMut(NaiveDate) -> Result<Option<DateRecord>, AppError>,
{
    DayWalk {
        next: (start < end).then_some(start),
        end,
        columns,
        resolve,
    }
}

impl<R> DayWalk<'_, R>
where
    R: FnMut(NaiveDate) -> Result<Option<DateRecord>, AppError>,
{
    fn row_for(&mut self, date: NaiveDate) -> Result<DayRow, AppError> {
        let cells = match (self.resolve)(date).map_err(|e| e.context(date))? {
            None => vec![NOT_AVAILABLE.to_string(); self.columns.len()],
            Some(record) => self
                .columns
                .iter()
                .map(|&tenor| record.require(tenor).map(|v| rate_fraction(v.numeric_value)))
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(DayRow { date, cells })
    }
}

impl<R> Iterator for DayWalk<'_, R>
where
    R: FnMut(NaiveDate) -> Result<Option<DateRecord>, AppError>,
{
    type Item = Result<DayRow, AppError>;

    fn next(&mut self) -> Option<Self::Item> {
        let date = self.next?;
        self.next = date.succ_opt().filter(|d| *d < self.end);

        let row = self.row_for(date);
        if row.is_err() {
            self.next = None;
        }
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next {
            Some(d) => {
                let n = (self.end - d).num_days().max(0) as usize;
                (0, Some(n))
            }
            None => (0, Some(0)),
        }
    }
}
