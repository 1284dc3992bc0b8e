//! Minimal workbook: named sheets of string cells addressed by row and column
//! letter, saved as a directory with one CSV file per sheet.
//!
//! Rows are 1-based and columns are spreadsheet letters (`A`, `B`, ... `AA`),
//! so code reads the same as it would against a real spreadsheet.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// The cell-level capability the history shifter needs.
pub trait Grid {
    /// Value at `(sheet, row, column)`; empty string for a blank cell.
    fn get_cell(&self, sheet: &str, row: usize, column: &str) -> Result<String, AppError>;

    fn set_cell(&mut self, sheet: &str, row: usize, column: &str, value: &str) -> Result<(), AppError>;

    /// Delete `row`, moving every row below it up by one.
    fn remove_row(&mut self, sheet: &str, row: usize) -> Result<(), AppError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Sheet {
    name: String,
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

/// `A` → 0, `Z` → 25, `AA` → 26.
pub fn column_index(column: &str) -> Result<usize, AppError> {
    if column.is_empty() || !column.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AppError::cell(format!("invalid column '{column}'")));
    }
    let n = column
        .chars()
        .fold(0usize, |acc, c| acc * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1));
    Ok(n - 1)
}

/// Column `offset` places to the right of `column`.
pub fn column_offset(column: &str, offset: usize) -> Result<String, AppError> {
    let mut n = column_index(column)? + offset + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    Ok(out.into_iter().rev().collect())
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn new_sheet(&mut self, name: &str) -> Result<(), AppError> {
        if self.sheets.iter().any(|s| s.name == name) {
            return Err(AppError::cell(format!("sheet '{name}' already exists")));
        }
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(AppError::cell(format!("invalid sheet name '{name}'")));
        }
        self.sheets.push(Sheet {
            name: name.to_string(),
            rows: Vec::new(),
        });
        Ok(())
    }

    /// Number of rows in use on `sheet`.
    pub fn row_count(&self, sheet: &str) -> Result<usize, AppError> {
        Ok(self.sheet(sheet)?.rows.len())
    }

    /// Write `values` into `row`, starting at column A.
    pub fn set_row<S: AsRef<str>>(&mut self, sheet: &str, row: usize, values: &[S]) -> Result<(), AppError> {
        for (i, v) in values.iter().enumerate() {
            let column = column_offset("A", i)?;
            self.set_cell(sheet, row, &column, v.as_ref())?;
        }
        Ok(())
    }

    /// Write the workbook to `dir`, replacing whatever was saved there before.
    ///
    /// Sheets are written into a sibling staging directory that is renamed
    /// into place once every file is complete. A failed save leaves the
    /// previous workbook untouched.
    pub fn save_as(&self, dir: &Path) -> Result<(), AppError> {
        let (staging, retired) = sibling_dirs(dir)?;
        for stale in [&staging, &retired] {
            if stale.exists() {
                fs::remove_dir_all(stale).map_err(|e| {
                    AppError::output(format!("failed to remove '{}': {e}", stale.display()))
                })?;
            }
        }

        if let Err(e) = self.write_sheets(&staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        if dir.exists() {
            fs::rename(dir, &retired).map_err(|e| {
                AppError::output(format!("failed to move aside '{}': {e}", dir.display()))
            })?;
        }
        if let Err(e) = fs::rename(&staging, dir) {
            // Put the previous workbook back before reporting.
            let _ = fs::rename(&retired, dir);
            return Err(AppError::output(format!(
                "failed to move '{}' into place: {e}",
                staging.display()
            )));
        }
        if retired.exists() {
            if let Err(e) = fs::remove_dir_all(&retired) {
                tracing::warn!(path = %retired.display(), error = %e, "failed to remove previous workbook");
            }
        }

        tracing::info!(dir = %dir.display(), sheets = self.sheets.len(), "workbook saved");
        Ok(())
    }

    fn write_sheets(&self, dir: &Path) -> Result<(), AppError> {
        fs::create_dir_all(dir)
            .map_err(|e| AppError::output(format!("failed to create '{}': {e}", dir.display())))?;

        for (i, sheet) in self.sheets.iter().enumerate() {
            let path = dir.join(format!("{:02}-{}.csv", i + 1, sheet.name));
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_path(&path)
                .map_err(|e| AppError::output(format!("failed to create '{}': {e}", path.display())))?;
            for row in &sheet.rows {
                // A blank row still needs one field to keep its line.
                let record: &[String] = if row.is_empty() { &[String::new()] } else { row };
                writer
                    .write_record(record)
                    .map_err(|e| AppError::output(format!("failed to write '{}': {e}", path.display())))?;
            }
            writer
                .flush()
                .map_err(|e| AppError::output(format!("failed to write '{}': {e}", path.display())))?;
        }
        Ok(())
    }

    pub fn open(dir: &Path) -> Result<Self, AppError> {
        let mut book = Workbook::new();
        for path in sheet_files(dir)? {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.split_once('-'))
                .map(|(_, name)| name.to_string())
                .ok_or_else(|| AppError::output(format!("unexpected sheet file '{}'", path.display())))?;

            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(&path)
                .map_err(|e| AppError::output(format!("failed to open '{}': {e}", path.display())))?;
            let mut rows = Vec::new();
            for record in reader.records() {
                let record = record
                    .map_err(|e| AppError::output(format!("failed to read '{}': {e}", path.display())))?;
                let mut row: Vec<String> = record.iter().map(str::to_string).collect();
                while row.last().is_some_and(String::is_empty) {
                    row.pop();
                }
                rows.push(row);
            }
            book.sheets.push(Sheet { name, rows });
        }
        if book.sheets.is_empty() {
            return Err(AppError::output(format!("no sheets found in '{}'", dir.display())));
        }
        Ok(book)
    }

    fn sheet(&self, name: &str) -> Result<&Sheet, AppError> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| AppError::cell(format!("sheet '{name}' not found")))
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut Sheet, AppError> {
        self.sheets
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| AppError::cell(format!("sheet '{name}' not found")))
    }
}

impl Grid for Workbook {
    fn get_cell(&self, sheet: &str, row: usize, column: &str) -> Result<String, AppError> {
        let r = row_index(row)?;
        let c = column_index(column)?;
        Ok(self
            .sheet(sheet)?
            .rows
            .get(r)
            .and_then(|cells| cells.get(c))
            .cloned()
            .unwrap_or_default())
    }

    fn set_cell(&mut self, sheet: &str, row: usize, column: &str, value: &str) -> Result<(), AppError> {
        let r = row_index(row)?;
        let c = column_index(column)?;
        let rows = &mut self.sheet_mut(sheet)?.rows;
        if rows.len() <= r {
            rows.resize_with(r + 1, Vec::new);
        }
        let cells = &mut rows[r];
        if cells.len() <= c {
            cells.resize(c + 1, String::new());
        }
        cells[c] = value.to_string();
        Ok(())
    }

    fn remove_row(&mut self, sheet: &str, row: usize) -> Result<(), AppError> {
        let r = row_index(row)?;
        let rows = &mut self.sheet_mut(sheet)?.rows;
        if r < rows.len() {
            rows.remove(r);
        }
        Ok(())
    }
}

fn row_index(row: usize) -> Result<usize, AppError> {
    row.checked_sub(1)
        .ok_or_else(|| AppError::cell("row numbers start at 1"))
}

/// Staging and retired-copy paths next to `dir`: `.<name>.tmp` and `.<name>.old`.
fn sibling_dirs(dir: &Path) -> Result<(PathBuf, PathBuf), AppError> {
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::output(format!("invalid workbook directory '{}'", dir.display())))?;
    let parent = match dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((parent.join(format!(".{name}.tmp")), parent.join(format!(".{name}.old"))))
}

/// `NN-<name>.csv` files in `dir`, sorted by their numeric prefix.
fn sheet_files(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir)
        .map_err(|e| AppError::output(format!("failed to read '{}': {e}", dir.display())))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| AppError::output(format!("failed to read '{}': {e}", dir.display())))?
            .path();
        let is_sheet = path.extension().is_some_and(|ext| ext == "csv")
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| {
                    let b = n.as_bytes();
                    b.len() > 3 && b[0].is_ascii_digit() && b[1].is_ascii_digit() && b[2] == b'-'
                });
        if is_sheet {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
