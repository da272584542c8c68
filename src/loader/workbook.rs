//! Spreadsheet workbook sources (xlsx, xlsm, xlsb, xls, ods).

use super::table::{Cell, RawTable};
use super::TableSource;
use crate::error::LoadError;
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extensions opened as workbooks.
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// An opened workbook whose sheets are the tables.
pub struct WorkbookSource {
    path: PathBuf,
    sheets: Sheets<BufReader<File>>,
}

impl WorkbookSource {
    /// Open a workbook, detecting the format from its extension.
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let sheets = open_workbook_auto(path).map_err(|source| LoadError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(
            "Opened workbook {} with sheets {:?}",
            path.display(),
            sheets.sheet_names()
        );

        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }

    /// Returns true when `path` has a workbook extension.
    pub fn handles(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| WORKBOOK_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }
}

impl TableSource for WorkbookSource {
    fn read_table(&mut self, name: &str) -> Result<RawTable, LoadError> {
        if !self.sheets.sheet_names().iter().any(|sheet| sheet == name) {
            return Err(LoadError::MissingTable {
                table: name.to_string(),
                location: format!("workbook '{}'", self.path.display()),
            });
        }

        let range = self
            .sheets
            .worksheet_range(name)
            .map_err(|source| LoadError::Workbook {
                path: self.path.clone(),
                source,
            })?;

        let rows = range
            .rows()
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();

        RawTable::from_rows(name, rows)
    }
}

/// Convert a workbook cell into a table cell.
pub fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) => Cell::from_text(s),
        other => Cell::from_text(&other.to_string()),
    }
}
