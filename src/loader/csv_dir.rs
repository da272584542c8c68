//! Directory sources holding one `<table name>.csv` file per table.

use super::table::{Cell, RawTable};
use super::TableSource;
use crate::error::LoadError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A directory of CSV exports, one file per sheet.
pub struct CsvDirectory {
    root: PathBuf,
}

impl CsvDirectory {
    /// Create a source rooted at `root`.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Path of the CSV file backing a table.
    pub fn table_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.csv", name))
    }
}

impl TableSource for CsvDirectory {
    fn read_table(&mut self, name: &str) -> Result<RawTable, LoadError> {
        let path = self.table_path(name);
        if !path.is_file() {
            return Err(LoadError::MissingTable {
                table: name.to_string(),
                location: format!("directory '{}'", self.root.display()),
            });
        }

        debug!("Reading CSV table {}", path.display());

        let csv_error = |source: csv::Error| LoadError::Csv {
            path: path.clone(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .map_err(csv_error)?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(csv_error)?;
            rows.push(record.iter().map(Cell::from_text).collect());
        }

        RawTable::from_rows(name, rows)
    }
}
