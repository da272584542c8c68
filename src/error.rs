//! Error types for loading and filtering.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that make a data source unusable.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data source not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error(
        "unsupported data source '{}': expected a workbook (.xlsx, .xlsm, .xlsb, .xls, .ods) or a directory of CSV files",
        path.display()
    )]
    UnsupportedSource { path: PathBuf },

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read workbook '{}': {source}", path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("failed to read CSV table '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("table '{table}' not found in {location}")]
    MissingTable { table: String, location: String },

    #[error("table '{table}' has no header row")]
    EmptyTable { table: String },

    #[error("table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: &'static str },
}

/// Errors raised by an invalid filter selection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("unknown college '{0}'")]
    UnknownCollege(String),

    #[error("program '{program}' is not offered by {scope}")]
    UnknownProgram { program: String, scope: String },
}
