//! Spreadsheet persistence for submissions.

mod spreadsheet;
mod workbook;

pub use spreadsheet::SpreadsheetStorage;
pub use workbook::{MATERIALS_SHEET, SUBMISSIONS_SHEET, VALIDATION_SOURCES_SHEET};

use thiserror::Error;

/// A sheet row keyed by column header.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Errors that can occur while reading or writing the workbook.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The workbook could not be parsed or encoded.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Submission not found: {0}")]
    NotFound(String),

    #[error("Submission already exists: {0}")]
    Duplicate(String),

    /// A previous writer panicked while holding the storage lock.
    #[error("Storage lock poisoned")]
    Poisoned,
}

impl From<calamine::XlsxError> for StorageError {
    fn from(err: calamine::XlsxError) -> Self {
        StorageError::Spreadsheet(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for StorageError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        StorageError::Spreadsheet(err.to_string())
    }
}

impl From<csv::Error> for StorageError {
    fn from(err: csv::Error) -> Self {
        StorageError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
