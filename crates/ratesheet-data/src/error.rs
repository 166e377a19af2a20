//! Error types for worksheet readers.

use ratesheet_model::AddressError;
use thiserror::Error;

/// Result type for reader operations
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while reading a workbook
#[derive(Debug, Error)]
pub enum DataError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Extension not handled by any reader
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Failed to open workbook
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    /// Sheet not found in workbook
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Invalid range specification
    #[error("Invalid range: {0}")]
    InvalidRange(#[from] AddressError),

    /// Range starts outside the sheet
    #[error("Range out of bounds: {0}")]
    RangeOutOfBounds(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Calamine error
    #[error("Excel error: {0}")]
    Calamine(String),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<calamine::Error> for DataError {
    fn from(err: calamine::Error) -> Self {
        DataError::Calamine(err.to_string())
    }
}

impl From<calamine::XlsxError> for DataError {
    fn from(err: calamine::XlsxError) -> Self {
        DataError::Calamine(err.to_string())
    }
}
