//! # ratesheet-data
//!
//! Worksheet readers for ratesheet - read supplier workbooks and CSV exports
//! into [`RawWorksheet`]s for the extraction engine.
//!
//! ## Features
//!
//! - **Excel Support**: `.xlsx`, `.xlsm`, `.xlsb`, `.xls` and `.ods` through
//!   `calamine`, with merged regions for `.xlsx`
//! - **CSV Support**: delimiter sniffing for comma, semicolon and tab
//! - **Range Parsing**: standard A1 range notation (e.g., "A1:C10")
//!
//! ## Example
//!
//! ```rust,ignore
//! use ratesheet_data::{DataEngine, DataSource};
//!
//! let source = DataEngine::open("rates.xlsx")?;
//! for sheet in source.read_all_sheets()? {
//!     println!("{}: {} rows", sheet.name, sheet.height());
//! }
//! ```

pub mod error;
pub mod sources;

use std::path::Path;

use ratesheet_model::RawWorksheet;

// Re-exports
pub use error::{DataError, Result};
pub use sources::{crop, CsvOptions, CsvSource, DataSource, ExcelSource};

/// Entry point for opening worksheet files
pub struct DataEngine;

impl DataEngine {
    /// Open a file with the reader matching its extension
    pub fn open(path: impl AsRef<Path>) -> Result<Box<dyn DataSource>> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" | "tsv" | "txt" => Ok(Box::new(CsvSource::new(path)?)),
            ext if sources::excel::EXCEL_EXTENSIONS.contains(&ext) => {
                Ok(Box::new(ExcelSource::new(path)?))
            }
            _ => Err(DataError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Read one sheet, or the first sheet when none is named
    pub fn read_sheet(path: impl AsRef<Path>, sheet: Option<&str>) -> Result<RawWorksheet> {
        let source = Self::open(path)?;

        let sheet_name = match sheet {
            Some(s) => s.to_string(),
            None => source
                .default_sheet()
                .ok_or_else(|| DataError::SheetNotFound("No sheets in workbook".to_string()))?,
        };

        source.read_sheet(&sheet_name)
    }
}
