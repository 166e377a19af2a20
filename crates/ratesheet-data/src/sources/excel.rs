//! Excel/ODS data source using calamine.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, DataType, Range, Reader, Sheets};
use ratesheet_model::{CellRange, RawValue, RawWorksheet};
use tracing::{debug, warn};

use crate::error::{DataError, Result};
use crate::sources::DataSource;

/// Extensions calamine can open
pub const EXCEL_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Spreadsheet workbook data source
pub struct ExcelSource {
    /// Path to the workbook
    path: PathBuf,
    /// Sheet names cache
    sheet_names: Vec<String>,
}

impl ExcelSource {
    /// Open a workbook; the format is picked from the extension
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DataError::FileNotFound(path.display().to_string()));
        }

        let workbook = open_workbook_auto(path)
            .map_err(|e| DataError::WorkbookOpen(format!("{}: {}", path.display(), e)))?;
        let sheet_names = workbook.sheet_names().to_vec();
        debug!(path = %path.display(), sheets = sheet_names.len(), "workbook opened");

        Ok(Self {
            path: path.to_path_buf(),
            sheet_names,
        })
    }

    /// Convert a calamine cell to a raw value
    fn cell_value(cell: &Data) -> RawValue {
        match cell {
            Data::Empty => RawValue::Empty,
            Data::String(s) => RawValue::from(s.as_str()),
            Data::Int(i) => RawValue::Number(*i as f64),
            Data::Float(f) => RawValue::Number(*f),
            Data::Bool(b) => RawValue::Bool(*b),
            Data::Error(e) => RawValue::Text(e.to_string()),
            Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_date() {
                Some(date) => RawValue::Date(date),
                None => RawValue::Text(cell.to_string()),
            },
            Data::DurationIso(s) => RawValue::Text(s.clone()),
        }
    }

    /// Lay a calamine range out from A1, padding the offset it may start at
    fn worksheet(name: &str, range: &Range<Data>) -> RawWorksheet {
        let mut sheet = RawWorksheet::new(name);
        let Some((end_row, end_col)) = range.end() else {
            return sheet;
        };

        for row in 0..=end_row {
            let cells = (0..=end_col)
                .map(|col| {
                    range
                        .get_value((row, col))
                        .map(Self::cell_value)
                        .unwrap_or_default()
                })
                .collect();
            sheet.push_row(cells);
        }
        sheet
    }

    fn merges(workbook: &mut Sheets<std::io::BufReader<std::fs::File>>, sheet: &str) -> Vec<CellRange> {
        // Only the xlsx reader exposes merged regions
        let Sheets::Xlsx(xlsx) = workbook else {
            return Vec::new();
        };
        match xlsx.worksheet_merge_cells(sheet) {
            Some(Ok(regions)) => regions
                .iter()
                .map(|d| {
                    CellRange::from_bounds(
                        d.start.0 as usize,
                        d.start.1 as usize,
                        d.end.0 as usize,
                        d.end.1 as usize,
                    )
                })
                .collect(),
            Some(Err(e)) => {
                warn!(sheet, error = %e, "could not read merged regions");
                Vec::new()
            }
            None => Vec::new(),
        }
    }
}

impl DataSource for ExcelSource {
    fn list_sheets(&self) -> Result<Vec<String>> {
        Ok(self.sheet_names.clone())
    }

    fn default_sheet(&self) -> Option<String> {
        self.sheet_names.first().cloned()
    }

    fn read_sheet(&self, sheet: &str) -> Result<RawWorksheet> {
        if !self.sheet_names.iter().any(|s| s == sheet) {
            return Err(DataError::SheetNotFound(sheet.to_string()));
        }

        // Re-open workbook for reading (calamine requires this pattern)
        let mut workbook = open_workbook_auto(&self.path)
            .map_err(|e| DataError::WorkbookOpen(format!("{}: {}", self.path.display(), e)))?;

        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| DataError::SheetNotFound(format!("{}: {}", sheet, e)))?;

        let mut worksheet = Self::worksheet(sheet, &range);
        worksheet.merges = Self::merges(&mut workbook, sheet);
        debug!(
            sheet,
            rows = worksheet.height(),
            cols = worksheet.width(),
            merges = worksheet.merges.len(),
            "sheet read"
        );
        Ok(worksheet)
    }
}
