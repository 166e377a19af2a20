//! Data source implementations.
//!
//! Each source turns one file into [`RawWorksheet`]s, the shape the engine
//! accepts.

pub mod csv;
pub mod excel;

pub use csv::{CsvOptions, CsvSource};
pub use excel::ExcelSource;

use ratesheet_model::{CellAddress, CellRange, RawWorksheet};

use crate::error::{DataError, Result};

/// Trait for sources that provide worksheets
pub trait DataSource {
    /// List available sheets in workbook order
    fn list_sheets(&self) -> Result<Vec<String>>;

    /// Get the default sheet name
    fn default_sheet(&self) -> Option<String>;

    /// Read one whole sheet, values and merged ranges
    fn read_sheet(&self, sheet: &str) -> Result<RawWorksheet>;

    /// Read every sheet in workbook order
    fn read_all_sheets(&self) -> Result<Vec<RawWorksheet>> {
        self.list_sheets()?
            .iter()
            .map(|name| self.read_sheet(name))
            .collect()
    }

    /// Read a rectangle of a sheet given in A1 notation, e.g. "A1:C10"
    ///
    /// The result is re-based so the range's top-left cell becomes A1.
    fn read_range(&self, sheet: &str, range: &str) -> Result<RawWorksheet> {
        let range: CellRange = range.parse()?;
        crop(&self.read_sheet(sheet)?, range)
    }
}

/// Cut `range` out of a worksheet, clipping merges to it
pub fn crop(sheet: &RawWorksheet, range: CellRange) -> Result<RawWorksheet> {
    if range.start.row >= sheet.height() || range.start.col >= sheet.width() {
        return Err(DataError::RangeOutOfBounds(format!(
            "{} starts outside {} ({} rows x {} columns)",
            range,
            sheet.name,
            sheet.height(),
            sheet.width()
        )));
    }

    let mut cropped = RawWorksheet::new(sheet.name.clone());
    for row in range.start.row..=range.end.row {
        let cells = (range.start.col..=range.end.col)
            .map(|col| {
                sheet
                    .rows
                    .get(row)
                    .and_then(|r| r.get(col))
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();
        cropped.push_row(cells);
    }

    let shift = |addr: CellAddress| {
        CellAddress::new(addr.row - range.start.row, addr.col - range.start.col)
    };
    for merge in sheet.merges.iter().filter(|m| m.intersects(&range)) {
        let start = CellAddress::new(
            merge.start.row.max(range.start.row),
            merge.start.col.max(range.start.col),
        );
        let end = CellAddress::new(
            merge.end.row.min(range.end.row),
            merge.end.col.min(range.end.col),
        );
        // A merge whose anchor falls outside the range has lost its value
        if merge.start == start {
            cropped.merges.push(CellRange::new(shift(start), shift(end)));
        }
    }
    Ok(cropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratesheet_model::RawValue;

    fn sheet() -> RawWorksheet {
        RawWorksheet::from_strings(
            "Rates",
            &[
                vec!["Title", "", "", ""],
                vec!["", "Jan", "Feb", "Mar"],
                vec!["Villa", "400", "", "420"],
            ],
        )
        .with_merge(CellRange::from_bounds(0, 0, 0, 3))
        .with_merge(CellRange::from_bounds(2, 1, 2, 2))
    }

    #[test]
    fn test_crop_rebases_cells() {
        let cropped = crop(&sheet(), "B2:D3".parse().unwrap()).unwrap();
        assert_eq!(cropped.height(), 2);
        assert_eq!(cropped.width(), 3);
        assert_eq!(cropped.rows[0][0], RawValue::Text("Jan".to_string()));
        assert_eq!(cropped.rows[1][2], RawValue::Number(420.0));
    }

    #[test]
    fn test_crop_keeps_anchored_merges() {
        let cropped = crop(&sheet(), "B2:D3".parse().unwrap()).unwrap();
        assert_eq!(cropped.merges, vec![CellRange::from_bounds(1, 0, 1, 1)]);
    }

    #[test]
    fn test_crop_drops_merges_without_anchor() {
        let cropped = crop(&sheet(), "C1:D2".parse().unwrap()).unwrap();
        assert!(cropped.merges.is_empty());
    }

    #[test]
    fn test_crop_out_of_bounds() {
        let err = crop(&sheet(), "F1:G2".parse().unwrap()).unwrap_err();
        assert!(matches!(err, DataError::RangeOutOfBounds(_)));
    }

    #[test]
    fn test_crop_pads_past_edge() {
        let cropped = crop(&sheet(), "C3:E4".parse().unwrap()).unwrap();
        assert_eq!(cropped.height(), 2);
        assert_eq!(cropped.rows[1], vec![RawValue::Empty; 3]);
    }
}
