//! Cell grid with merged-range resolution
//!
//! A [`CellGrid`] is a dense, immutable table built from a [`RawWorksheet`]
//! (or row by row through [`CellGridBuilder`]). Every address inside a merged
//! range resolves to the value stored at the range's top-left cell, so code
//! above this module never has to think about merges: a price merged across
//! three columns simply reads as the same price in all three.
//!
//! [`GridView`] presents the grid either as-is or transposed. The layout
//! analyzer works on "lines" and "fields" of a view, which lets one code path
//! handle both orientations.

use ratesheet_model::{CellAddress, CellRange, RawValue, RawWorksheet};
use tracing::debug;

static EMPTY: RawValue = RawValue::Empty;

/// One stored cell
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    /// Value as stored at this address (blank inside a merge, except the anchor)
    pub raw: RawValue,
    /// Index into the grid's merge list
    pub merge: Option<usize>,
}

/// Immutable grid for one parse
#[derive(Debug, Clone, PartialEq)]
pub struct CellGrid {
    name: String,
    height: usize,
    width: usize,
    cells: Vec<Cell>,
    /// Flat index -> flat index of the authoritative cell
    canonical: Vec<usize>,
    merges: Vec<CellRange>,
}

impl CellGrid {
    /// Build a grid from a raw worksheet
    pub fn build(sheet: &RawWorksheet) -> Self {
        let mut builder = CellGridBuilder::new(sheet.name.clone());
        for row in &sheet.rows {
            builder.push_row(row.iter().cloned());
        }
        for merge in &sheet.merges {
            builder.merge(*merge);
        }
        builder.finish()
    }

    /// A grid with no rows
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            height: 0,
            width: 0,
            cells: Vec::new(),
            canonical: Vec::new(),
            merges: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }

    pub fn merges(&self) -> &[CellRange] {
        &self.merges
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        if row < self.height && col < self.width {
            Some(row * self.width + col)
        } else {
            None
        }
    }

    /// The authoritative cell for an address (the merge anchor inside merges)
    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        let idx = self.index(row, col)?;
        self.cells.get(self.canonical[idx])
    }

    /// Resolved value; out-of-bounds reads as empty
    pub fn value(&self, row: usize, col: usize) -> &RawValue {
        self.get(row, col).map(|c| &c.raw).unwrap_or(&EMPTY)
    }

    /// Resolved value as trimmed display text
    pub fn text(&self, row: usize, col: usize) -> String {
        self.value(row, col).to_text().trim().to_string()
    }

    pub fn is_blank(&self, row: usize, col: usize) -> bool {
        self.value(row, col).is_blank()
    }

    /// Address of the authoritative cell
    pub fn anchor(&self, row: usize, col: usize) -> CellAddress {
        self.get(row, col)
            .map(|c| CellAddress::new(c.row, c.col))
            .unwrap_or_else(|| CellAddress::new(row, col))
    }

    /// Merged range covering an address
    pub fn merge_at(&self, row: usize, col: usize) -> Option<CellRange> {
        let idx = self.index(row, col)?;
        self.cells[idx].merge.map(|m| self.merges[m])
    }

    /// Resolved values of an inclusive rectangle, clipped to the grid
    pub fn range(&self, top_left: CellAddress, bottom_right: CellAddress) -> Vec<Vec<&RawValue>> {
        if self.is_empty() {
            return Vec::new();
        }
        let last_row = bottom_right.row.min(self.height - 1);
        let last_col = bottom_right.col.min(self.width - 1);
        (top_left.row..=last_row)
            .map(|r| (top_left.col..=last_col).map(|c| self.value(r, c)).collect())
            .collect()
    }

    /// True when no resolved value in the row is non-blank
    pub fn row_is_blank(&self, row: usize) -> bool {
        (0..self.width).all(|c| self.is_blank(row, c))
    }

    /// Distinct non-blank texts of a row, one per authoritative cell
    pub fn row_texts(&self, row: usize, from_col: usize) -> Vec<(CellAddress, String)> {
        let mut out: Vec<(CellAddress, String)> = Vec::new();
        for c in from_col..self.width {
            let anchor = self.anchor(row, c);
            if out.iter().any(|(a, _)| *a == anchor) {
                continue;
            }
            let text = self.text(row, c);
            if !text.is_empty() {
                out.push((anchor, text));
            }
        }
        out
    }

    pub fn view(&self, transposed: bool) -> GridView<'_> {
        GridView {
            grid: self,
            transposed,
        }
    }
}

/// Incremental grid construction, one row at a time
#[derive(Debug, Default)]
pub struct CellGridBuilder {
    name: String,
    rows: Vec<Vec<RawValue>>,
    width: usize,
    merges: Vec<CellRange>,
}

impl CellGridBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append the next row; trailing blanks are not stored
    pub fn push_row(&mut self, row: impl IntoIterator<Item = RawValue>) {
        let mut row: Vec<RawValue> = row.into_iter().collect();
        while row.last().is_some_and(RawValue::is_blank) {
            row.pop();
        }
        self.width = self.width.max(row.len());
        self.rows.push(row);
    }

    /// Declare a merged range
    pub fn merge(&mut self, range: CellRange) {
        self.merges.push(range);
    }

    pub fn finish(mut self) -> CellGrid {
        while self.rows.last().is_some_and(|r| r.iter().all(RawValue::is_blank)) {
            self.rows.pop();
        }
        let height = self.rows.len();
        let width = self.width;

        if height == 0 || width == 0 {
            debug!(sheet = %self.name, "no discernible bounds, building empty grid");
            return CellGrid::empty(self.name);
        }

        let mut cells = Vec::with_capacity(height * width);
        for (r, row) in self.rows.into_iter().enumerate() {
            let len = row.len();
            for (c, raw) in row.into_iter().enumerate() {
                cells.push(Cell {
                    row: r,
                    col: c,
                    raw,
                    merge: None,
                });
            }
            for c in len..width {
                cells.push(Cell {
                    row: r,
                    col: c,
                    raw: RawValue::Empty,
                    merge: None,
                });
            }
        }
        let mut canonical: Vec<usize> = (0..cells.len()).collect();
        let mut merges: Vec<CellRange> = Vec::new();

        for range in self.merges {
            if range.start.row >= height || range.start.col >= width {
                debug!(range = %range, "merge outside grid ignored");
                continue;
            }
            let clipped = CellRange::from_bounds(
                range.start.row,
                range.start.col,
                range.end.row.min(height - 1),
                range.end.col.min(width - 1),
            );
            if clipped.is_single() {
                continue;
            }
            if merges.iter().any(|m| m.intersects(&clipped)) {
                debug!(range = %clipped, "overlapping merge ignored");
                continue;
            }

            let id = merges.len();
            let anchor = clipped.start.row * width + clipped.start.col;
            for r in clipped.start.row..=clipped.end.row {
                for c in clipped.start.col..=clipped.end.col {
                    let idx = r * width + c;
                    canonical[idx] = anchor;
                    cells[idx].merge = Some(id);
                }
            }
            merges.push(clipped);
        }

        debug!(
            sheet = %self.name,
            height,
            width,
            merges = merges.len(),
            "built cell grid"
        );

        CellGrid {
            name: self.name,
            height,
            width,
            cells,
            canonical,
            merges,
        }
    }
}

/// The grid seen as-is or transposed
///
/// A *line* is a row of the view, a *field* a column of the view. For a
/// transposed view lines are sheet columns. Addresses returned by the view
/// are always real sheet addresses.
#[derive(Debug, Clone, Copy)]
pub struct GridView<'a> {
    grid: &'a CellGrid,
    transposed: bool,
}

impl<'a> GridView<'a> {
    pub fn grid(&self) -> &'a CellGrid {
        self.grid
    }

    pub fn is_transposed(&self) -> bool {
        self.transposed
    }

    pub fn lines(&self) -> usize {
        if self.transposed {
            self.grid.width
        } else {
            self.grid.height
        }
    }

    pub fn fields(&self) -> usize {
        if self.transposed {
            self.grid.height
        } else {
            self.grid.width
        }
    }

    /// Real sheet address of a view position
    pub fn address(&self, line: usize, field: usize) -> CellAddress {
        if self.transposed {
            CellAddress::new(field, line)
        } else {
            CellAddress::new(line, field)
        }
    }

    pub fn value(&self, line: usize, field: usize) -> &'a RawValue {
        let a = self.address(line, field);
        self.grid.value(a.row, a.col)
    }

    pub fn text(&self, line: usize, field: usize) -> String {
        let a = self.address(line, field);
        self.grid.text(a.row, a.col)
    }

    pub fn is_blank(&self, line: usize, field: usize) -> bool {
        self.value(line, field).is_blank()
    }

    pub fn anchor(&self, line: usize, field: usize) -> CellAddress {
        let a = self.address(line, field);
        self.grid.anchor(a.row, a.col)
    }

    pub fn is_merged(&self, line: usize, field: usize) -> bool {
        let a = self.address(line, field);
        self.grid.merge_at(a.row, a.col).is_some()
    }

    /// Real sheet range for an inclusive view rectangle
    pub fn range(&self, first_line: usize, first_field: usize, last_line: usize, last_field: usize) -> CellRange {
        CellRange::new(
            self.address(first_line, first_field),
            self.address(last_line, last_field),
        )
    }
}
