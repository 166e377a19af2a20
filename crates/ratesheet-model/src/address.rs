//! Cell addressing in A1 notation
//!
//! Rows and columns are 0-indexed internally; A1 rendering and parsing
//! convert to and from the 1-indexed spreadsheet convention.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing A1 references
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Empty reference
    #[error("Empty cell reference")]
    Empty,

    /// Character outside `[A-Za-z0-9]`
    #[error("Invalid character '{0}' in cell reference")]
    InvalidCharacter(char),

    /// Missing column letters or row digits
    #[error("Invalid cell reference '{0}'")]
    Malformed(String),

    /// Row number is zero or does not fit
    #[error("Invalid row number '{0}'")]
    InvalidRow(String),

    /// Range without exactly one ':'
    #[error("Expected format 'A1:B2', got '{0}'")]
    InvalidRange(String),
}

/// A single cell position (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellAddress {
    pub row: usize,
    pub col: usize,
}

impl CellAddress {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Swap row and column
    pub fn transposed(self) -> Self {
        Self::new(self.col, self.row)
    }

    /// Render as A1 notation, e.g. `(0, 27)` -> `AB1`
    pub fn to_a1(self) -> String {
        format!("{}{}", column_name(self.col), self.row + 1)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

impl FromStr for CellAddress {
    type Err = AddressError;

    /// Parse a cell reference like "B12" (case-insensitive)
    fn from_str(cell: &str) -> Result<Self, Self::Err> {
        let cell = cell.trim().to_uppercase();

        if cell.is_empty() {
            return Err(AddressError::Empty);
        }

        let mut col_str = String::new();
        let mut row_str = String::new();

        for c in cell.chars() {
            if c.is_ascii_alphabetic() && row_str.is_empty() {
                col_str.push(c);
            } else if c.is_ascii_digit() {
                row_str.push(c);
            } else {
                return Err(AddressError::InvalidCharacter(c));
            }
        }

        if col_str.is_empty() || row_str.is_empty() {
            return Err(AddressError::Malformed(cell));
        }

        let col = column_index(&col_str).ok_or_else(|| AddressError::Malformed(cell.clone()))?;
        let row: usize = row_str
            .parse()
            .map_err(|_| AddressError::InvalidRow(row_str.clone()))?;

        if row == 0 {
            return Err(AddressError::InvalidRow(row_str));
        }

        Ok(Self::new(row - 1, col))
    }
}

/// An inclusive rectangle of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// Build a range from two corners in any order
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        Self {
            start: CellAddress::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellAddress::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    pub fn from_bounds(first_row: usize, first_col: usize, last_row: usize, last_col: usize) -> Self {
        Self::new(
            CellAddress::new(first_row, first_col),
            CellAddress::new(last_row, last_col),
        )
    }

    pub fn single(addr: CellAddress) -> Self {
        Self { start: addr, end: addr }
    }

    pub fn contains(&self, addr: CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    pub fn intersects(&self, other: &CellRange) -> bool {
        self.start.row <= other.end.row
            && other.start.row <= self.end.row
            && self.start.col <= other.end.col
            && other.start.col <= self.end.col
    }

    pub fn rows(&self) -> usize {
        self.end.row - self.start.row + 1
    }

    pub fn cols(&self) -> usize {
        self.end.col - self.start.col + 1
    }

    /// Number of addresses covered
    pub fn area(&self) -> usize {
        self.rows() * self.cols()
    }

    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    pub fn transposed(&self) -> Self {
        Self::new(self.start.transposed(), self.end.transposed())
    }

    /// Smallest range covering both
    pub fn union(&self, other: &CellRange) -> Self {
        Self::from_bounds(
            self.start.row.min(other.start.row),
            self.start.col.min(other.start.col),
            self.end.row.max(other.end.row),
            self.end.col.max(other.end.col),
        )
    }

    pub fn to_a1(&self) -> String {
        format!("{}:{}", self.start.to_a1(), self.end.to_a1())
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1())
    }
}

impl FromStr for CellRange {
    type Err = AddressError;

    /// Parse "A1:C10"
    fn from_str(range: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = range.split(':').collect();

        if parts.len() != 2 {
            return Err(AddressError::InvalidRange(range.to_string()));
        }

        let start: CellAddress = parts[0].parse()?;
        let end: CellAddress = parts[1].parse()?;
        Ok(Self::new(start, end))
    }
}

/// Convert column letters to a 0-indexed number (A=0, Z=25, AA=26)
pub fn column_index(col: &str) -> Option<usize> {
    if col.is_empty() {
        return None;
    }
    let mut result: usize = 0;
    for c in col.chars() {
        if !c.is_ascii_uppercase() {
            return None;
        }
        let value = c as usize - 'A' as usize + 1;
        result = result.checked_mul(26)?.checked_add(value)?;
    }
    Some(result - 1)
}

/// Convert a 0-indexed column number to letters (0=A, 26=AA)
pub fn column_name(mut col: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.iter().rev().collect()
}
