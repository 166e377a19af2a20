//! Raw worksheet contract
//!
//! This is the inbound shape the engine accepts: typed cell values laid out
//! row by row, plus the merged ranges declared by the workbook. Readers in
//! `ratesheet-data` produce it; tests build it by hand.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::address::CellRange;

/// A typed cell value as read from the workbook
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum RawValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl RawValue {
    /// Blank cells and whitespace-only strings are empty
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Empty => true,
            RawValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display text of the value; numbers drop a zero fraction
    pub fn to_text(&self) -> String {
        match self {
            RawValue::Empty => String::new(),
            RawValue::Text(s) => s.clone(),
            RawValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{:.0}", n)
                } else {
                    n.to_string()
                }
            }
            RawValue::Bool(b) => b.to_string(),
            RawValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<&str> for RawValue {
    /// Empty strings become `Empty`
    fn from(s: &str) -> Self {
        if s.is_empty() {
            RawValue::Empty
        } else {
            RawValue::Text(s.to_string())
        }
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        if s.is_empty() {
            RawValue::Empty
        } else {
            RawValue::Text(s)
        }
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<NaiveDate> for RawValue {
    fn from(d: NaiveDate) -> Self {
        RawValue::Date(d)
    }
}

/// One worksheet as delivered by a reader
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawWorksheet {
    /// Worksheet/tab name
    pub name: String,
    /// Row-major cell values; rows may have different lengths
    pub rows: Vec<Vec<RawValue>>,
    /// Merged ranges declared by the workbook
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merges: Vec<CellRange>,
}

impl RawWorksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            merges: Vec::new(),
        }
    }

    /// Build from string rows; empty strings become blank cells and
    /// strings that parse as plain numbers become numeric cells.
    pub fn from_strings<S: AsRef<str>>(name: impl Into<String>, rows: &[Vec<S>]) -> Self {
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|s| {
                        let s = s.as_ref();
                        let plain = !s.trim().is_empty()
                            && s.trim()
                                .chars()
                                .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'));
                        match s.trim().parse::<f64>() {
                            Ok(n) if plain => RawValue::Number(n),
                            _ => RawValue::from(s),
                        }
                    })
                    .collect()
            })
            .collect();
        Self {
            name: name.into(),
            rows,
            merges: Vec::new(),
        }
    }

    pub fn with_merge(mut self, range: CellRange) -> Self {
        self.merges.push(range);
        self
    }

    pub fn push_row(&mut self, row: Vec<RawValue>) {
        self.rows.push(row);
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Widest row length
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(RawValue::is_blank))
    }

    /// Swap rows and columns, including merges
    pub fn transposed(&self) -> Self {
        let width = self.width();
        let rows = (0..width)
            .map(|c| {
                self.rows
                    .iter()
                    .map(|row| row.get(c).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        Self {
            name: self.name.clone(),
            rows,
            merges: self.merges.iter().map(CellRange::transposed).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_text() {
        assert_eq!(RawValue::Number(150.0).to_text(), "150");
        assert_eq!(RawValue::Number(99.5).to_text(), "99.5");
        assert_eq!(RawValue::Empty.to_text(), "");
        let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        assert_eq!(RawValue::Date(date).to_text(), "2025-04-01");
    }

    #[test]
    fn test_blank() {
        assert!(RawValue::Text("   ".to_string()).is_blank());
        assert!(!RawValue::Number(0.0).is_blank());
    }

    #[test]
    fn test_from_strings_types() {
        let sheet = RawWorksheet::from_strings("Rates", &[vec!["Jan", "0", "", "POA"]]);
        assert_eq!(sheet.rows[0][0], RawValue::Text("Jan".to_string()));
        assert_eq!(sheet.rows[0][1], RawValue::Number(0.0));
        assert_eq!(sheet.rows[0][2], RawValue::Empty);
        assert_eq!(sheet.rows[0][3], RawValue::Text("POA".to_string()));
    }

    #[test]
    fn test_transposed_pads_short_rows() {
        let sheet = RawWorksheet::from_strings("T", &[vec!["a", "b", "c"], vec!["d"]])
            .with_merge(CellRange::from_bounds(0, 1, 0, 2));
        let t = sheet.transposed();
        assert_eq!(t.height(), 3);
        assert_eq!(t.rows[2][1], RawValue::Empty);
        assert_eq!(t.merges[0], CellRange::from_bounds(1, 0, 2, 0));
    }
}
