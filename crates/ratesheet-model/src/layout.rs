//! Layout detection output types

use serde::{Deserialize, Serialize};

use crate::address::CellRange;

/// Which sheet axis carries the calendar months
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    /// One month per row; period labels run down a column
    MonthsInRows,
    /// One month per column; period labels run along a row
    MonthsInColumns,
    /// Period labels on both axes
    Mixed,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::MonthsInRows => write!(f, "months-in-rows"),
            Orientation::MonthsInColumns => write!(f, "months-in-columns"),
            Orientation::Mixed => write!(f, "mixed"),
        }
    }
}

/// A candidate interpretation of the sheet's header scheme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPattern {
    pub orientation: Orientation,
    /// Cells holding the period header and its sub-headers
    pub header_band: CellRange,
    /// 0..=1
    pub confidence: f64,
    /// Header texts that classified, in scan order
    pub detected_headers: Vec<String>,
}

/// Layout detection transparency for review tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Highest-confidence candidate; `None` when no period header was found
    pub primary: Option<LayoutPattern>,
    /// Up to three runner-up candidates
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary: Vec<LayoutPattern>,
    pub confidence: f64,
    /// Primary confidence fell below the configured threshold
    pub low_confidence: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing_bounds: Option<CellRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusions_bounds: Option<CellRange>,
}

impl DetectionResult {
    /// Nothing detected, e.g. an empty grid
    pub fn empty() -> Self {
        Self {
            primary: None,
            secondary: Vec::new(),
            confidence: 0.0,
            low_confidence: true,
            pricing_bounds: None,
            inclusions_bounds: None,
        }
    }

    pub fn orientation(&self) -> Option<Orientation> {
        self.primary.as_ref().map(|p| p.orientation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_wire_format() {
        let json = serde_json::to_string(&Orientation::MonthsInRows).unwrap();
        assert_eq!(json, "\"months-in-rows\"");
        assert_eq!(Orientation::Mixed.to_string(), "mixed");
    }

    #[test]
    fn test_empty_detection() {
        let detection = DetectionResult::empty();
        assert!(detection.low_confidence);
        assert!(detection.orientation().is_none());
    }
}
