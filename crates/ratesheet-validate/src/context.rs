//! Inputs the rule families need beyond the parsed result

use ratesheet_model::{CellAddress, IssueLocation};
use serde::{Deserialize, Serialize};

/// Plausibility bounds for prices and breakdown values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeSettings {
    /// Prices above this are flagged as errors
    pub max_price: f64,
    pub min_nights: u32,
    pub max_nights: u32,
    pub min_pax: u32,
    pub max_pax: u32,
}

impl Default for RangeSettings {
    fn default() -> Self {
        Self {
            max_price: 1_000_000.0,
            min_nights: 1,
            max_nights: 60,
            min_pax: 1,
            max_pax: 20,
        }
    }
}

/// Extraction facts handed to validators alongside the result
#[derive(Debug, Clone)]
pub struct ValidationContext {
    /// Worksheet name used in issue locations
    pub sheet: String,

    pub ranges: RangeSettings,

    /// (accommodation type, nights) pairs the header band advertises
    pub advertised: Vec<(String, Option<u32>)>,

    /// Every distinct currency found in title and header text
    pub currencies_seen: Vec<String>,

    /// Whether the result currency came from a recognized code or symbol
    pub currency_recognized: bool,

    /// Source cell of each pricing record, index-aligned with `pricing`
    pub sources: Vec<CellAddress>,
}

impl ValidationContext {
    pub fn new(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            ranges: RangeSettings::default(),
            advertised: Vec::new(),
            currencies_seen: Vec::new(),
            currency_recognized: true,
            sources: Vec::new(),
        }
    }

    pub fn with_ranges(mut self, ranges: RangeSettings) -> Self {
        self.ranges = ranges;
        self
    }

    /// Location of the record at `index`, or the sheet when its cell is unknown
    pub fn record_location(&self, index: usize) -> IssueLocation {
        match self.sources.get(index) {
            Some(addr) => IssueLocation::cell(&self.sheet, *addr),
            None => IssueLocation::sheet(&self.sheet),
        }
    }

    pub fn sheet_location(&self) -> IssueLocation {
        IssueLocation::sheet(&self.sheet)
    }
}
