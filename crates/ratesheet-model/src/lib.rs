//! ratesheet-model - Data model for supplier rate sheets
//!
//! This crate provides the plain data types shared by the engine, the
//! validators, the worksheet readers and the CLI: the raw worksheet contract,
//! cell addressing, pricing records, issues and the parsed result.

pub mod address;
pub mod issue;
pub mod layout;
pub mod pricing;
pub mod raw;
pub mod resort;

pub use address::{column_index, column_name, AddressError, CellAddress, CellRange};
pub use issue::{apply_recoverability, IssueLocation, ProcessingError, Severity};
pub use layout::{DetectionResult, LayoutPattern, Orientation};
pub use pricing::{Period, Price, PriceCell, PricingRecord, RecordKey, MONTH_NAMES};
pub use raw::{RawValue, RawWorksheet};
pub use resort::{InclusionGroup, IssueSummary, ParsedResortData, ResortMetadata};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
