//! ratesheet-core - Smart layout detection and pricing extraction
//!
//! Turns a supplier rate sheet, in whatever shape the supplier chose, into a
//! flat list of pricing records, an inclusions list and resort metadata, with
//! every data-quality problem reported as a cell-addressed issue.
//!
//! # Architecture
//!
//! ```text
//! RawWorksheet → CellGrid → LayoutAnalyzer ─┬→ MetadataExtractor
//!                                           ├→ PricingExtractor → normalize
//!                                           └→ InclusionsParser
//!                                                     ↓
//!                                           ValidationEngine → ParsedResortData
//! ```
//!
//! Months-in-rows sheets are analysed through a transposed [`grid::GridView`],
//! so one code path serves both orientations.
//!
//! # Example
//!
//! ```
//! use ratesheet_core::Engine;
//! use ratesheet_model::{Price, RawWorksheet};
//!
//! let sheet = RawWorksheet::from_strings(
//!     "Paradise Resort",
//!     &[
//!         vec!["", "Jan", "Feb", "Mar"],
//!         vec!["2N/2pax", "150", "0", ""],
//!         vec!["2N/4pax", "280", "", ""],
//!     ],
//! );
//!
//! let outcome = Engine::with_defaults().parse(&sheet);
//! let data = outcome.data;
//! assert_eq!(data.pricing.len(), 4);
//! assert_eq!(data.pricing[2].price, Price::Amount(0.0));
//! assert_eq!(data.pricing[3].price, Price::Unavailable);
//! assert!(data.issues.iter().any(|i| i.code == "PERIOD_NO_DATA"));
//! ```

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod inclusions;
pub mod layout;
pub mod metadata;
pub mod normalize;
pub mod pricing;

// Re-export main types
pub use config::{DefaultSettings, DetectionSettings, EngineConfig, InclusionSettings, LocaleSettings, RangeSettings};
pub use engine::{Engine, ParseOutcome};
pub use error::{ConfigError, Result};
pub use grid::{CellGrid, CellGridBuilder, GridView};
pub use layout::LayoutOverride;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
