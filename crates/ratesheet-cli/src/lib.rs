//! ratesheet CLI - Command-line interface library
//!
//! This library provides the CLI functionality for ratesheet:
//! - Parse: extract pricing, inclusions and metadata from a workbook
//! - Detect: show the detected layout only
//! - Sheets: list the sheets of a workbook
//!
//! # Library Usage
//!
//! ```ignore
//! use ratesheet_cli::{parse_file, SheetSelection};
//! use ratesheet_core::{Engine, LayoutOverride};
//!
//! let engine = Engine::with_defaults();
//! let outcomes = parse_file(&engine, "rates.xlsx".as_ref(), &SheetSelection::All, &LayoutOverride::default())?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Parse the first sheet, human-readable
//! ratesheet parse rates.xlsx
//!
//! # Parse every sheet as JSON, failing on errors
//! ratesheet parse rates.xlsx --all-sheets --format json --strict
//!
//! # Re-parse with a reviewer's corrections
//! ratesheet parse rates.xlsx --orientation months-in-rows --header-line 2
//!
//! # Show the detected layout
//! ratesheet detect rates.xlsx --verbose
//! ```

pub mod app;

// Re-export main entry point and types
pub use app::{detect_command, parse_command, parse_file, sheets_command};
pub use app::{exit_status, render_detection, render_report};
pub use app::{run_cli, OrientationArg, OutputFormat, SheetSelection};
