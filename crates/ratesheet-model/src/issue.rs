//! Processing issues
//!
//! Every stage of the engine reports data-quality problems by appending
//! [`ProcessingError`]s to the sheet's issue list. Nothing here is ever
//! raised as a Rust error: a sheet always produces a result, degraded or not.
//!
//! # Example
//!
//! ```
//! use ratesheet_model::{CellAddress, IssueLocation, ProcessingError, Severity};
//!
//! let issue = ProcessingError::error("PRICE_OUT_OF_RANGE", "Price -20 is negative")
//!     .with_location(IssueLocation::cell("Rates", CellAddress::new(3, 1)))
//!     .with_suggestion("Check the sign of the value");
//!
//! assert_eq!(issue.severity, Severity::Error);
//! assert_eq!(issue.location.unwrap().cell.as_deref(), Some("B4"));
//! ```

use serde::{Deserialize, Serialize};

use crate::address::{column_name, CellAddress, CellRange};

/// Severity level of an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cosmetic or expected, e.g. a discarded placeholder inclusion
    Info,

    /// Degraded confidence or incomplete coverage; data still usable
    Warning,

    /// A specific data point is unusable
    Error,

    /// The overall result must not be imported
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Where an issue was found
///
/// `row` and `column` are 1-indexed (`column` as letters) so they can be
/// shown to a reviewer as-is; `cell` carries A1 notation or an A1 range.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IssueLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<String>,
}

impl IssueLocation {
    /// Sheet-level location
    pub fn sheet(sheet: impl Into<String>) -> Self {
        Self {
            sheet: Some(sheet.into()),
            ..Default::default()
        }
    }

    /// A single cell
    pub fn cell(sheet: impl Into<String>, addr: CellAddress) -> Self {
        Self {
            sheet: Some(sheet.into()),
            row: Some(addr.row + 1),
            column: Some(column_name(addr.col)),
            cell: Some(addr.to_a1()),
        }
    }

    /// A rectangular range; single-cell ranges render like [`IssueLocation::cell`]
    pub fn range(sheet: impl Into<String>, range: CellRange) -> Self {
        if range.is_single() {
            return Self::cell(sheet, range.start);
        }
        Self {
            sheet: Some(sheet.into()),
            row: None,
            column: None,
            cell: Some(range.to_a1()),
        }
    }
}

impl std::fmt::Display for IssueLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.sheet, &self.cell) {
            (Some(sheet), Some(cell)) => write!(f, "{}!{}", sheet, cell),
            (Some(sheet), None) => write!(f, "{}", sheet),
            (None, Some(cell)) => write!(f, "{}", cell),
            (None, None) => Ok(()),
        }
    }
}

/// A severity-tagged, optionally cell-addressed issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingError {
    pub severity: Severity,

    /// Stable machine-readable code, e.g. `PRICE_NOTE`
    pub code: String,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<IssueLocation>,

    /// Suggested correction for the reviewer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    pub recoverable: bool,
}

impl ProcessingError {
    /// Create a new issue; `recoverable` starts from the severity default
    pub fn new(severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: code.into(),
            message: message.into(),
            location: None,
            suggestion: None,
            recoverable: severity != Severity::Critical,
        }
    }

    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    pub fn critical(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Critical, code, message)
    }

    pub fn with_location(mut self, location: IssueLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }

    /// Error or critical
    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error | Severity::Critical)
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl std::fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: severity[CODE]: message
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;

        if let Some(ref location) = self.location {
            let rendered = location.to_string();
            if !rendered.is_empty() {
                write!(f, "\n  --> {}", rendered)?;
            }
        }

        if let Some(ref suggestion) = self.suggestion {
            write!(f, "\n  = help: {}", suggestion)?;
        }

        Ok(())
    }
}

/// Apply the recoverability policy to a finished issue list
///
/// Info and warning are always recoverable, error is recoverable while at
/// least one usable price remains, critical never is.
pub fn apply_recoverability(issues: &mut [ProcessingError], has_usable_price: bool) {
    for issue in issues.iter_mut() {
        issue.recoverable = match issue.severity {
            Severity::Info | Severity::Warning => true,
            Severity::Error => has_usable_price,
            Severity::Critical => false,
        };
    }
}
