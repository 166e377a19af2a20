//! Parsed result handed to external collaborators

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::issue::{ProcessingError, Severity};
use crate::pricing::PricingRecord;

/// Resort-level metadata
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResortMetadata {
    pub resort_name: String,
    /// ISO 4217 code
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<NaiveDate>,
}

/// Inclusions that apply to one accommodation type only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionGroup {
    pub accommodation_type: String,
    pub items: Vec<String>,
}

/// Engine output for one worksheet
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedResortData {
    pub resort_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub pricing: Vec<PricingRecord>,
    /// Every inclusion item, general items first
    pub inclusions: Vec<String>,
    /// Per-type partitions when the block had type sub-headers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inclusion_groups: Vec<InclusionGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusions: Option<Vec<String>>,
    pub metadata: ResortMetadata,
    pub issues: Vec<ProcessingError>,
}

impl ParsedResortData {
    /// False when any critical issue is present
    pub fn is_import_eligible(&self) -> bool {
        !self.issues.iter().any(ProcessingError::is_critical)
    }

    /// Records carrying an actual price
    pub fn available_records(&self) -> impl Iterator<Item = &PricingRecord> {
        self.pricing.iter().filter(|r| r.is_available())
    }

    pub fn issues_with(&self, severity: Severity) -> impl Iterator<Item = &ProcessingError> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    pub fn summary(&self) -> IssueSummary {
        let mut summary = IssueSummary::default();
        for issue in &self.issues {
            match issue.severity {
                Severity::Info => summary.info += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Error => summary.errors += 1,
                Severity::Critical => summary.critical += 1,
            }
        }
        summary
    }
}

/// Issue counts per severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IssueSummary {
    pub info: usize,
    pub warnings: usize,
    pub errors: usize,
    pub critical: usize,
}
