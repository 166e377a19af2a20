//! Coverage of advertised combinations

use ratesheet_model::{ParsedResortData, ProcessingError};

use crate::{ValidationContext, Validator};

/// Validates that every advertised (type, nights) pair has at least one price
///
/// A header band that names "Deluxe Villa / 3N" but never fills a price for
/// it usually means a column was shifted or left for later.
///
/// # Diagnostic Codes
///
/// - `MISSING_COMBINATIONS` (warning): one issue listing every uncovered pair
pub struct CompletenessValidator;

impl Validator for CompletenessValidator {
    fn code(&self) -> &'static str {
        "RS4"
    }

    fn name(&self) -> &'static str {
        "completeness"
    }

    fn validate(&self, data: &ParsedResortData, ctx: &ValidationContext) -> Vec<ProcessingError> {
        let missing: Vec<String> = ctx
            .advertised
            .iter()
            .filter(|(kind, nights)| {
                !data
                    .available_records()
                    .any(|r| &r.accommodation_type == kind && r.nights == *nights)
            })
            .map(|(kind, nights)| match nights {
                Some(n) => format!("{} / {}N", kind, n),
                None => kind.clone(),
            })
            .collect();

        if missing.is_empty() {
            return Vec::new();
        }

        vec![ProcessingError::warning(
            "MISSING_COMBINATIONS",
            format!("No available price for: {}", missing.join("; ")),
        )
        .with_location(ctx.sheet_location())
        .with_suggestion("Fill the empty columns or remove the unused headers")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;
    use ratesheet_model::{Price, Severity};

    #[test]
    fn test_validator_code() {
        assert_eq!(CompletenessValidator.code(), "RS4");
    }

    #[test]
    fn test_validator_name() {
        assert_eq!(CompletenessValidator.name(), "completeness");
    }

    #[test]
    fn test_all_combinations_covered() {
        let data = ParsedResortData {
            pricing: vec![
                record("January", "Villa", Some(2), Price::Amount(0.0)),
                record("January", "Suite", Some(2), Price::Amount(80.0)),
            ],
            ..Default::default()
        };
        let mut ctx = ValidationContext::new("Rates");
        ctx.advertised = vec![
            ("Villa".to_string(), Some(2)),
            ("Suite".to_string(), Some(2)),
        ];
        assert!(CompletenessValidator.validate(&data, &ctx).is_empty());
    }

    #[test]
    fn test_unavailable_only_counts_as_missing() {
        let data = ParsedResortData {
            pricing: vec![
                record("January", "Villa", Some(2), Price::Amount(120.0)),
                record("January", "Villa", Some(3), Price::Unavailable),
                record("February", "Villa", Some(3), Price::Unavailable),
            ],
            ..Default::default()
        };
        let mut ctx = ValidationContext::new("Rates");
        ctx.advertised = vec![
            ("Villa".to_string(), Some(2)),
            ("Villa".to_string(), Some(3)),
            ("Suite".to_string(), None),
        ];

        let issues = CompletenessValidator.validate(&data, &ctx);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].message, "No available price for: Villa / 3N; Suite");
    }
}
