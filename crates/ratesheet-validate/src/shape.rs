//! Result shape validator
//!
//! Checks the minimum a result needs before it can be imported at all.

use ratesheet_model::{ParsedResortData, ProcessingError};

use crate::{ValidationContext, Validator};

/// Validates that a result names a resort, carries prices and a known currency
///
/// # Diagnostic Codes
///
/// - `RESORT_NAME_MISSING` (critical): no resort name could be found
/// - `NO_PRICING` (critical): no pricing record was extracted
/// - `CURRENCY_UNRECOGNIZED` (warning): the currency fell back to a guess
///
/// # Example
///
/// ```
/// use ratesheet_model::ParsedResortData;
/// use ratesheet_validate::{ShapeValidator, ValidationContext, Validator};
///
/// let data = ParsedResortData {
///     resort_name: "Blue Lagoon".to_string(),
///     ..Default::default()
/// };
/// let issues = ShapeValidator.validate(&data, &ValidationContext::new("Rates"));
///
/// assert_eq!(issues.len(), 1);
/// assert_eq!(issues[0].code, "NO_PRICING");
/// ```
pub struct ShapeValidator;

impl Validator for ShapeValidator {
    fn code(&self) -> &'static str {
        "RS1"
    }

    fn name(&self) -> &'static str {
        "shape"
    }

    fn validate(&self, data: &ParsedResortData, ctx: &ValidationContext) -> Vec<ProcessingError> {
        let mut issues = Vec::new();

        if data.resort_name.trim().is_empty() {
            issues.push(
                ProcessingError::critical(
                    "RESORT_NAME_MISSING",
                    "No resort name found in the title block, sheet name or first row",
                )
                .with_location(ctx.sheet_location())
                .with_suggestion("Add a 'Resort: <name>' cell above the rate table"),
            );
        }

        if data.pricing.is_empty() {
            issues.push(
                ProcessingError::critical("NO_PRICING", "No pricing records were extracted")
                    .with_location(ctx.sheet_location())
                    .with_suggestion("Check that months or special periods label the rate table"),
            );
        }

        if !ctx.currency_recognized {
            issues.push(
                ProcessingError::warning(
                    "CURRENCY_UNRECOGNIZED",
                    format!(
                        "No recognizable currency in the sheet, assuming {}",
                        data.metadata.currency
                    ),
                )
                .with_location(ctx.sheet_location())
                .with_suggestion("State the currency code in the title or header row"),
            );
        }

        issues
    }
}
