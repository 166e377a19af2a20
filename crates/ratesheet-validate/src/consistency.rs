//! Cross-field consistency validator

use std::collections::BTreeSet;

use ratesheet_model::{ParsedResortData, ProcessingError};

use crate::{ValidationContext, Validator};

/// Validates currency consistency and date-range ordering
///
/// Currencies set by a symbol inside a single price cell are explicit
/// overrides and do not count; only currencies stated in title or header
/// text are compared.
///
/// # Diagnostic Codes
///
/// - `MIXED_CURRENCY` (warning): header text names more than one currency
/// - `INVALID_DATE_RANGE` (error): a validity window does not end after it starts
pub struct ConsistencyValidator;

impl Validator for ConsistencyValidator {
    fn code(&self) -> &'static str {
        "RS3"
    }

    fn name(&self) -> &'static str {
        "consistency"
    }

    fn validate(&self, data: &ParsedResortData, ctx: &ValidationContext) -> Vec<ProcessingError> {
        let mut issues = Vec::new();

        let currencies: BTreeSet<&str> = ctx.currencies_seen.iter().map(String::as_str).collect();
        if currencies.len() > 1 {
            let listed: Vec<&str> = currencies.into_iter().collect();
            issues.push(
                ProcessingError::warning(
                    "MIXED_CURRENCY",
                    format!(
                        "Sheet mentions several currencies ({}), using {}",
                        listed.join(", "),
                        data.metadata.currency
                    ),
                )
                .with_location(ctx.sheet_location())
                .with_suggestion("Confirm the currency, or mark per-cell currencies explicitly"),
            );
        }

        if let (Some(from), Some(to)) = (data.metadata.valid_from, data.metadata.valid_to) {
            if from >= to {
                issues.push(
                    ProcessingError::error(
                        "INVALID_DATE_RANGE",
                        format!("Sheet validity {} to {} does not move forward", from, to),
                    )
                    .with_location(ctx.sheet_location()),
                );
            }
        }

        // One report per period, not per record
        let mut reported = BTreeSet::new();
        for (index, record) in data.pricing.iter().enumerate() {
            let (Some(from), Some(to)) = (record.valid_from, record.valid_to) else {
                continue;
            };
            if from >= to && reported.insert(record.month.as_str()) {
                issues.push(
                    ProcessingError::error(
                        "INVALID_DATE_RANGE",
                        format!("Period '{}' runs from {} to {}", record.month, from, to),
                    )
                    .with_location(ctx.record_location(index))
                    .with_suggestion("Check the day/month order of the period dates"),
                );
            }
        }

        issues
    }
}
