//! Plausibility ranges for prices, nights and pax
//!
//! A price outside the configured range makes that single data point
//! unusable, so it is an error located at the source cell. Nights and pax
//! outside their bounds are only suspicious and are reported once per value.

use std::collections::BTreeSet;

use ratesheet_model::{ParsedResortData, Price, ProcessingError};

use crate::{ValidationContext, Validator};

/// Validates numeric plausibility of each record
///
/// # Diagnostic Codes
///
/// - `PRICE_OUT_OF_RANGE` (error): negative, non-finite, or above `max_price`
/// - `NIGHTS_OUT_OF_RANGE` (warning): nights outside `min_nights..=max_nights`
/// - `PAX_OUT_OF_RANGE` (warning): pax outside `min_pax..=max_pax`
pub struct RangeValidator;

impl Validator for RangeValidator {
    fn code(&self) -> &'static str {
        "RS2"
    }

    fn name(&self) -> &'static str {
        "range"
    }

    fn validate(&self, data: &ParsedResortData, ctx: &ValidationContext) -> Vec<ProcessingError> {
        let mut issues = Vec::new();
        let ranges = &ctx.ranges;
        let mut nights_seen = BTreeSet::new();
        let mut pax_seen = BTreeSet::new();

        for (index, record) in data.pricing.iter().enumerate() {
            if let Price::Amount(value) = record.price {
                let problem = if !value.is_finite() {
                    Some(format!("Price {} is not a finite number", value))
                } else if value < 0.0 {
                    Some(format!("Price {} is negative", value))
                } else if value > ranges.max_price {
                    Some(format!(
                        "Price {} exceeds the maximum of {}",
                        value, ranges.max_price
                    ))
                } else {
                    None
                };

                if let Some(message) = problem {
                    issues.push(
                        ProcessingError::error(
                            "PRICE_OUT_OF_RANGE",
                            format!("{} ({} / {})", message, record.month, record.accommodation_type),
                        )
                        .with_location(ctx.record_location(index))
                        .with_suggestion("Check the cell for a typo or a misplaced separator"),
                    );
                }
            }

            if let Some(nights) = record.nights {
                let in_range = (ranges.min_nights..=ranges.max_nights).contains(&nights);
                if !in_range && nights_seen.insert(nights) {
                    issues.push(
                        ProcessingError::warning(
                            "NIGHTS_OUT_OF_RANGE",
                            format!(
                                "{} nights is outside {}..={}",
                                nights, ranges.min_nights, ranges.max_nights
                            ),
                        )
                        .with_location(ctx.record_location(index)),
                    );
                }
            }

            if let Some(pax) = record.pax {
                let in_range = (ranges.min_pax..=ranges.max_pax).contains(&pax);
                if !in_range && pax_seen.insert(pax) {
                    issues.push(
                        ProcessingError::warning(
                            "PAX_OUT_OF_RANGE",
                            format!(
                                "{} pax is outside {}..={}",
                                pax, ranges.min_pax, ranges.max_pax
                            ),
                        )
                        .with_location(ctx.record_location(index)),
                    );
                }
            }
        }

        issues
    }
}
