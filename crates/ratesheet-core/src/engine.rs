//! Engine orchestration
//!
//! Runs the stages in order for one worksheet:
//! grid → layout → metadata → pricing → normalize → inclusions → validate.

use ratesheet_model::{
    apply_recoverability, DetectionResult, IssueLocation, ParsedResortData, ProcessingError,
    RawWorksheet, ResortMetadata,
};
use ratesheet_validate::{ValidationContext, ValidationEngine};
use serde::Serialize;
use tracing::{debug, info};

use crate::classify::{self, NumberFormat};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::grid::CellGrid;
use crate::inclusions::InclusionsParser;
use crate::layout::{LayoutAnalyzer, LayoutOverride};
use crate::metadata::MetadataExtractor;
use crate::normalize::{normalize, Normalized};
use crate::pricing::PricingExtractor;

/// Result of one parse
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseOutcome {
    pub data: ParsedResortData,
    pub detection: DetectionResult,
}

/// Layout detection and pricing extraction for supplier rate sheets
///
/// An engine holds only its configuration and validator registry, so one
/// instance can be shared across threads and reused for any number of sheets.
///
/// # Example
///
/// ```
/// use ratesheet_core::Engine;
/// use ratesheet_model::RawWorksheet;
///
/// let sheet = RawWorksheet::from_strings(
///     "Paradise Resort",
///     &[
///         vec!["", "Jan", "Feb"],
///         vec!["Deluxe Room", "150", "160"],
///     ],
/// );
///
/// let outcome = Engine::with_defaults().parse(&sheet);
/// assert_eq!(outcome.data.resort_name, "Paradise Resort");
/// assert_eq!(outcome.data.pricing.len(), 2);
/// assert!(outcome.data.is_import_eligible());
/// ```
pub struct Engine {
    config: EngineConfig,
    validation: ValidationEngine,
}

impl Engine {
    /// Create an engine, rejecting malformed configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            validation: ValidationEngine::with_defaults(),
        })
    }

    /// Engine with default settings
    pub fn with_defaults() -> Self {
        Self {
            config: EngineConfig::default(),
            validation: ValidationEngine::with_defaults(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse one worksheet
    pub fn parse(&self, sheet: &RawWorksheet) -> ParseOutcome {
        self.parse_grid(&CellGrid::build(sheet), None)
    }

    /// Re-run extraction with choices confirmed by a reviewer
    pub fn parse_with_override(&self, sheet: &RawWorksheet, overrides: &LayoutOverride) -> ParseOutcome {
        self.parse_grid(&CellGrid::build(sheet), Some(overrides))
    }

    /// Layout detection only
    pub fn detect(&self, sheet: &RawWorksheet) -> DetectionResult {
        let grid = CellGrid::build(sheet);
        let format = self.number_format(&grid);
        LayoutAnalyzer::new(&self.config, format)
            .analyze(&grid, None)
            .detection
    }

    /// Parse an already built grid
    pub fn parse_grid(&self, grid: &CellGrid, overrides: Option<&LayoutOverride>) -> ParseOutcome {
        let sheet = grid.name().to_string();
        let format = self.number_format(grid);
        debug!(sheet = %sheet, ?format, "number format chosen");

        let analysis = LayoutAnalyzer::new(&self.config, format).analyze(grid, overrides);
        let mut issues = analysis.issues;

        let excluded: Vec<_> = [
            analysis.pricing.as_ref().map(|p| p.bounds),
            analysis.inclusions.as_ref().map(|s| s.bounds),
        ]
        .into_iter()
        .flatten()
        .collect();
        let header_texts = analysis
            .detection
            .primary
            .as_ref()
            .map(|p| p.detected_headers.clone())
            .unwrap_or_default();
        let mut meta = MetadataExtractor::new(&self.config).extract(grid, &excluded, &header_texts);
        issues.append(&mut meta.issues);
        let mut currency_recognized = meta.currency_from_sheet();

        let mut normalized = Normalized::default();
        let mut advertised = Vec::new();
        if let Some(section) = &analysis.pricing {
            let mut matrix = PricingExtractor::new(format, &meta.currency).extract(grid, section);
            issues.append(&mut matrix.issues);

            // Cells agreeing on one currency speak for a sheet that names none
            if !currency_recognized {
                match matrix.cell_currencies.as_slice() {
                    [] => {}
                    [only] => {
                        meta.currency = only.clone();
                        for entry in matrix.entries.iter_mut().filter(|e| !e.explicit_currency) {
                            entry.cell.currency = only.clone();
                        }
                        currency_recognized = true;
                    }
                    several => issues.push(
                        ProcessingError::warning(
                            "MIXED_CURRENCY",
                            format!(
                                "Price cells name several currencies ({}), unmarked cells use {}",
                                several.join(", "),
                                meta.currency
                            ),
                        )
                        .with_location(IssueLocation::range(&sheet, section.bounds))
                        .with_suggestion("State the sheet currency in the title or header"),
                    ),
                }
            }

            normalized = normalize(matrix.entries, &sheet);
            issues.append(&mut normalized.issues);

            if section.uses_default_type() && !normalized.records.is_empty() {
                issues.push(
                    ProcessingError::info(
                        "DEFAULT_ACCOMMODATION_TYPE",
                        format!(
                            "No accommodation types found, records use '{}'",
                            section.default_type
                        ),
                    )
                    .with_location(IssueLocation::range(&sheet, section.bounds)),
                );
            }
            advertised = section.advertised_combinations();
        }

        if analysis.detection.low_confidence {
            for (record, source) in normalized.records.iter().zip(&normalized.sources) {
                issues.push(
                    ProcessingError::warning(
                        "LOW_CONFIDENCE_RECORD",
                        format!(
                            "{} / {} extracted from a low-confidence layout",
                            record.month, record.accommodation_type
                        ),
                    )
                    .with_location(IssueLocation::cell(&sheet, *source)),
                );
            }
        }

        let mut data = ParsedResortData {
            resort_name: meta.resort_name.clone(),
            destination: meta.destination.clone(),
            pricing: normalized.records,
            metadata: ResortMetadata {
                resort_name: meta.resort_name.clone(),
                currency: meta.currency.clone(),
                season: meta.season.clone(),
                valid_from: meta.valid_from,
                valid_to: meta.valid_to,
            },
            ..Default::default()
        };

        if let Some(section) = &analysis.inclusions {
            let mut parsed = InclusionsParser::new(&self.config.inclusions.placeholders).parse(section, &sheet);
            issues.append(&mut parsed.issues);
            data.inclusions = parsed.all_items();
            data.inclusion_groups = parsed.groups;
            data.exclusions = parsed.exclusions;
        }

        let ctx = ValidationContext {
            sheet: sheet.clone(),
            ranges: self.config.ranges.clone(),
            advertised,
            currencies_seen: meta.currencies_seen.clone(),
            currency_recognized,
            sources: normalized.sources,
        };
        issues.extend(self.validation.validate(&data, &ctx));

        let has_usable_price = data.available_records().next().is_some();
        apply_recoverability(&mut issues, has_usable_price);
        data.issues = issues;

        let summary = data.summary();
        info!(
            sheet = %sheet,
            records = data.pricing.len(),
            inclusions = data.inclusions.len(),
            warnings = summary.warnings,
            errors = summary.errors,
            critical = summary.critical,
            "sheet parsed"
        );

        ParseOutcome {
            data,
            detection: analysis.detection,
        }
    }

    /// Configured separators win; otherwise the format is read off the sheet
    fn number_format(&self, grid: &CellGrid) -> NumberFormat {
        let locale = &self.config.locale;
        match (locale.decimal_separator, locale.thousands_separator) {
            (Some(','), _) | (None, Some('.')) => NumberFormat::DecimalComma,
            (Some(_), _) | (None, Some(_)) => NumberFormat::DecimalPoint,
            (None, None) => {
                let hint = (0..grid.height().min(self.config.detection.title_rows))
                    .flat_map(|row| grid.row_texts(row, 0))
                    .find_map(|(_, text)| classify::classify_currency(&text));
                classify::detect_grid_number_format(grid, hint)
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocaleSettings;
    use ratesheet_model::{Price, Severity};

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = EngineConfig::default();
        config.detection.classifier_threshold = 2.0;
        assert!(Engine::new(config).is_err());
    }

    #[test]
    fn test_configured_decimal_comma() {
        let config = EngineConfig {
            locale: LocaleSettings {
                decimal_separator: Some(','),
                thousands_separator: None,
            },
            ..Default::default()
        };
        let engine = Engine::new(config).unwrap();
        let sheet = RawWorksheet::from_strings(
            "Coral Bay Resort",
            &[vec!["", "Jan", "Feb"], vec!["Garden Villa", "1.250", "99,50"]],
        );
        let outcome = engine.parse(&sheet);
        let prices: Vec<Price> = outcome.data.pricing.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![Price::Amount(1250.0), Price::Amount(99.5)]);
    }

    #[test]
    fn test_single_cell_currency_adopted() {
        let sheet = RawWorksheet::from_strings(
            "Coral Bay Resort",
            &[vec!["", "Jan", "Feb"], vec!["Garden Villa", "€200", "210"]],
        );
        let outcome = Engine::with_defaults().parse(&sheet);
        assert_eq!(outcome.data.metadata.currency, "EUR");
        assert!(outcome.data.pricing.iter().all(|r| r.currency == "EUR"));
        assert!(!outcome
            .data
            .issues
            .iter()
            .any(|i| i.code == "CURRENCY_UNRECOGNIZED"));
    }

    #[test]
    fn test_default_type_reported() {
        let sheet = RawWorksheet::from_strings(
            "Paradise Resort",
            &[vec!["", "Jan", "Feb"], vec!["2N/2pax", "150", "160"]],
        );
        let outcome = Engine::with_defaults().parse(&sheet);
        assert!(outcome.data.pricing.iter().all(|r| r.accommodation_type == "Standard"));
        let info = outcome
            .data
            .issues
            .iter()
            .find(|i| i.code == "DEFAULT_ACCOMMODATION_TYPE")
            .unwrap();
        assert_eq!(info.severity, Severity::Info);
    }

    #[test]
    fn test_empty_sheet_is_not_importable() {
        let outcome = Engine::with_defaults().parse(&RawWorksheet::new("Sheet1"));
        assert!(outcome.data.pricing.is_empty());
        assert!(outcome.detection.primary.is_none());
        assert!(!outcome.data.is_import_eligible());
    }

    #[test]
    fn test_detect_only() {
        let sheet = RawWorksheet::from_strings(
            "Paradise Resort",
            &[vec!["", "Jan", "Feb"], vec!["Deluxe Room", "150", "160"]],
        );
        let detection = Engine::with_defaults().detect(&sheet);
        assert!(detection.primary.is_some());
        assert_eq!(detection.confidence, 1.0);
    }
}
