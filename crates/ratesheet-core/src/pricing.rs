//! Pricing extractor
//!
//! Walks every body cell of a located [`PricingSection`] and turns it into a
//! [`MatrixEntry`]: the record coordinate plus the price read from the cell.
//! Merged price cells need no special handling here: every covered position
//! reads the merge's top-left value, so a merge over k coordinates yields k
//! entries sharing one anchor.

use std::collections::HashSet;

use ratesheet_model::{
    CellAddress, IssueLocation, Period, PriceCell, ProcessingError, RawValue, RecordKey,
};
use tracing::debug;

use crate::classify::{self, NumberFormat};
use crate::grid::{CellGrid, GridView};
use crate::layout::{BodyLine, HeaderField, PricingSection};

/// One extracted coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixEntry {
    pub key: RecordKey,
    pub cell: PriceCell,
    /// Sheet position that was scanned
    pub source: CellAddress,
    /// Top-left of the merge covering `source`, or `source` itself
    pub anchor: CellAddress,
    pub merged: bool,
    /// The cell named its own currency
    pub explicit_currency: bool,
}

/// Extractor output in scan order
#[derive(Debug, Clone, Default)]
pub struct PriceMatrix {
    pub entries: Vec<MatrixEntry>,
    pub issues: Vec<ProcessingError>,
    /// Distinct currencies named by a symbol or code inside price cells
    pub cell_currencies: Vec<String>,
}

/// Reads price cells through the section's oriented view
pub struct PricingExtractor<'a> {
    format: NumberFormat,
    currency: &'a str,
}

impl<'a> PricingExtractor<'a> {
    /// `currency` applies to every cell that does not name its own
    pub fn new(format: NumberFormat, currency: &'a str) -> Self {
        Self { format, currency }
    }

    pub fn extract(&self, grid: &CellGrid, section: &PricingSection) -> PriceMatrix {
        let view = grid.view(section.transposed);
        let sheet = grid.name();
        let mut matrix = PriceMatrix::default();
        let mut noted = HashSet::new();

        let empty_periods = self.empty_field_periods(&view, section);
        for period in &empty_periods {
            let header = section
                .fields
                .iter()
                .find(|f| f.label.period.as_ref() == Some(period))
                .map(|f| f.address);
            let mut issue = ProcessingError::warning(
                "PERIOD_NO_DATA",
                format!("No prices given for {}", period.label()),
            )
            .with_suggestion("Fill the period or remove its header");
            if let Some(address) = header {
                issue = issue.with_location(IssueLocation::cell(sheet, address));
            }
            matrix.issues.push(issue);
        }

        for line in &section.lines {
            if line.label.period.is_some() && self.line_is_blank(&view, section, line) {
                let first = section.fields[0].field;
                let label_field = (0..first).find(|f| !view.is_blank(line.line, *f)).unwrap_or(0);
                let label_cell = view.address(line.line, label_field);
                let period = line.label.period.as_ref().map(Period::label).unwrap_or_default();
                matrix.issues.push(
                    ProcessingError::warning(
                        "PERIOD_NO_DATA",
                        format!("No prices given for {}", period),
                    )
                    .with_location(IssueLocation::cell(sheet, label_cell)),
                );
                continue;
            }

            // Fields that only differ by period collapse on a line with its own period
            let shared_keys: Vec<RecordKey> = if line.label.period.is_some() {
                let keys: Vec<RecordKey> =
                    section.fields.iter().map(|f| section.key_for(line, f)).collect();
                keys.iter()
                    .filter(|k| keys.iter().filter(|o| o == k).count() > 1)
                    .cloned()
                    .collect()
            } else {
                Vec::new()
            };

            for field in &section.fields {
                if view.is_blank(line.line, field.field)
                    && !shared_keys.is_empty()
                    && shared_keys.contains(&section.key_for(line, field))
                {
                    continue;
                }
                if line.label.period.is_none()
                    && field
                        .label
                        .period
                        .as_ref()
                        .is_some_and(|p| empty_periods.contains(p))
                {
                    continue;
                }
                let entry = self.entry(&view, section, line, field, &mut matrix, &mut noted);
                matrix.entries.push(entry);
            }
        }

        debug!(
            entries = matrix.entries.len(),
            notes = noted.len(),
            "price matrix extracted"
        );
        matrix
    }

    fn entry(
        &self,
        view: &GridView<'_>,
        section: &PricingSection,
        line: &BodyLine,
        field: &HeaderField,
        matrix: &mut PriceMatrix,
        noted: &mut HashSet<CellAddress>,
    ) -> MatrixEntry {
        let source = view.address(line.line, field.field);
        let anchor = view.anchor(line.line, field.field);
        let value = view.value(line.line, field.field);

        let mut explicit_currency = false;
        let cell = match self.read_cell(value) {
            CellReading::Price(cell) => cell,
            CellReading::Priced(cell) => {
                if !matrix.cell_currencies.contains(&cell.currency) {
                    matrix.cell_currencies.push(cell.currency.clone());
                }
                explicit_currency = true;
                cell
            }
            CellReading::Note(note) => {
                if noted.insert(anchor) {
                    matrix.issues.push(
                        ProcessingError::info(
                            "PRICE_NOTE",
                            format!("'{}' recorded as unavailable with a note", note),
                        )
                        .with_location(IssueLocation::cell(view.grid().name(), anchor)),
                    );
                }
                PriceCell::unavailable(self.currency).with_notes(note)
            }
        };

        MatrixEntry {
            key: section.key_for(line, field),
            cell,
            source,
            anchor,
            merged: view.is_merged(line.line, field.field),
            explicit_currency,
        }
    }

    fn read_cell(&self, value: &RawValue) -> CellReading {
        match value {
            RawValue::Empty => CellReading::Price(PriceCell::unavailable(self.currency)),
            RawValue::Number(n) => CellReading::Price(PriceCell::amount(*n, self.currency)),
            RawValue::Text(text) if text.trim().is_empty() => {
                CellReading::Price(PriceCell::unavailable(self.currency))
            }
            RawValue::Text(text) => match classify::parse_amount(text, self.format) {
                Some(amount) => match amount.currency {
                    Some(code) => CellReading::Priced(PriceCell::amount(amount.value, code)),
                    None => CellReading::Price(PriceCell::amount(amount.value, self.currency)),
                },
                None => CellReading::Note(text.trim().to_string()),
            },
            RawValue::Bool(_) | RawValue::Date(_) => CellReading::Note(value.to_text()),
        }
    }

    /// Header periods whose every body cell is blank
    fn empty_field_periods(&self, view: &GridView<'_>, section: &PricingSection) -> Vec<Period> {
        let plain_lines: Vec<&BodyLine> = section
            .lines
            .iter()
            .filter(|l| l.label.period.is_none())
            .collect();
        if plain_lines.is_empty() {
            return Vec::new();
        }

        let mut periods: Vec<Period> = Vec::new();
        for field in &section.fields {
            if let Some(period) = &field.label.period {
                if !periods.contains(period) {
                    periods.push(period.clone());
                }
            }
        }
        periods.retain(|period| {
            section
                .fields
                .iter()
                .filter(|f| f.label.period.as_ref() == Some(period))
                .all(|f| plain_lines.iter().all(|l| view.is_blank(l.line, f.field)))
        });
        periods
    }

    fn line_is_blank(&self, view: &GridView<'_>, section: &PricingSection, line: &BodyLine) -> bool {
        section
            .fields
            .iter()
            .all(|f| view.is_blank(line.line, f.field))
    }
}

enum CellReading {
    Price(PriceCell),
    /// A price whose cell names its currency
    Priced(PriceCell),
    Note(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::layout::LayoutAnalyzer;
    use ratesheet_model::{CellRange, Price, RawWorksheet};

    fn extract(sheet: &RawWorksheet) -> PriceMatrix {
        let config = EngineConfig::default();
        let grid = CellGrid::build(sheet);
        let analysis = LayoutAnalyzer::new(&config, NumberFormat::DecimalPoint).analyze(&grid, None);
        let section = analysis.pricing.expect("pricing section");
        PricingExtractor::new(NumberFormat::DecimalPoint, "USD").extract(&grid, &section)
    }

    fn price_of(matrix: &PriceMatrix, month: u32, pax: u32) -> Option<Price> {
        matrix
            .entries
            .iter()
            .find(|e| e.key.period == Period::month(month) && e.key.pax == Some(pax))
            .map(|e| e.cell.value)
    }

    #[test]
    fn test_zero_and_blank_kept_apart() {
        let sheet = RawWorksheet::from_strings(
            "Rates",
            &[
                vec!["", "Jan", "Feb", "Mar"],
                vec!["2N/2pax", "150", "0", ""],
                vec!["2N/4pax", "280", "", ""],
            ],
        );
        let matrix = extract(&sheet);

        assert_eq!(matrix.entries.len(), 4);
        assert_eq!(price_of(&matrix, 2, 2), Some(Price::Amount(0.0)));
        assert_eq!(price_of(&matrix, 2, 4), Some(Price::Unavailable));
        assert_eq!(price_of(&matrix, 3, 2), None);

        let warnings: Vec<_> = matrix
            .issues
            .iter()
            .filter(|i| i.code == "PERIOD_NO_DATA")
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("March"));
        assert_eq!(
            warnings[0].location.as_ref().unwrap().cell.as_deref(),
            Some("D1")
        );
    }

    #[test]
    fn test_text_price_becomes_note() {
        let sheet = RawWorksheet::from_strings(
            "Rates",
            &[vec!["", "Jan", "Feb"], vec!["Garden Villa", "POA", "$1,250"]],
        );
        let matrix = extract(&sheet);

        let jan = &matrix.entries[0];
        assert_eq!(jan.cell.value, Price::Unavailable);
        assert_eq!(jan.cell.notes.as_deref(), Some("POA"));
        assert_eq!(matrix.entries[1].cell.value, Price::Amount(1250.0));
        assert_eq!(
            matrix.issues.iter().filter(|i| i.code == "PRICE_NOTE").count(),
            1
        );
    }

    #[test]
    fn test_cell_currency_overrides_default() {
        let sheet = RawWorksheet::from_strings(
            "Rates",
            &[vec!["", "Jan", "Feb"], vec!["Garden Villa", "€200", "210"]],
        );
        let matrix = extract(&sheet);
        assert_eq!(matrix.entries[0].cell.currency, "EUR");
        assert_eq!(matrix.entries[1].cell.currency, "USD");
        assert!(matrix.entries[0].explicit_currency);
        assert!(!matrix.entries[1].explicit_currency);
        assert_eq!(matrix.cell_currencies, vec!["EUR".to_string()]);
    }

    #[test]
    fn test_cell_currency_matching_default_is_explicit() {
        let sheet = RawWorksheet::from_strings(
            "Rates",
            &[vec!["", "Jan", "Feb"], vec!["Garden Villa", "€200", "$210"]],
        );
        let matrix = extract(&sheet);
        assert!(matrix.entries.iter().all(|e| e.explicit_currency));
        assert_eq!(
            matrix.cell_currencies,
            vec!["EUR".to_string(), "USD".to_string()]
        );
    }

    #[test]
    fn test_merged_price_fans_out() {
        let sheet = RawWorksheet::from_strings(
            "Rates",
            &[
                vec!["", "Jan", "Feb", "Mar"],
                vec!["Garden Villa", "400", "", ""],
            ],
        )
        .with_merge(CellRange::from_bounds(1, 1, 1, 3));
        let matrix = extract(&sheet);

        assert_eq!(matrix.entries.len(), 3);
        assert!(matrix
            .entries
            .iter()
            .all(|e| e.cell.value == Price::Amount(400.0) && e.merged));
        assert!(matrix
            .entries
            .iter()
            .all(|e| e.anchor == CellAddress::new(1, 1)));
        assert!(matrix.issues.is_empty());
    }

    #[test]
    fn test_blank_line_period_skipped() {
        let sheet = RawWorksheet::from_strings(
            "Rates",
            &[
                vec!["", "Jan", "Feb", "Mar"],
                vec!["Deluxe Room", "150", "160", "170"],
                vec!["Easter", "", "", ""],
                vec!["Christmas", "300", "", ""],
            ],
        );
        let matrix = extract(&sheet);
        assert!(matrix
            .entries
            .iter()
            .all(|e| e.key.period.label() != "Easter"));
        assert!(matrix
            .issues
            .iter()
            .any(|i| i.code == "PERIOD_NO_DATA" && i.message.contains("Easter")));
    }
}
