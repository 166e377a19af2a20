//! Metadata extractor
//!
//! Reads resort-level facts from the title block: the rows at the top of the
//! sheet, minus anything inside the pricing or inclusions sections.

use std::collections::HashSet;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use ratesheet_model::{CellAddress, CellRange, IssueLocation, ProcessingError, RawValue};
use regex::Regex;
use tracing::debug;

use crate::classify;
use crate::config::EngineConfig;
use crate::grid::CellGrid;
use crate::layout::heading_kind;

static GENERIC_SHEET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:sheet|tabelle|feuil|hoja|foglio|blad|worksheet|rates?|prices?|pricing|tariffs?|data|export|table|summary|contract|import|untitled)?\s*[-_ ]?\s*\d*\s*$",
    )
    .unwrap()
});

static PROPERTY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:resorts?|hotels?|spa|retreat|inn|lodges?|sanctuary|hideaway|hostel|motel|camp)\b")
        .unwrap()
});

static YEAR_SPAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:19|20)\d{2}\s*[/\-–]\s*(?:(?:19|20)\d{2}|\d{2})\b").unwrap());

const NAME_LABELS: &[&str] = &[
    "resort",
    "resort name",
    "hotel",
    "hotel name",
    "property",
    "property name",
];

const DESTINATION_LABELS: &[&str] = &["destination", "location", "country", "island", "city", "region"];

const SEASON_LABELS: &[&str] = &["season", "rate season", "validity season"];

/// Facts found in the title block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedMetadata {
    pub resort_name: String,
    pub destination: Option<String>,
    /// Resolved currency, possibly the configured default
    pub currency: String,
    /// Every distinct currency named in title or header text
    pub currencies_seen: Vec<String>,
    pub season: Option<String>,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,
    pub issues: Vec<ProcessingError>,
}

impl ExtractedMetadata {
    /// True when the currency came from the sheet rather than the default
    pub fn currency_from_sheet(&self) -> bool {
        !self.currencies_seen.is_empty()
    }
}

#[derive(Debug, Clone)]
struct TitleCell {
    address: CellAddress,
    text: String,
    date: Option<NaiveDate>,
}

pub struct MetadataExtractor<'a> {
    config: &'a EngineConfig,
}

impl<'a> MetadataExtractor<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Extract metadata; `header_texts` are the detected header-band labels
    pub fn extract(
        &self,
        grid: &CellGrid,
        excluded: &[CellRange],
        header_texts: &[String],
    ) -> ExtractedMetadata {
        let cells = self.title_cells(grid, excluded);
        let mut meta = ExtractedMetadata {
            resort_name: self.resort_name(grid, &cells),
            destination: label_value(&cells, DESTINATION_LABELS),
            ..Default::default()
        };

        for text in cells.iter().map(|c| c.text.as_str()).chain(header_texts.iter().map(String::as_str)) {
            for code in classify::find_currencies(text) {
                if !meta.currencies_seen.iter().any(|c| c == code) {
                    meta.currencies_seen.push(code.to_string());
                }
            }
        }
        meta.currency = meta
            .currencies_seen
            .first()
            .cloned()
            .unwrap_or_else(|| self.config.defaults.currency.clone());

        meta.season = label_value(&cells, SEASON_LABELS).or_else(|| season_text(&cells));
        self.validity(grid, &cells, &mut meta);

        debug!(
            resort = %meta.resort_name,
            currency = %meta.currency,
            title_cells = cells.len(),
            "metadata extracted"
        );
        meta
    }

    fn title_cells(&self, grid: &CellGrid, excluded: &[CellRange]) -> Vec<TitleCell> {
        let first_section_row = excluded.iter().map(|r| r.start.row).min().unwrap_or(0);
        let limit = self
            .config
            .detection
            .title_rows
            .max(first_section_row)
            .min(grid.height());

        let mut seen = HashSet::new();
        let mut cells = Vec::new();
        for row in 0..limit {
            for (address, text) in grid.row_texts(row, 0) {
                if excluded.iter().any(|r| r.contains(address)) || !seen.insert(address) {
                    continue;
                }
                let date = match grid.value(address.row, address.col) {
                    RawValue::Date(d) => Some(*d),
                    _ => None,
                };
                cells.push(TitleCell {
                    address,
                    text: text.trim().to_string(),
                    date,
                });
            }
        }
        cells
    }

    fn resort_name(&self, grid: &CellGrid, cells: &[TitleCell]) -> String {
        if let Some(name) = label_value(cells, NAME_LABELS) {
            return name;
        }

        let candidates: Vec<&TitleCell> = cells.iter().filter(|c| is_name_like(c)).collect();

        let merged_title = candidates.iter().find(|c| {
            grid.merge_at(c.address.row, c.address.col)
                .is_some_and(|m| m.cols() > 1)
        });
        if let Some(cell) = merged_title {
            return cell.text.clone();
        }

        if let Some(cell) = candidates.iter().find(|c| PROPERTY_RE.is_match(&c.text)) {
            return cell.text.clone();
        }

        let sheet = grid.name().trim();
        if !sheet.is_empty() && !GENERIC_SHEET_RE.is_match(sheet) {
            return sheet.to_string();
        }

        candidates
            .iter()
            .find(|c| c.address.row == 0)
            .map(|c| c.text.clone())
            .unwrap_or_default()
    }

    fn validity(&self, grid: &CellGrid, cells: &[TitleCell], meta: &mut ExtractedMetadata) {
        let mut dates = Vec::new();
        let mut first_at = None;
        for cell in cells {
            let found = match cell.date {
                Some(d) => vec![d],
                None => classify::find_dates(&cell.text),
            };
            if !found.is_empty() && first_at.is_none() {
                first_at = Some(cell.address);
            }
            dates.extend(found);
            if dates.len() >= 2 {
                break;
            }
        }

        match dates.as_slice() {
            [] => {}
            [from, to, ..] if from < to => {
                meta.valid_from = Some(*from);
                meta.valid_to = Some(*to);
            }
            _ => {
                let mut issue = ProcessingError::warning(
                    "VALIDITY_UNRESOLVED",
                    "Could not read a validity window from the title block",
                )
                .with_suggestion("Write the validity as two dates, start before end");
                if let Some(address) = first_at {
                    issue = issue.with_location(IssueLocation::cell(grid.name(), address));
                }
                meta.issues.push(issue);
            }
        }
    }
}

/// Text that could be a title: not a label, heading, number or period
fn is_name_like(cell: &TitleCell) -> bool {
    let text = cell.text.as_str();
    cell.date.is_none()
        && text.chars().any(char::is_alphabetic)
        && !text.contains(':')
        && text.split_whitespace().count() <= 10
        && heading_kind(text).is_none()
        && classify::parse_number(text, classify::NumberFormat::DecimalPoint).is_none()
        && classify::classify_month(text).confidence < 0.6
        && classify::find_dates(text).is_empty()
}

/// Value of a "Label: value" cell, or of the cell right of a bare label
fn label_value(cells: &[TitleCell], labels: &[&str]) -> Option<String> {
    for cell in cells {
        let (head, value) = match cell.text.split_once(':') {
            Some((head, value)) => (head, value.trim()),
            None => (cell.text.as_str(), ""),
        };
        let head = head.trim().to_lowercase();
        if !labels.contains(&head.as_str()) {
            continue;
        }
        if !value.is_empty() {
            return Some(value.to_string());
        }
        let right = cells
            .iter()
            .filter(|c| c.address.row == cell.address.row && c.address.col > cell.address.col)
            .min_by_key(|c| c.address.col);
        if let Some(right) = right {
            return Some(right.text.clone());
        }
    }
    None
}

fn season_text(cells: &[TitleCell]) -> Option<String> {
    for cell in cells {
        let lowered = cell.text.to_lowercase();
        if lowered.split_whitespace().any(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == "season") {
            return Some(cell.text.clone());
        }
    }
    cells
        .iter()
        .filter(|c| c.date.is_none() && classify::find_dates(&c.text).is_empty())
        .find_map(|c| YEAR_SPAN_RE.find(&c.text).map(|m| m.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratesheet_model::RawWorksheet;

    fn extract(sheet: &RawWorksheet, excluded: &[CellRange]) -> ExtractedMetadata {
        let config = EngineConfig::default();
        let grid = CellGrid::build(sheet);
        MetadataExtractor::new(&config).extract(&grid, excluded, &[])
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_label_value_name() {
        let sheet = RawWorksheet::from_strings(
            "Sheet1",
            &[
                vec!["Resort: Coral Bay", ""],
                vec!["Destination", "Maldives"],
                vec!["Rates in USD", ""],
            ],
        );
        let meta = extract(&sheet, &[]);
        assert_eq!(meta.resort_name, "Coral Bay");
        assert_eq!(meta.destination.as_deref(), Some("Maldives"));
        assert_eq!(meta.currency, "USD");
        assert!(meta.currency_from_sheet());
    }

    #[test]
    fn test_merged_title_before_sheet_name() {
        let sheet = RawWorksheet::from_strings(
            "Blue Lagoon",
            &[vec!["Sunset Cove Collection", "", ""], vec!["", "Jan", "Feb"]],
        )
        .with_merge(CellRange::from_bounds(0, 0, 0, 2));
        let meta = extract(&sheet, &[CellRange::from_bounds(1, 0, 1, 2)]);
        assert_eq!(meta.resort_name, "Sunset Cove Collection");
    }

    #[test]
    fn test_property_keyword_cell() {
        let sheet = RawWorksheet::from_strings(
            "Rates 2026",
            &[vec!["Contract rates", "Azure Beach Hotel & Spa"], vec!["", ""]],
        );
        assert_eq!(extract(&sheet, &[]).resort_name, "Azure Beach Hotel & Spa");
    }

    #[test]
    fn test_sheet_name_fallback() {
        let sheet = RawWorksheet::from_strings("Paradise Resort", &[vec!["", "Jan"], vec!["2N", "100"]]);
        let meta = extract(&sheet, &[CellRange::from_bounds(0, 0, 1, 1)]);
        assert_eq!(meta.resort_name, "Paradise Resort");
        assert_eq!(meta.currency, "USD");
        assert!(!meta.currency_from_sheet());
    }

    #[test]
    fn test_generic_sheet_names() {
        for name in ["Sheet1", "sheet 2", "Rates", "Pricing", "Rates 2026", "Tabelle1", "3"] {
            assert!(GENERIC_SHEET_RE.is_match(name), "{} should be generic", name);
        }
        assert!(!GENERIC_SHEET_RE.is_match("Paradise Resort"));
    }

    #[test]
    fn test_first_row_fallback() {
        let sheet = RawWorksheet::from_strings("Sheet1", &[vec!["Sunset Villas", ""], vec!["", ""]]);
        assert_eq!(extract(&sheet, &[]).resort_name, "Sunset Villas");
    }

    #[test]
    fn test_no_name_anywhere() {
        let sheet = RawWorksheet::from_strings("Sheet1", &[vec!["", "Jan"], vec!["2N", "100"]]);
        let meta = extract(&sheet, &[CellRange::from_bounds(0, 0, 1, 1)]);
        assert_eq!(meta.resort_name, "");
    }

    #[test]
    fn test_validity_window_and_season() {
        let sheet = RawWorksheet::from_strings(
            "Sheet1",
            &[
                vec!["Paradise Resort", ""],
                vec!["Season 2025/26", ""],
                vec!["Valid 01/11/2025", "31/10/2026"],
            ],
        );
        let meta = extract(&sheet, &[]);
        assert_eq!(meta.season.as_deref(), Some("Season 2025/26"));
        assert_eq!(meta.valid_from, Some(date(2025, 11, 1)));
        assert_eq!(meta.valid_to, Some(date(2026, 10, 31)));
        assert!(meta.issues.is_empty());
    }

    #[test]
    fn test_inverted_validity_is_unset_with_warning() {
        let sheet = RawWorksheet::from_strings(
            "Sheet1",
            &[vec!["Paradise Resort", "Valid 2026-10-31 to 2025-11-01"]],
        );
        let meta = extract(&sheet, &[]);
        assert!(meta.valid_from.is_none());
        assert_eq!(meta.issues.len(), 1);
        assert_eq!(meta.issues[0].code, "VALIDITY_UNRESOLVED");
        assert_eq!(meta.issues[0].location.as_ref().unwrap().cell.as_deref(), Some("B1"));
    }

    #[test]
    fn test_mixed_currencies_reported() {
        let sheet = RawWorksheet::from_strings(
            "Coral Bay Resort",
            &[vec!["Rates in EUR", "Transfers in USD"]],
        );
        let meta = extract(&sheet, &[]);
        assert_eq!(meta.currency, "EUR");
        assert_eq!(meta.currencies_seen, vec!["EUR".to_string(), "USD".to_string()]);
    }
}
