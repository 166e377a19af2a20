//! Layout analyzer
//!
//! Finds the line of period headers (months or named special periods), the
//! header band around it, the pricing body and the inclusions block.
//!
//! Detection runs on a [`GridView`]. In the non-transposed view a line is a
//! sheet row, so a row of month headers is a months-in-columns layout; in the
//! transposed view a line is a sheet column, so a column of months is a
//! months-in-rows layout. Everything after candidate selection works on the
//! chosen view only and never needs to know which orientation it is.

use std::collections::HashSet;

use chrono::Datelike;
use ratesheet_model::{
    CellAddress, CellRange, DetectionResult, IssueLocation, LayoutPattern, Orientation, Period,
    ProcessingError, RawValue,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classify::{self, NightsPaxMatch, NumberFormat, TypeMatch};
use crate::config::EngineConfig;
use crate::grid::{CellGrid, GridView};

const INCLUSION_HEADINGS: &[&str] = &[
    "inclusions",
    "inclusion",
    "included",
    "includes",
    "include",
    "package benefits",
    "benefits",
];

const EXCLUSION_HEADINGS: &[&str] = &[
    "exclusions",
    "exclusion",
    "not included",
    "excludes",
    "excluded",
];

const TERMINATING_HEADINGS: &[&str] = &[
    "terms",
    "conditions",
    "cancellation",
    "notes",
    "note",
    "remarks",
    "policy",
    "policies",
    "payment",
    "important",
    "child policy",
];

/// Blank rows that end an inclusions block
const INCLUSIONS_BLANK_RUN: usize = 2;

/// Caller-supplied corrections for a second extraction pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOverride {
    pub orientation: Option<Orientation>,
    /// Sheet row (months in columns) or sheet column (months in rows) of the period headers
    pub header_index: Option<usize>,
    pub default_accommodation_type: Option<String>,
}

/// Kind of section heading found in a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    Inclusions,
    Exclusions,
    Terminating,
}

/// Classify a cell as a section heading
///
/// Only the part before a colon is considered, and only when it is short, so
/// "Inclusions: breakfast, transfers" is a heading with trailing content.
pub fn heading_kind(text: &str) -> Option<Heading> {
    let head = text.split(':').next().unwrap_or_default();
    let head = head
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
        .replace('\'', "");
    let words: Vec<&str> = head.split_whitespace().collect();
    if words.is_empty() || words.len() > 5 {
        return None;
    }
    let joined = words.join(" ");
    let has = |list: &[&str]| list.iter().any(|k| phrase_in(&joined, k));

    if has(EXCLUSION_HEADINGS) {
        Some(Heading::Exclusions)
    } else if has(INCLUSION_HEADINGS) {
        Some(Heading::Inclusions)
    } else if has(TERMINATING_HEADINGS) {
        Some(Heading::Terminating)
    } else {
        None
    }
}

fn phrase_in(haystack: &str, phrase: &str) -> bool {
    haystack
        .split(' ')
        .collect::<Vec<_>>()
        .windows(phrase.split(' ').count())
        .any(|w| w.join(" ") == phrase)
}

/// Coordinates contributed by one header field or one body line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisLabel {
    pub period: Option<Period>,
    pub accommodation_type: Option<String>,
    pub nights: Option<u32>,
    pub pax: Option<u32>,
}

impl AxisLabel {
    pub fn is_empty(&self) -> bool {
        self.period.is_none()
            && self.accommodation_type.is_none()
            && self.nights.is_none()
            && self.pax.is_none()
    }
}

/// A pricing column of the oriented view
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderField {
    /// Field index in the view
    pub field: usize,
    /// Period header cell
    pub address: CellAddress,
    pub label: AxisLabel,
}

/// A pricing line of the oriented view
#[derive(Debug, Clone, PartialEq)]
pub struct BodyLine {
    pub line: usize,
    /// Accommodation type already includes any sub-header carried down
    pub label: AxisLabel,
}

/// The located pricing block
#[derive(Debug, Clone, PartialEq)]
pub struct PricingSection {
    /// Header band plus body plus label fields, in sheet coordinates
    pub bounds: CellRange,
    pub transposed: bool,
    pub period_line: usize,
    pub fields: Vec<HeaderField>,
    pub lines: Vec<BodyLine>,
    /// Distinct accommodation types, in order of appearance
    pub accommodation_types: Vec<String>,
    /// Distinct nights/pax options, in order of appearance
    pub nights_pax: Vec<(Option<u32>, Option<u32>)>,
    pub default_type: String,
    /// Sheet cell of each line's type sub-header, when one applied
    pub sub_headers: Vec<CellAddress>,
}

impl PricingSection {
    /// Resolve the record coordinate for a body line and a header field
    ///
    /// A period given on the line (mixed layouts) overrides the field period.
    pub fn key_for(&self, line: &BodyLine, field: &HeaderField) -> ratesheet_model::RecordKey {
        let period = line
            .label
            .period
            .clone()
            .or_else(|| field.label.period.clone())
            .unwrap_or_else(|| Period::month(1));
        ratesheet_model::RecordKey {
            period,
            accommodation_type: line
                .label
                .accommodation_type
                .clone()
                .or_else(|| field.label.accommodation_type.clone())
                .unwrap_or_else(|| self.default_type.clone()),
            nights: line.label.nights.or(field.label.nights),
            pax: line.label.pax.or(field.label.pax),
        }
    }

    /// True when no header names an accommodation type
    pub fn uses_default_type(&self) -> bool {
        self.accommodation_types.is_empty()
    }

    /// (type, nights) combinations named by the headers
    pub fn advertised_combinations(&self) -> Vec<(String, Option<u32>)> {
        let mut combos: Vec<(String, Option<u32>)> = Vec::new();
        for line in &self.lines {
            for field in &self.fields {
                let explicit_type = line.label.accommodation_type.is_some()
                    || field.label.accommodation_type.is_some();
                let key = self.key_for(line, field);
                if !explicit_type && key.nights.is_none() {
                    continue;
                }
                let combo = (key.accommodation_type, key.nights);
                if !combos.contains(&combo) {
                    combos.push(combo);
                }
            }
        }
        combos
    }
}

/// One line of the inclusions block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InclusionLine {
    pub address: CellAddress,
    pub text: String,
}

/// The located inclusions block
#[derive(Debug, Clone, PartialEq)]
pub struct InclusionsSection {
    pub bounds: CellRange,
    pub heading: Option<CellAddress>,
    /// Non-blank cell texts, top to bottom then left to right
    pub lines: Vec<InclusionLine>,
}

/// Everything the analyzer found in one grid
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutAnalysis {
    pub detection: DetectionResult,
    pub pricing: Option<PricingSection>,
    pub inclusions: Option<InclusionsSection>,
    /// Layout-level issues (not per record)
    pub issues: Vec<ProcessingError>,
}

/// Classifier output for one authoritative cell
#[derive(Debug, Clone, Default)]
struct CellClass {
    period: Option<(Period, f64)>,
    kind: TypeMatch,
    nights_pax: NightsPaxMatch,
    numeric: bool,
    words: usize,
}

impl CellClass {
    fn classify(value: &RawValue, format: NumberFormat) -> Self {
        match value {
            RawValue::Empty => Self::default(),
            RawValue::Number(_) => Self {
                numeric: true,
                words: 1,
                ..Default::default()
            },
            RawValue::Bool(_) => Self {
                words: 1,
                ..Default::default()
            },
            RawValue::Date(date) => Self {
                // Month headers stored as real dates are the first of the month
                period: (date.day() == 1).then(|| {
                    (
                        Period::Month {
                            month: date.month(),
                            year: Some(date.year()),
                        },
                        0.85,
                    )
                }),
                words: 1,
                ..Default::default()
            },
            RawValue::Text(text) => {
                let text = text.trim();
                let month = classify::classify_month(text);
                let special = classify::classify_special_period(text);
                let period = match (month.month, special.label) {
                    (Some(m), _) if month.confidence >= special.confidence => Some((
                        Period::Month {
                            month: m,
                            year: month.year,
                        },
                        month.confidence,
                    )),
                    (_, Some(label)) => {
                        let (from, to) = special.date_range.unzip();
                        Some((Period::Special { label, from, to }, special.confidence))
                    }
                    _ => None,
                };
                Self {
                    period,
                    kind: classify::classify_accommodation_type(text),
                    nights_pax: classify::classify_nights_pax(text),
                    numeric: classify::parse_amount(text, format).is_some(),
                    words: text.split_whitespace().count(),
                }
            }
        }
    }

    fn header_confidence(&self) -> f64 {
        let period = self.period.as_ref().map_or(0.0, |(_, c)| *c);
        let nights_pax = if self.nights_pax.nights.is_some() || self.nights_pax.pax.is_some() {
            self.nights_pax.confidence
        } else {
            0.0
        };
        period.max(self.kind.confidence).max(nights_pax)
    }
}

/// Per-anchor classification of a whole grid
struct ClassTable {
    width: usize,
    cells: Vec<CellClass>,
}

impl ClassTable {
    fn build(grid: &CellGrid, format: NumberFormat) -> Self {
        let width = grid.width();
        let mut cells = vec![CellClass::default(); grid.height() * width];
        for row in 0..grid.height() {
            for col in 0..width {
                if grid.anchor(row, col) == CellAddress::new(row, col) {
                    cells[row * width + col] = CellClass::classify(grid.value(row, col), format);
                }
            }
        }
        Self { width, cells }
    }

    fn at(&self, view: &GridView<'_>, line: usize, field: usize) -> &CellClass {
        let a = view.anchor(line, field);
        &self.cells[a.row * self.width + a.col]
    }
}

/// One period-header hypothesis
#[derive(Debug, Clone)]
struct Candidate {
    transposed: bool,
    line: usize,
    band: (usize, usize),
    fields: Vec<HeaderField>,
    period_count: usize,
    score: f64,
    confidence: f64,
    headers: Vec<String>,
}

#[derive(Debug)]
enum LineKind {
    Blank,
    Stop,
    SubHeader(String),
    Price(AxisLabel),
}

/// Scans a grid for its layout
pub struct LayoutAnalyzer<'a> {
    config: &'a EngineConfig,
    format: NumberFormat,
}

impl<'a> LayoutAnalyzer<'a> {
    pub fn new(config: &'a EngineConfig, format: NumberFormat) -> Self {
        Self { config, format }
    }

    fn accepts(&self, confidence: f64) -> bool {
        confidence > self.config.detection.classifier_threshold
    }

    /// Detect layout and locate the pricing and inclusions sections
    pub fn analyze(&self, grid: &CellGrid, overrides: Option<&LayoutOverride>) -> LayoutAnalysis {
        let sheet = grid.name().to_string();
        let mut issues = Vec::new();

        if grid.is_empty() {
            issues.push(
                ProcessingError::warning("EMPTY_SHEET", "Worksheet has no content")
                    .with_location(IssueLocation::sheet(&sheet)),
            );
            return LayoutAnalysis {
                detection: DetectionResult::empty(),
                pricing: None,
                inclusions: None,
                issues,
            };
        }

        let table = ClassTable::build(grid, self.format);
        let scan = self.config.detection.scan_limit;
        let mut candidates = Vec::new();
        for transposed in [false, true] {
            let view = grid.view(transposed);
            for line in 0..view.lines().min(scan) {
                if let Some(candidate) = self.candidate(&view, &table, line) {
                    candidates.push(candidate);
                }
            }
        }

        candidates.sort_by(|a, b| {
            b.period_count
                .cmp(&a.period_count)
                .then_with(|| b.score.total_cmp(&a.score))
                .then_with(|| b.transposed.cmp(&a.transposed))
                .then_with(|| a.line.cmp(&b.line))
        });

        let chosen = self.choose(grid, &table, &mut candidates, overrides, &mut issues);
        let Some(primary) = chosen else {
            issues.push(
                ProcessingError::warning(
                    "LAYOUT_NOT_DETECTED",
                    "No month or special-period headers were found",
                )
                .with_location(IssueLocation::sheet(&sheet))
                .with_suggestion("Supply a layout override naming the header row or column"),
            );
            let inclusions = self.locate_inclusions(grid, &table, None);
            let mut detection = DetectionResult::empty();
            detection.inclusions_bounds = inclusions.as_ref().map(|s| s.bounds);
            return LayoutAnalysis {
                detection,
                pricing: None,
                inclusions,
                issues,
            };
        };

        let view = grid.view(primary.transposed);
        let default_type = overrides
            .and_then(|o| o.default_accommodation_type.clone())
            .unwrap_or_else(|| self.config.defaults.accommodation_type.clone());
        let pricing = self.pricing_section(&view, &table, &primary, default_type);

        let mixed = pricing.lines.iter().any(|l| l.label.period.is_some());
        let orientation = if mixed {
            Orientation::Mixed
        } else if primary.transposed {
            Orientation::MonthsInRows
        } else {
            Orientation::MonthsInColumns
        };
        let pattern = self.pattern(&view, &primary, orientation);

        let max_secondary = self.config.detection.max_secondary;
        let mut rest: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| c.period_count >= 2)
            .filter(|c| {
                c.transposed != primary.transposed
                    || c.line < primary.band.0
                    || c.line > primary.band.1
            })
            .collect();
        rest.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| b.period_count.cmp(&a.period_count))
        });
        let secondary: Vec<LayoutPattern> = rest
            .into_iter()
            .take(max_secondary)
            .map(|c| {
                let v = grid.view(c.transposed);
                let orientation = if c.transposed {
                    Orientation::MonthsInRows
                } else {
                    Orientation::MonthsInColumns
                };
                self.pattern(&v, c, orientation)
            })
            .collect();

        let low_confidence = primary.confidence < self.config.detection.layout_confidence_threshold;
        if low_confidence {
            let alternatives = if secondary.is_empty() {
                "no alternative layouts were found".to_string()
            } else {
                let listed: Vec<String> = secondary
                    .iter()
                    .map(|p| {
                        format!(
                            "{} at {} ({:.2})",
                            p.orientation,
                            p.header_band.to_a1(),
                            p.confidence
                        )
                    })
                    .collect();
                format!("alternatives: {}", listed.join(", "))
            };
            issues.push(
                ProcessingError::warning(
                    "LAYOUT_LOW_CONFIDENCE",
                    format!(
                        "Layout {} detected with confidence {:.2}; {}",
                        orientation, primary.confidence, alternatives
                    ),
                )
                .with_location(IssueLocation::range(&sheet, pattern.header_band))
                .with_suggestion("Review the detected header band or supply a layout override"),
            );
        }

        let inclusions = self.locate_inclusions(grid, &table, Some(pricing.bounds));

        info!(
            sheet = %sheet,
            orientation = %orientation,
            confidence = primary.confidence,
            lines = pricing.lines.len(),
            fields = pricing.fields.len(),
            "layout detected"
        );

        let detection = DetectionResult {
            confidence: primary.confidence,
            primary: Some(pattern),
            secondary,
            low_confidence,
            pricing_bounds: Some(pricing.bounds),
            inclusions_bounds: inclusions.as_ref().map(|s| s.bounds),
        };

        LayoutAnalysis {
            detection,
            pricing: Some(pricing),
            inclusions,
            issues,
        }
    }

    /// Pick the primary candidate, honoring any override
    fn choose(
        &self,
        grid: &CellGrid,
        table: &ClassTable,
        candidates: &mut Vec<Candidate>,
        overrides: Option<&LayoutOverride>,
        issues: &mut Vec<ProcessingError>,
    ) -> Option<Candidate> {
        let forced_view = overrides.and_then(|o| match o.orientation {
            Some(Orientation::MonthsInRows) => Some(true),
            Some(Orientation::MonthsInColumns) => Some(false),
            Some(Orientation::Mixed) | None => None,
        });
        let header_index = overrides.and_then(|o| o.header_index);

        if forced_view.is_some() || header_index.is_some() {
            let position = candidates.iter().position(|c| {
                forced_view.map_or(true, |t| c.transposed == t)
                    && header_index.map_or(true, |i| c.line == i)
            });
            if let Some(pos) = position {
                debug!(line = candidates[pos].line, "layout override applied");
                return Some(candidates.remove(pos));
            }
            if let Some(index) = header_index {
                let transposed = forced_view
                    .or_else(|| candidates.first().map(|c| c.transposed))
                    .unwrap_or(false);
                let view = grid.view(transposed);
                if let Some(forced) = self.forced_candidate(&view, table, index) {
                    return Some(forced);
                }
            }
            issues.push(
                ProcessingError::warning(
                    "OVERRIDE_IGNORED",
                    "Layout override does not match any period header line",
                )
                .with_location(IssueLocation::sheet(grid.name())),
            );
        }

        if candidates.is_empty() {
            None
        } else {
            Some(candidates.remove(0))
        }
    }

    fn forced_candidate(&self, view: &GridView<'_>, table: &ClassTable, line: usize) -> Option<Candidate> {
        if line >= view.lines() {
            return None;
        }
        self.candidate(view, table, line)
    }

    /// Evaluate one line as the period header line
    fn candidate(&self, view: &GridView<'_>, table: &ClassTable, line: usize) -> Option<Candidate> {
        let scan = self.config.detection.scan_limit;
        let field_limit = view.fields().min(scan);

        let mut direct: Vec<(usize, Period, f64)> = Vec::new();
        for f in 0..field_limit {
            if let Some((period, conf)) = &table.at(view, line, f).period {
                if self.accepts(*conf) {
                    direct.push((f, period.clone(), *conf));
                }
            }
        }
        let first = direct.first()?.0;

        let mut top = line;
        while top > 0 && self.is_header_line(view, table, top - 1, first) {
            top -= 1;
        }
        let mut bottom = line;
        while bottom + 1 < view.lines() && self.is_header_line(view, table, bottom + 1, first) {
            bottom += 1;
        }

        let mut fields: Vec<HeaderField> = Vec::new();
        let mut carry: Option<(Period, CellAddress)> = None;
        let mut next_direct = direct.iter().peekable();
        for f in first..field_limit {
            if let Some((_, period, _)) = next_direct.next_if(|(df, _, _)| *df == f) {
                let address = view.anchor(line, f);
                carry = Some((period.clone(), address));
                fields.push(self.header_field(view, table, (top, bottom), line, f, period.clone(), address));
            } else if view.is_blank(line, f) {
                // A blank period cell inherits from the left when sub-headers continue
                let supported = (top..=bottom).any(|l| {
                    l != line && !view.is_blank(l, f) && self.accepts(table.at(view, l, f).header_confidence())
                });
                let inherited = if supported { carry.clone() } else { None };
                match inherited {
                    Some((period, address)) => {
                        fields.push(self.header_field(view, table, (top, bottom), line, f, period, address));
                    }
                    None => carry = None,
                }
            } else {
                carry = None;
            }
        }
        fields.last()?;

        let mut seen = HashSet::new();
        let mut total = 0usize;
        let mut classified = 0usize;
        let mut headers = Vec::new();
        for l in top..=bottom {
            for f in first..field_limit {
                if view.is_blank(l, f) || !seen.insert(view.anchor(l, f)) {
                    continue;
                }
                total += 1;
                if self.accepts(table.at(view, l, f).header_confidence()) {
                    classified += 1;
                    headers.push(view.text(l, f));
                }
            }
        }
        let confidence = if total == 0 {
            0.0
        } else {
            (classified as f64 / total as f64).clamp(0.0, 1.0)
        };

        let mut anchors = HashSet::new();
        let mut period_count = 0;
        let mut score = 0.0;
        for (f, _, conf) in &direct {
            if anchors.insert(view.anchor(line, *f)) {
                period_count += 1;
                score += conf;
            }
        }

        Some(Candidate {
            transposed: view.is_transposed(),
            line,
            band: (top, bottom),
            fields,
            period_count,
            score,
            confidence,
            headers,
        })
    }

    /// A line of sub-headers next to the period line
    fn is_header_line(&self, view: &GridView<'_>, table: &ClassTable, line: usize, first: usize) -> bool {
        let field_limit = view.fields().min(self.config.detection.scan_limit);
        let grid = view.grid();
        let mut seen = HashSet::new();
        let mut total = 0usize;
        let mut headerish = 0usize;
        for f in first..field_limit {
            if view.is_blank(line, f) || !seen.insert(view.anchor(line, f)) {
                continue;
            }
            let class = table.at(view, line, f);
            if class.numeric {
                return false;
            }
            total += 1;
            let address = view.address(line, f);
            let spans_labels = first > 0
                && grid
                    .merge_at(address.row, address.col)
                    .is_some_and(|m| m.contains(view.address(line, first - 1)));
            if !spans_labels && self.accepts(class.header_confidence()) {
                headerish += 1;
            }
        }
        total > 0 && headerish * 2 >= total
    }

    #[allow(clippy::too_many_arguments)]
    fn header_field(
        &self,
        view: &GridView<'_>,
        table: &ClassTable,
        band: (usize, usize),
        line: usize,
        field: usize,
        period: Period,
        address: CellAddress,
    ) -> HeaderField {
        let mut label = AxisLabel {
            period: Some(period),
            ..Default::default()
        };
        // Nearest sub-header to the body wins
        for l in (band.0..=band.1).rev() {
            if l == line || view.is_blank(l, field) {
                continue;
            }
            let class = table.at(view, l, field);
            if label.accommodation_type.is_none() && self.accepts(class.kind.confidence) {
                label.accommodation_type = class.kind.label.clone();
            }
            if self.accepts(class.nights_pax.confidence) {
                label.nights = label.nights.or(class.nights_pax.nights);
                label.pax = label.pax.or(class.nights_pax.pax);
            }
        }
        HeaderField {
            field,
            address,
            label,
        }
    }

    /// True when a label cell is really a title merged across the period line
    fn is_title_merge(&self, view: &GridView<'_>, candidate: &Candidate, line: usize, field: usize) -> bool {
        let address = view.address(line, field);
        view.grid()
            .merge_at(address.row, address.col)
            .is_some_and(|m| m.contains(view.address(candidate.line, field)))
    }

    /// Labels of a body line, with the texts they came from
    fn line_label(
        &self,
        view: &GridView<'_>,
        table: &ClassTable,
        candidate: &Candidate,
        line: usize,
    ) -> (AxisLabel, Vec<String>) {
        let first = candidate.fields[0].field;
        let mut label = AxisLabel::default();
        let mut texts = Vec::new();
        for f in 0..first {
            if view.is_blank(line, f) || self.is_title_merge(view, candidate, line, f) {
                continue;
            }
            texts.push(view.text(line, f));
            let class = table.at(view, line, f);
            if let Some((period, conf)) = &class.period {
                if self.accepts(*conf) && label.period.is_none() {
                    label.period = Some(period.clone());
                    continue;
                }
            }
            if label.accommodation_type.is_none() && self.accepts(class.kind.confidence) {
                label.accommodation_type = class.kind.label.clone();
            }
            if self.accepts(class.nights_pax.confidence) {
                label.nights = label.nights.or(class.nights_pax.nights);
                label.pax = label.pax.or(class.nights_pax.pax);
            }
        }
        (label, texts)
    }

    fn line_kind(&self, view: &GridView<'_>, table: &ClassTable, candidate: &Candidate, line: usize) -> LineKind {
        let (label, label_texts) = self.line_label(view, table, candidate, line);

        let mut body_texts: Vec<(CellAddress, String)> = Vec::new();
        let mut has_numeric = false;
        let mut has_prose = false;
        for field in &candidate.fields {
            if view.is_blank(line, field.field) {
                continue;
            }
            let class = table.at(view, line, field.field);
            if class.numeric {
                has_numeric = true;
            } else if class.words > 4 {
                has_prose = true;
            }
            body_texts.push((view.anchor(line, field.field), view.text(line, field.field)));
        }

        if label_texts.is_empty() && body_texts.is_empty() {
            return LineKind::Blank;
        }

        let first_text = label_texts
            .first()
            .or_else(|| body_texts.first().map(|(_, t)| t));
        if !has_numeric && first_text.and_then(|t| heading_kind(t)).is_some() {
            return LineKind::Stop;
        }

        if let Some(kind) = &label.accommodation_type {
            let type_only = label.nights.is_none() && label.pax.is_none() && label.period.is_none();
            let body_repeats_label = body_texts.iter().all(|(_, t)| label_texts.contains(t));
            if type_only
                && !has_numeric
                && body_repeats_label
                && self.next_is_nights_pax_only(view, table, candidate, line)
            {
                return LineKind::SubHeader(kind.clone());
            }
        }

        if label.is_empty() && label_texts.is_empty() && !has_numeric {
            let anchors: HashSet<CellAddress> = body_texts.iter().map(|(a, _)| *a).collect();
            if anchors.len() == 1 {
                let (anchor, _) = &body_texts[0];
                let class = &table.cells[anchor.row * table.width + anchor.col];
                if self.accepts(class.kind.confidence) {
                    if let Some(kind) = &class.kind.label {
                        return LineKind::SubHeader(kind.clone());
                    }
                }
            }
        }

        if has_prose {
            return LineKind::Stop;
        }
        if has_numeric || !label.is_empty() {
            return LineKind::Price(label);
        }
        LineKind::Stop
    }

    fn next_is_nights_pax_only(
        &self,
        view: &GridView<'_>,
        table: &ClassTable,
        candidate: &Candidate,
        line: usize,
    ) -> bool {
        for next in line + 1..view.lines() {
            let (label, texts) = self.line_label(view, table, candidate, next);
            let body_blank = candidate.fields.iter().all(|f| view.is_blank(next, f.field));
            if texts.is_empty() && body_blank {
                continue;
            }
            return (label.nights.is_some() || label.pax.is_some()) && label.accommodation_type.is_none();
        }
        false
    }

    fn pricing_section(
        &self,
        view: &GridView<'_>,
        table: &ClassTable,
        candidate: &Candidate,
        default_type: String,
    ) -> PricingSection {
        let max_gap = self.config.detection.max_blank_gap;
        let mut lines = Vec::new();
        let mut sub_headers = Vec::new();
        let mut sticky: Option<(String, CellAddress)> = None;
        let mut gap = 0usize;

        for line in candidate.band.1 + 1..view.lines() {
            match self.line_kind(view, table, candidate, line) {
                LineKind::Blank => {
                    gap += 1;
                    if gap > max_gap {
                        break;
                    }
                }
                LineKind::Stop => {
                    debug!(line, "pricing block ends at non-pricing line");
                    break;
                }
                LineKind::SubHeader(kind) => {
                    gap = 0;
                    let first_text = (0..view.fields()).find(|f| !view.is_blank(line, *f)).unwrap_or(0);
                    sticky = Some((kind, view.anchor(line, first_text)));
                }
                LineKind::Price(mut label) => {
                    gap = 0;
                    if label.accommodation_type.is_none() {
                        if let Some((kind, address)) = &sticky {
                            label.accommodation_type = Some(kind.clone());
                            sub_headers.push(*address);
                        }
                    }
                    lines.push(BodyLine { line, label });
                }
            }
        }

        let first_field = candidate.fields[0].field;
        let last_field = candidate.fields.last().map_or(first_field, |f| f.field);
        let last_line = lines.last().map_or(candidate.band.1, |l: &BodyLine| l.line);
        let label_start = (0..first_field)
            .find(|f| {
                lines.iter().any(|l| {
                    !view.is_blank(l.line, *f) && !self.is_title_merge(view, candidate, l.line, *f)
                })
            })
            .unwrap_or(first_field);
        let bounds = view.range(candidate.band.0, label_start, last_line, last_field);

        let mut section = PricingSection {
            bounds,
            transposed: candidate.transposed,
            period_line: candidate.line,
            fields: candidate.fields.clone(),
            lines,
            accommodation_types: Vec::new(),
            nights_pax: Vec::new(),
            default_type,
            sub_headers,
        };

        let mut types = Vec::new();
        let mut nights_pax = Vec::new();
        for line in &section.lines {
            for field in &section.fields {
                if let Some(kind) = line
                    .label
                    .accommodation_type
                    .as_ref()
                    .or(field.label.accommodation_type.as_ref())
                {
                    if !types.contains(kind) {
                        types.push(kind.clone());
                    }
                }
                let np = (
                    line.label.nights.or(field.label.nights),
                    line.label.pax.or(field.label.pax),
                );
                if np != (None, None) && !nights_pax.contains(&np) {
                    nights_pax.push(np);
                }
            }
        }
        section.accommodation_types = types;
        section.nights_pax = nights_pax;

        debug!(
            bounds = %section.bounds,
            types = section.accommodation_types.len(),
            options = section.nights_pax.len(),
            "pricing section located"
        );
        section
    }

    fn pattern(&self, view: &GridView<'_>, candidate: &Candidate, orientation: Orientation) -> LayoutPattern {
        let first = candidate.fields[0].field;
        let last = candidate.fields.last().map_or(first, |f| f.field);
        LayoutPattern {
            orientation,
            header_band: view.range(candidate.band.0, first, candidate.band.1, last),
            confidence: candidate.confidence,
            detected_headers: candidate.headers.clone(),
        }
    }

    /// Find the inclusions block, in sheet rows
    fn locate_inclusions(
        &self,
        grid: &CellGrid,
        table: &ClassTable,
        pricing: Option<CellRange>,
    ) -> Option<InclusionsSection> {
        let outside = |addr: CellAddress| pricing.map_or(true, |p| !p.contains(addr));
        let after_row = pricing.map(|p| p.end.row);

        let mut headings = Vec::new();
        for row in 0..grid.height() {
            for (addr, text) in grid.row_texts(row, 0) {
                if outside(addr) && heading_kind(&text) == Some(Heading::Inclusions) {
                    headings.push((addr, text));
                }
            }
        }
        let heading = headings
            .iter()
            .find(|(a, _)| after_row.map_or(true, |r| a.row > r))
            .or_else(|| headings.first())
            .cloned();

        let (start_row, start_col, mut lines, heading_addr) = match heading {
            Some((addr, text)) => {
                let mut lines = Vec::new();
                if let Some((_, rest)) = text.split_once(':') {
                    if !rest.trim().is_empty() {
                        lines.push(InclusionLine {
                            address: addr,
                            text: rest.trim().to_string(),
                        });
                    }
                }
                for (a, t) in grid.row_texts(addr.row, addr.col + 1) {
                    if outside(a) {
                        lines.push(InclusionLine { address: a, text: t });
                    }
                }
                (addr.row + 1, addr.col, lines, Some(addr))
            }
            None => {
                let from = after_row? + 1;
                let row = (from..grid.height()).find(|r| !grid.row_is_blank(*r))?;
                let texts = grid.row_texts(row, 0);
                let numeric = texts.iter().any(|(a, _)| self.numeric_at(grid, table, *a));
                let terminating = texts
                    .first()
                    .is_some_and(|(_, t)| heading_kind(t) == Some(Heading::Terminating));
                if numeric || terminating {
                    return None;
                }
                let col = texts.first().map_or(0, |(a, _)| a.col);
                (row, col, Vec::new(), None)
            }
        };

        let mut blank_run = 0usize;
        for row in start_row..grid.height() {
            let texts: Vec<(CellAddress, String)> = grid
                .row_texts(row, start_col)
                .into_iter()
                .filter(|(a, _)| {
                    outside(*a) && Some(*a) != heading_addr && lines.iter().all(|l| l.address != *a)
                })
                .collect();
            if texts.is_empty() {
                blank_run += 1;
                if blank_run >= INCLUSIONS_BLANK_RUN {
                    break;
                }
                continue;
            }
            blank_run = 0;
            if texts.iter().any(|(a, _)| self.numeric_at(grid, table, *a)) {
                break;
            }
            if heading_kind(&texts[0].1) == Some(Heading::Terminating) {
                break;
            }
            lines.extend(texts.into_iter().map(|(address, text)| InclusionLine { address, text }));
        }

        if lines.is_empty() && heading_addr.is_none() {
            return None;
        }

        let mut bounds = heading_addr.map(CellRange::single);
        for line in &lines {
            let single = CellRange::single(line.address);
            bounds = Some(bounds.map_or(single, |b| b.union(&single)));
        }
        let bounds = bounds?;
        debug!(bounds = %bounds, lines = lines.len(), "inclusions section located");

        Some(InclusionsSection {
            bounds,
            heading: heading_addr,
            lines,
        })
    }

    fn numeric_at(&self, grid: &CellGrid, table: &ClassTable, address: CellAddress) -> bool {
        let anchor = grid.anchor(address.row, address.col);
        table.cells[anchor.row * table.width + anchor.col].numeric
    }
}
