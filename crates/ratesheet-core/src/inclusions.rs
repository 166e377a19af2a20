//! Inclusions parser
//!
//! Turns the free text of an inclusions block into clean items. Suppliers
//! write these blocks as bullet lists, one item per row, or a single run-on
//! sentence; the parser picks a splitting mode for the whole block:
//!
//! 1. bullet or numbering markers anywhere → split on markers, lines starting
//!    lowercase continue the previous item
//! 2. otherwise one item per line
//! 3. a block that is a single line → split on `;` or `. `, then on commas
//!    when there are at least two
//!
//! Accommodation-type sub-headers ("Deluxe Villa:") open a per-type group and
//! an exclusions heading routes the items after it to the exclusions list.

use once_cell::sync::Lazy;
use ratesheet_model::{CellAddress, InclusionGroup, IssueLocation, ProcessingError};
use regex::Regex;
use tracing::debug;

use crate::classify;
use crate::layout::{heading_kind, Heading, InclusionsSection};

static MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:[•·▪◦●○■□►▸➢➤✓✔☐\-\*\+>~]+|\(?\d{1,2}[.)]|\(?[A-Za-z][.)])(?:\s+|$)|^\s*[•·▪◦●○■□►▸➢➤✓✔]")
        .unwrap()
});

static SENTENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r";|\.\s+").unwrap());

/// First words that make a colon-less line a heading
const HEADING_LEADS: &[&str] = &[
    "inclusions", "inclusion", "includes", "included", "exclusions", "exclusion", "excludes",
    "excluded", "not", "what's", "whats", "package", "rate", "rates", "benefits", "terms",
    "conditions", "cancellation", "notes", "note", "remarks", "important", "payment", "policy",
    "policies", "child",
];

/// Parsed inclusions block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedInclusions {
    /// Items not tied to an accommodation type
    pub general: Vec<String>,
    pub groups: Vec<InclusionGroup>,
    /// `Some` once an exclusions heading was seen
    pub exclusions: Option<Vec<String>>,
    pub issues: Vec<ProcessingError>,
}

impl ParsedInclusions {
    /// Every item, general first, then each group in order
    pub fn all_items(&self) -> Vec<String> {
        let mut items = self.general.clone();
        for group in &self.groups {
            items.extend(group.items.iter().cloned());
        }
        items
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Target {
    General,
    Group(usize),
    Exclusions,
}

#[derive(Debug)]
struct RawItem {
    target: Target,
    text: String,
    address: CellAddress,
}

#[derive(Debug)]
struct SourceLine {
    text: String,
    address: CellAddress,
    marker: bool,
}

/// Parses inclusions blocks with a configured placeholder list
pub struct InclusionsParser<'a> {
    placeholders: &'a [String],
}

impl<'a> InclusionsParser<'a> {
    pub fn new(placeholders: &'a [String]) -> Self {
        Self { placeholders }
    }

    pub fn parse(&self, section: &InclusionsSection, sheet: &str) -> ParsedInclusions {
        let lines: Vec<SourceLine> = section
            .lines
            .iter()
            .flat_map(|line| {
                line.text.lines().filter(|t| !t.trim().is_empty()).map(move |t| SourceLine {
                    text: t.trim().to_string(),
                    address: line.address,
                    marker: MARKER_RE.is_match(t),
                })
            })
            .collect();

        let bullet_mode = lines.iter().any(|l| l.marker);
        let content_lines = lines
            .iter()
            .filter(|l| l.marker || block_heading(&l.text).is_none())
            .count();

        let mut parsed = ParsedInclusions::default();
        let mut raw: Vec<RawItem> = Vec::new();
        let mut target = Target::General;

        for line in &lines {
            if line.marker {
                let content = MARKER_RE.replace(&line.text, "").trim().to_string();
                if content.is_empty() {
                    parsed.issues.push(
                        ProcessingError::info("INCLUSION_BLANK", "Empty bullet discarded")
                            .with_location(IssueLocation::cell(sheet, line.address)),
                    );
                } else {
                    raw.push(RawItem {
                        target,
                        text: content,
                        address: line.address,
                    });
                }
                continue;
            }

            if let Some((heading, rest)) = block_heading(&line.text) {
                match heading {
                    Heading::Terminating => break,
                    Heading::Exclusions => {
                        target = Target::Exclusions;
                        parsed.exclusions.get_or_insert_with(Vec::new);
                    }
                    Heading::Inclusions => target = Target::General,
                }
                if !rest.is_empty() {
                    self.push_split(&mut raw, target, &rest, line.address);
                }
                continue;
            }

            if target != Target::Exclusions {
                if let Some(kind) = self.type_sub_header(&line.text, bullet_mode) {
                    let index = match parsed.groups.iter().position(|g| g.accommodation_type == kind) {
                        Some(index) => index,
                        None => {
                            parsed.groups.push(InclusionGroup {
                                accommodation_type: kind,
                                items: Vec::new(),
                            });
                            parsed.groups.len() - 1
                        }
                    };
                    target = Target::Group(index);
                    continue;
                }
            }

            let continues = line.text.chars().next().is_some_and(char::is_lowercase);
            if bullet_mode {
                match raw.last_mut() {
                    Some(last) if continues && last.target == target => {
                        last.text.push(' ');
                        last.text.push_str(&line.text);
                    }
                    _ => raw.push(RawItem {
                        target,
                        text: line.text.clone(),
                        address: line.address,
                    }),
                }
            } else if content_lines == 1 {
                self.push_split(&mut raw, target, &line.text, line.address);
            } else {
                raw.push(RawItem {
                    target,
                    text: line.text.clone(),
                    address: line.address,
                });
            }
        }

        self.finish(raw, &mut parsed, sheet);
        debug!(
            general = parsed.general.len(),
            groups = parsed.groups.len(),
            exclusions = parsed.exclusions.as_ref().map_or(0, Vec::len),
            "inclusions parsed"
        );
        parsed
    }

    fn push_split(&self, raw: &mut Vec<RawItem>, target: Target, text: &str, address: CellAddress) {
        for piece in split_sentences(text) {
            raw.push(RawItem {
                target,
                text: piece,
                address,
            });
        }
    }

    /// A short line naming an accommodation type that opens a group
    fn type_sub_header(&self, text: &str, bullet_mode: bool) -> Option<String> {
        let has_colon = text.trim_end().ends_with(':');
        if !has_colon && !bullet_mode {
            return None;
        }
        let name = text.trim().trim_end_matches(':').trim();
        if name.split_whitespace().count() > 5 {
            return None;
        }
        let matched = classify::classify_accommodation_type(name);
        if matched.confidence > 0.6 {
            matched.label
        } else {
            None
        }
    }

    fn finish(&self, raw: Vec<RawItem>, parsed: &mut ParsedInclusions, sheet: &str) {
        for item in raw {
            let text = clean_item(&item.text);
            let location = IssueLocation::cell(sheet, item.address);
            if text.is_empty() {
                parsed.issues.push(
                    ProcessingError::info("INCLUSION_BLANK", "Empty inclusion discarded")
                        .with_location(location),
                );
                continue;
            }
            if self.is_placeholder(&text) {
                parsed.issues.push(
                    ProcessingError::info(
                        "INCLUSION_PLACEHOLDER",
                        format!("Placeholder '{}' discarded", text),
                    )
                    .with_location(location),
                );
                continue;
            }

            let list = match item.target {
                Target::General => &mut parsed.general,
                Target::Group(index) => &mut parsed.groups[index].items,
                Target::Exclusions => parsed.exclusions.get_or_insert_with(Vec::new),
            };
            if list.iter().any(|existing| existing.eq_ignore_ascii_case(&text)) {
                parsed.issues.push(
                    ProcessingError::info("INCLUSION_DUPLICATE", format!("Repeated item '{}' dropped", text))
                        .with_location(location),
                );
                continue;
            }
            list.push(text);
        }
    }

    fn is_placeholder(&self, text: &str) -> bool {
        text.chars().all(|c| !c.is_alphanumeric())
            || self
                .placeholders
                .iter()
                .any(|p| p.trim().eq_ignore_ascii_case(text))
    }
}

/// A heading line inside the block, with any text after its colon
fn block_heading(text: &str) -> Option<(Heading, String)> {
    let kind = heading_kind(text)?;
    if let Some((_, rest)) = text.split_once(':') {
        return Some((kind, rest.trim().to_string()));
    }
    let lead = text
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_lowercase()
        .replace('\u{2019}', "'");
    let lead = lead.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'');
    let short = text.split_whitespace().count() <= 3;
    (short && HEADING_LEADS.contains(&lead)).then(|| (kind, String::new()))
}

fn split_sentences(text: &str) -> Vec<String> {
    let pieces: Vec<String> = SENTENCE_RE
        .split(text)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if pieces.len() > 1 {
        return pieces;
    }
    if text.matches(',').count() >= 2 {
        return text
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
    }
    vec![text.trim().to_string()]
}

fn clean_item(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(|c: char| matches!(c, ';' | ',' | '.') || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InclusionSettings;
    use crate::layout::InclusionLine;
    use ratesheet_model::CellRange;

    fn section(texts: &[&str]) -> InclusionsSection {
        let lines: Vec<InclusionLine> = texts
            .iter()
            .enumerate()
            .map(|(row, t)| InclusionLine {
                address: CellAddress::new(row + 10, 0),
                text: t.to_string(),
            })
            .collect();
        InclusionsSection {
            bounds: CellRange::from_bounds(10, 0, 10 + texts.len().saturating_sub(1), 0),
            heading: None,
            lines,
        }
    }

    fn parse(texts: &[&str]) -> ParsedInclusions {
        let settings = InclusionSettings::default();
        InclusionsParser::new(&settings.placeholders).parse(&section(texts), "Rates")
    }

    #[test]
    fn test_bullets_with_blank_and_placeholder() {
        let parsed = parse(&["• Breakfast\n• Transfers\n- \nTBC"]);
        assert_eq!(parsed.general, vec!["Breakfast", "Transfers"]);
        assert_eq!(parsed.issues.len(), 2);
        assert!(parsed
            .issues
            .iter()
            .all(|i| i.severity == ratesheet_model::Severity::Info));
        assert!(parsed.exclusions.is_none());
    }

    #[test]
    fn test_continuation_joins_previous_item() {
        let parsed = parse(&["- Daily breakfast buffet\n  served at the beach club\n- Wifi"]);
        assert_eq!(
            parsed.general,
            vec!["Daily breakfast buffet served at the beach club", "Wifi"]
        );
    }

    #[test]
    fn test_numbered_items() {
        let parsed = parse(&["1. Return speedboat transfers", "2) Welcome drink", "3. Spa credit."]);
        assert_eq!(
            parsed.general,
            vec!["Return speedboat transfers", "Welcome drink", "Spa credit"]
        );
    }

    #[test]
    fn test_one_item_per_line() {
        let parsed = parse(&["Daily breakfast", "Airport transfers", "n/a"]);
        assert_eq!(parsed.general, vec!["Daily breakfast", "Airport transfers"]);
        assert_eq!(parsed.issues[0].code, "INCLUSION_PLACEHOLDER");
    }

    #[test]
    fn test_single_line_sentence_split() {
        let parsed = parse(&["Daily breakfast; sunset cruise. Free wifi"]);
        assert_eq!(parsed.general, vec!["Daily breakfast", "sunset cruise", "Free wifi"]);
    }

    #[test]
    fn test_single_line_comma_split() {
        let parsed = parse(&["Breakfast, dinner, airport transfers"]);
        assert_eq!(parsed.general, vec!["Breakfast", "dinner", "airport transfers"]);

        let parsed = parse(&["Breakfast, dinner"]);
        assert_eq!(parsed.general, vec!["Breakfast, dinner"]);
    }

    #[test]
    fn test_type_groups() {
        let parsed = parse(&[
            "Welcome drink",
            "Deluxe Room:",
            "Breakfast",
            "Pool Villa:",
            "Half board",
            "Private butler",
        ]);
        assert_eq!(parsed.general, vec!["Welcome drink"]);
        assert_eq!(parsed.groups.len(), 2);
        assert_eq!(parsed.groups[0].accommodation_type, "Deluxe Room");
        assert_eq!(parsed.groups[0].items, vec!["Breakfast"]);
        assert_eq!(parsed.groups[1].items, vec!["Half board", "Private butler"]);
        assert_eq!(
            parsed.all_items(),
            vec!["Welcome drink", "Breakfast", "Half board", "Private butler"]
        );
    }

    #[test]
    fn test_exclusions_heading_routes_items() {
        let parsed = parse(&[
            "Breakfast",
            "Transfers",
            "Not included:",
            "Green tax",
            "Terms & Conditions",
            "Rates are per night",
        ]);
        assert_eq!(parsed.general, vec!["Breakfast", "Transfers"]);
        assert_eq!(parsed.exclusions, Some(vec!["Green tax".to_string()]));
    }

    #[test]
    fn test_item_mentioning_included_is_not_a_heading() {
        let parsed = parse(&["Breakfast included", "Wifi"]);
        assert_eq!(parsed.general, vec!["Breakfast included", "Wifi"]);
        assert!(parsed.exclusions.is_none());
    }

    #[test]
    fn test_duplicates_dropped() {
        let parsed = parse(&["Breakfast", "breakfast", "Wifi"]);
        assert_eq!(parsed.general, vec!["Breakfast", "Wifi"]);
        assert_eq!(parsed.issues[0].code, "INCLUSION_DUPLICATE");
    }

    #[test]
    fn test_inline_exclusions_content() {
        let parsed = parse(&["Breakfast", "Exclusions: green tax; visa fees"]);
        assert_eq!(parsed.general, vec!["Breakfast"]);
        assert_eq!(
            parsed.exclusions,
            Some(vec!["green tax".to_string(), "visa fees".to_string()])
        );
    }
}
