//! Content classifier
//!
//! Stateless matchers that score a cell's text as a month header, an
//! accommodation type, a nights/pax fragment, a currency marker or a special
//! period. Every matcher returns a confidence in `0.0..=1.0` instead of a
//! boolean; unmatched text scores 0. Nothing here panics on odd input.
//!
//! The module also owns number and date parsing, since both depend on the
//! same currency and month vocabulary.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::grid::CellGrid;

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z\x{00C0}-\x{024F}]+|\d+").unwrap());

static NIGHTS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})\s*(?:n|nts?|nights?|nites?)\b|\bnights?\s*[:=]?\s*(\d{1,3})\b")
        .unwrap()
});

static PAX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,3})\s*(?:pax|px|persons?|people|adults?|guests?|ppl)\b|\b(?:pax|persons?|adults?|guests?)\s*[:=x]?\s*(\d{1,3})\b",
    )
    .unwrap()
});

static NIGHTS_PAX_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:nights?|nts|pax|persons?|adults?|guests?|occupancy|stay)\b").unwrap()
});

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        (?P<iso>\b\d{4}-\d{1,2}-\d{1,2}\b)
        | (?P<num>\b\d{1,2}[/.]\d{1,2}[/.]\d{2,4}\b)
        | (?P<dmy>\b\d{1,2}(?:st|nd|rd|th)?(?:\s+|-)[a-z]{3,9}\.?,?(?:\s+|-)\d{2,4}\b)
        | (?P<mdy>\b[a-z]{3,9}\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4}\b)
        | (?P<dm>\b\d{1,2}(?:st|nd|rd|th)?[\s-]+[a-z]{3,9}\b)
        ",
    )
    .unwrap()
});

/// A two-digit year marked as one: "Jan-26", "Jan '26", "Jan/26"
static SHORT_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z.]\s*['\x{2019}/-]\s*\d{2}\s*$").unwrap());

static SEPT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bsept\b").unwrap());

static ORDINAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").unwrap());

static PRICE_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\s*(?:pppn|ppn|pp|pn|p/p|p/n|per\s+(?:person|night|room|villa|pax|unit)|nett?|\+\+|/-)\.?\s*$",
    )
    .unwrap()
});

static NUMERIC_BODY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d[\d.,' \x{00A0}\x{202F}]*$|^[+-]?[.,]\d+$").unwrap());

static COMMA_DECIMAL_CUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d\.\d{3},\d{1,2}\b|^\D*\d{1,3},\d{1,2}\D*$").unwrap());

static POINT_DECIMAL_CUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d,\d{3}\.\d{1,2}\b|^\D*\d+\.\d{1,2}\D*$").unwrap());

/// Full month names and their common aliases
const MONTH_ALIASES: &[(&str, u32, bool)] = &[
    ("january", 1, true),
    ("jan", 1, false),
    ("february", 2, true),
    ("feb", 2, false),
    ("march", 3, true),
    ("mar", 3, false),
    ("april", 4, true),
    ("apr", 4, false),
    ("may", 5, true),
    ("june", 6, true),
    ("jun", 6, false),
    ("july", 7, true),
    ("jul", 7, false),
    ("august", 8, true),
    ("aug", 8, false),
    ("september", 9, true),
    ("sept", 9, false),
    ("sep", 9, false),
    ("october", 10, true),
    ("oct", 10, false),
    ("november", 11, true),
    ("nov", 11, false),
    ("december", 12, true),
    ("dec", 12, false),
];

/// Words that name a kind of unit on their own
const TYPE_NOUNS: &[&str] = &[
    "room", "rooms", "suite", "suites", "villa", "villas", "bungalow", "bungalows", "studio",
    "studios", "chalet", "chalets", "apartment", "apartments", "apt", "cabin", "cabins",
    "lodge", "cottage", "cottages", "penthouse", "residence", "loft", "hut", "cabana",
    "duplex", "house", "tent", "dorm", "pavilion", "overwater", "accommodation", "unit",
];

/// Qualifiers that usually form part of a type name
const TYPE_QUALIFIERS: &[&str] = &[
    "deluxe", "standard", "superior", "premium", "family", "junior", "executive", "classic",
    "luxury", "beachfront", "garden", "ocean", "sea", "pool", "lagoon", "twin", "double",
    "single", "triple", "king", "queen", "presidential", "honeymoon", "grand", "royal",
];

/// Header words describing the type axis rather than naming a type
const TYPE_AXIS_HEADERS: &[&str] = &[
    "room type",
    "room types",
    "accommodation",
    "accommodation type",
    "room category",
    "category",
    "unit type",
    "villa type",
];

/// Named periods commonly priced separately
const SPECIAL_PERIOD_KEYWORDS: &[&str] = &[
    "easter",
    "christmas",
    "xmas",
    "new year",
    "nye",
    "festive",
    "peak",
    "high season",
    "low season",
    "shoulder",
    "green season",
    "golden week",
    "chinese new year",
    "cny",
    "ramadan",
    "eid",
    "diwali",
    "thanksgiving",
    "school holiday",
    "holidays",
    "season",
    "blackout",
];

/// ISO 4217 codes recognized in sheet text
pub const KNOWN_CURRENCIES: &[&str] = &[
    "AED", "AUD", "BRL", "CAD", "CHF", "CNY", "CZK", "DKK", "EUR", "FJD", "GBP", "HKD", "IDR",
    "INR", "JPY", "KES", "KRW", "LKR", "MUR", "MVR", "MXN", "MYR", "NOK", "NZD", "OMR", "PHP",
    "PLN", "QAR", "SAR", "SCR", "SEK", "SGD", "THB", "TRY", "TZS", "USD", "VND", "XPF", "ZAR",
];

/// Multi-character symbols, checked before single-character ones
const PREFIXED_DOLLARS: &[(&str, &str)] = &[
    ("US$", "USD"),
    ("AU$", "AUD"),
    ("A$", "AUD"),
    ("NZ$", "NZD"),
    ("SG$", "SGD"),
    ("S$", "SGD"),
    ("HK$", "HKD"),
    ("R$", "BRL"),
    ("C$", "CAD"),
];

const SYMBOLS: &[(char, &str)] = &[
    ('€', "EUR"),
    ('£', "GBP"),
    ('¥', "JPY"),
    ('₹', "INR"),
    ('฿', "THB"),
    ('₱', "PHP"),
    ('₫', "VND"),
    ('₩', "KRW"),
    ('$', "USD"),
];

/// Word-form symbols that must stand alone or touch a number
const WORD_SYMBOLS: &[(&str, &str)] = &[("rp", "IDR"), ("rm", "MYR"), ("rs", "INR")];

/// Currencies whose suppliers usually write a decimal comma
const COMMA_CURRENCIES: &[&str] = &["EUR", "IDR", "BRL", "VND", "TRY", "DKK", "NOK", "SEK", "CZK", "PLN"];

/// Result of [`classify_month`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MonthMatch {
    /// 1 = January
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub confidence: f64,
}

/// Result of [`classify_accommodation_type`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeMatch {
    /// Cleaned type label; `None` for axis headers such as "Room Type"
    pub label: Option<String>,
    pub confidence: f64,
}

/// Result of [`classify_nights_pax`]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NightsPaxMatch {
    pub nights: Option<u32>,
    pub pax: Option<u32>,
    pub confidence: f64,
}

/// Result of [`classify_special_period`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecialPeriodMatch {
    pub label: Option<String>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub confidence: f64,
}

fn words(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

fn month_alias(word: &str) -> Option<(u32, bool)> {
    MONTH_ALIASES
        .iter()
        .find(|(alias, _, _)| *alias == word)
        .map(|(_, m, full)| (*m, *full))
}

/// A bare two-digit number is a day of the month unless `marked`
fn year_token(word: &str, marked: bool) -> Option<i32> {
    if !word.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let value: i32 = word.parse().ok()?;
    match word.len() {
        4 if (1990..=2100).contains(&value) => Some(value),
        2 if marked => Some(2000 + value),
        _ => None,
    }
}

/// Score a cell as a calendar month header
///
/// ```
/// use ratesheet_core::classify::classify_month;
///
/// assert_eq!(classify_month("JANUARY").month, Some(1));
/// assert_eq!(classify_month("Sept").month, Some(9));
/// assert_eq!(classify_month("Jan 2026").year, Some(2026));
/// assert_eq!(classify_month("Breakfast").confidence, 0.0);
/// ```
pub fn classify_month(text: &str) -> MonthMatch {
    let tokens = words(text);
    if tokens.is_empty() || tokens.len() > 6 {
        return MonthMatch::default();
    }

    let months: Vec<(usize, u32, bool)> = tokens
        .iter()
        .enumerate()
        .filter_map(|(i, w)| month_alias(w).map(|(m, full)| (i, m, full)))
        .collect();
    let Some(&(pos, month, full)) = months.first() else {
        return MonthMatch::default();
    };

    // "Jan - Mar" names a range, which is a special period
    if months.iter().any(|(_, m, _)| *m != month) {
        return MonthMatch {
            month: Some(month),
            year: None,
            confidence: 0.3,
        };
    }

    let others: Vec<&String> = tokens
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != pos)
        .map(|(_, w)| w)
        .collect();
    let base = if full { 1.0 } else { 0.9 };

    match others.as_slice() {
        [] => MonthMatch {
            month: Some(month),
            year: None,
            confidence: base,
        },
        [single] => match year_token(single, pos == 0 && SHORT_YEAR_RE.is_match(text)) {
            Some(year) => MonthMatch {
                month: Some(month),
                year: Some(year),
                confidence: base - 0.05,
            },
            None => MonthMatch {
                month: Some(month),
                year: None,
                confidence: 0.3,
            },
        },
        _ => MonthMatch {
            month: Some(month),
            year: None,
            confidence: 0.3,
        },
    }
}

/// Remove nights/pax fragments from a label
fn strip_nights_pax(text: &str) -> String {
    let stripped = NIGHTS_RE.replace_all(text, " ");
    let stripped = PAX_RE.replace_all(&stripped, " ");
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c.is_whitespace() || "/-:|,()[]".contains(c))
        .to_string()
}

/// Score a cell as an accommodation type name
pub fn classify_accommodation_type(text: &str) -> TypeMatch {
    let label = strip_nights_pax(text);
    if label.is_empty() {
        return TypeMatch::default();
    }
    let tokens = words(&label);
    if tokens.is_empty() || tokens.iter().any(|w| month_alias(w).is_some()) {
        return TypeMatch::default();
    }

    let lowered = label.to_lowercase();
    if TYPE_AXIS_HEADERS.contains(&lowered.as_str()) {
        return TypeMatch {
            label: None,
            confidence: 0.7,
        };
    }

    let has_noun = tokens.iter().any(|w| TYPE_NOUNS.contains(&w.as_str()));
    let has_qualifier = tokens.iter().any(|w| TYPE_QUALIFIERS.contains(&w.as_str()));
    let mut confidence = match (has_noun, has_qualifier) {
        (true, _) => 0.9,
        (false, true) => 0.75,
        (false, false) => return TypeMatch::default(),
    };
    if tokens.len() > 6 {
        confidence *= 0.5;
    }

    TypeMatch {
        label: Some(label),
        confidence,
    }
}

fn capture_number(re: &Regex, text: &str) -> Option<u32> {
    let caps = re.captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .and_then(|m| m.as_str().parse().ok())
}

/// Score a cell as a nights and/or pax header fragment
///
/// Combined tokens such as `3N/2PAX` yield both values.
pub fn classify_nights_pax(text: &str) -> NightsPaxMatch {
    let nights = capture_number(&NIGHTS_RE, text);
    let pax = capture_number(&PAX_RE, text);

    let mut confidence = match (nights, pax) {
        (Some(_), Some(_)) => 0.95,
        (Some(_), None) | (None, Some(_)) => 0.85,
        (None, None) if NIGHTS_PAX_KEYWORD_RE.is_match(text) => 0.5,
        (None, None) => 0.0,
    };
    if words(text).len() > 6 {
        confidence *= 0.6;
    }

    NightsPaxMatch {
        nights,
        pax,
        confidence,
    }
}

/// Detect a currency symbol or ISO code, returning the ISO code
pub fn classify_currency(text: &str) -> Option<&'static str> {
    find_currencies(text).into_iter().next()
}

/// Every distinct currency mentioned in the text, in order of appearance
pub fn find_currencies(text: &str) -> Vec<&'static str> {
    fn push(found: &mut Vec<(usize, &'static str)>, pos: usize, code: &'static str) {
        if !found.iter().any(|(_, c)| *c == code) {
            found.push((pos, code));
        }
    }

    let mut found: Vec<(usize, &'static str)> = Vec::new();
    let mut masked = text.to_string();
    for (symbol, code) in PREFIXED_DOLLARS {
        if let Some(pos) = masked.to_uppercase().find(symbol) {
            push(&mut found, pos, code);
            masked = replace_ignore_case(&masked, symbol);
        }
    }

    let trimmed = text.trim();
    for m in WORD_RE.find_iter(text) {
        let word = m.as_str();
        let upper = word.to_uppercase();
        let is_code = word.len() == 3
            && (word.chars().all(|c| c.is_ascii_uppercase()) || trimmed.eq_ignore_ascii_case(word));
        if is_code {
            if let Some(code) = KNOWN_CURRENCIES.iter().find(|c| **c == upper) {
                push(&mut found, m.start(), code);
                continue;
            }
        }
        let lower = word.to_lowercase();
        if let Some((_, code)) = WORD_SYMBOLS.iter().find(|(s, _)| *s == lower) {
            let before = text[..m.start()].chars().last();
            let after = text[m.end()..].chars().find(|c| !c.is_whitespace());
            let touches_number = after.is_some_and(|c| c.is_ascii_digit())
                || before.is_some_and(|c| c.is_ascii_digit());
            if touches_number || trimmed.eq_ignore_ascii_case(word) {
                push(&mut found, m.start(), code);
            }
        }
    }

    for (pos, ch) in masked.char_indices() {
        if let Some((_, code)) = SYMBOLS.iter().find(|(s, _)| *s == ch) {
            push(&mut found, pos, code);
        }
    }

    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, code)| code).collect()
}

/// Score a cell as a named, possibly date-ranged, special period
pub fn classify_special_period(text: &str) -> SpecialPeriodMatch {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return SpecialPeriodMatch::default();
    }
    let tokens = words(trimmed);
    let lowered = tokens.join(" ");
    let dates = find_dates(trimmed);
    let date_range = match dates.as_slice() {
        [from, to, ..] => Some((*from, *to)),
        _ => None,
    };

    let keyword = SPECIAL_PERIOD_KEYWORDS
        .iter()
        .any(|k| contains_phrase(&lowered, k));
    let month_range = month_range(&tokens);

    let mut confidence = if keyword {
        0.9
    } else if date_range.is_some() {
        0.8
    } else if month_range.is_some() {
        0.75
    } else {
        return SpecialPeriodMatch::default();
    };
    if tokens.len() > 10 {
        confidence *= 0.4;
    }

    let stripped = strip_dates(trimmed);
    let label = if dates.is_empty() || stripped.is_empty() {
        trimmed.to_string()
    } else {
        stripped
    };

    let date_range = date_range.or_else(|| {
        let (first, last) = month_range?;
        let year = tokens.iter().find_map(|w| {
            if w.len() == 4 {
                year_token(w)
            } else {
                None
            }
        })?;
        month_span(first, last, year)
    });

    SpecialPeriodMatch {
        label: Some(label),
        date_range,
        confidence,
    }
}

fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack == phrase
        || haystack.starts_with(&format!("{} ", phrase))
        || haystack.ends_with(&format!(" {}", phrase))
        || haystack.contains(&format!(" {} ", phrase))
}

/// Two distinct month names, e.g. "Nov - Apr"
fn month_range(tokens: &[String]) -> Option<(u32, u32)> {
    let months: Vec<u32> = tokens.iter().filter_map(|w| month_alias(w)).map(|(m, _)| m).collect();
    match months.as_slice() {
        [first, last] if first != last => Some((*first, *last)),
        _ => None,
    }
}

fn month_span(first: u32, last: u32, year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let start_year = if first > last { year - 1 } else { year };
    let from = NaiveDate::from_ymd_opt(start_year, first, 1)?;
    let next = if last == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, last + 1, 1)?
    };
    Some((from, next.pred_opt()?))
}

/// Remove date expressions and the separators around them
fn strip_dates(text: &str) -> String {
    let stripped = DATE_RE.replace_all(text, " ");
    let cleaned: String = stripped
        .split_whitespace()
        .filter(|w| !matches!(w.to_lowercase().as_str(), "-" | "–" | "—" | "to" | "until" | "till" | "from"))
        .collect::<Vec<_>>()
        .join(" ");
    cleaned
        .trim_matches(|c: char| c.is_whitespace() || "-–—:,()[]".contains(c))
        .to_string()
}

/// Parse a single date in one of the common supplier spellings
///
/// Numeric dates are read day-first; month-first is tried when the day-first
/// reading is impossible.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let cleaned = ORDINAL_RE.replace_all(text.trim(), "$1");
    let cleaned = SEPT_RE.replace_all(&cleaned, "Sep").replace(',', " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    const FORMATS: &[&str] = &[
        "%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d.%m.%Y", "%d-%m-%Y", "%d/%m/%y", "%d.%m.%y",
        "%d %B %Y", "%d %b %Y", "%B %d %Y", "%b %d %Y", "%d-%b-%Y", "%d-%b-%y", "%d-%B-%Y",
        "%d %b %y",
    ];
    FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
        .find(|d| (1990..=2100).contains(&d.year()))
}

/// All dates in a text, in order
///
/// Dates written without a year ("20 Dec - 5 Jan 2026") borrow the year of
/// the next dated expression and roll back a year when that would put them
/// after it.
pub fn find_dates(text: &str) -> Vec<NaiveDate> {
    enum Found {
        Full(NaiveDate),
        Partial { day: u32, month: u32 },
    }

    let mut found = Vec::new();
    for caps in DATE_RE.captures_iter(text) {
        if let Some(m) = caps.name("dm") {
            let tokens = words(m.as_str());
            let day = tokens.first().and_then(|d| d.parse::<u32>().ok());
            let month = tokens.get(1).and_then(|w| month_alias(w)).map(|(m, _)| m);
            if let (Some(day), Some(month)) = (day, month) {
                found.push(Found::Partial { day, month });
            }
            continue;
        }
        if let Some(date) = caps.get(0).and_then(|m| parse_date(m.as_str())) {
            found.push(Found::Full(date));
        }
    }

    let mut dates = Vec::new();
    for (i, item) in found.iter().enumerate() {
        match item {
            Found::Full(date) => dates.push(*date),
            Found::Partial { day, month } => {
                let anchor = found[i + 1..]
                    .iter()
                    .find_map(|f| match f {
                        Found::Full(d) => Some(*d),
                        Found::Partial { .. } => None,
                    })
                    .or_else(|| dates.last().copied());
                let Some(anchor) = anchor else { continue };
                let Some(mut date) = NaiveDate::from_ymd_opt(anchor.year(), *month, *day) else {
                    continue;
                };
                if date > anchor && i + 1 < found.len() {
                    match NaiveDate::from_ymd_opt(anchor.year() - 1, *month, *day) {
                        Some(earlier) => date = earlier,
                        None => continue,
                    }
                }
                dates.push(date);
            }
        }
    }
    dates
}

/// Regional number format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberFormat {
    /// `1,234.56`
    #[default]
    DecimalPoint,
    /// `1.234,56`
    DecimalComma,
}

impl NumberFormat {
    fn decimal(self) -> char {
        match self {
            NumberFormat::DecimalPoint => '.',
            NumberFormat::DecimalComma => ',',
        }
    }
}

/// A number read from text, with any currency marker found beside it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedAmount {
    pub value: f64,
    pub currency: Option<&'static str>,
}

/// Parse a price written as text
///
/// Tolerates currency symbols and codes, thousands separators, per-unit
/// suffixes ("pp", "per night") and accounting negatives `(150)`.
pub fn parse_amount(text: &str, format: NumberFormat) -> Option<ParsedAmount> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let currency = classify_currency(trimmed);

    let mut body = PRICE_SUFFIX_RE.replace(trimmed, "").to_string();
    for (symbol, _) in PREFIXED_DOLLARS {
        body = replace_ignore_case(&body, symbol);
    }
    for (symbol, _) in SYMBOLS {
        body = body.replace(*symbol, " ");
    }
    for code in KNOWN_CURRENCIES {
        body = body.replace(code, " ");
    }
    for (word, _) in WORD_SYMBOLS {
        body = replace_ignore_case(&body, word);
    }
    let body = PRICE_SUFFIX_RE.replace(body.trim(), "");
    let mut body = body.trim().to_string();

    let mut negative = false;
    if body.starts_with('(') && body.ends_with(')') {
        negative = true;
        body = body[1..body.len() - 1].trim().to_string();
    }
    if !NUMERIC_BODY_RE.is_match(&body) {
        return None;
    }

    let value = parse_numeric_body(&body, format)?;
    Some(ParsedAmount {
        value: if negative { -value } else { value },
        currency,
    })
}

/// [`parse_amount`] without the currency
pub fn parse_number(text: &str, format: NumberFormat) -> Option<f64> {
    parse_amount(text, format).map(|a| a.value)
}

fn replace_ignore_case(text: &str, needle: &str) -> String {
    let upper = text.to_uppercase();
    let needle_upper = needle.to_uppercase();
    if upper.len() != text.len() || !upper.contains(&needle_upper) {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = 0;
    for (pos, _) in upper.match_indices(&needle_upper) {
        out.push_str(&text[rest..pos]);
        out.push_str(&" ".repeat(needle.len()));
        rest = pos + needle.len();
    }
    out.push_str(&text[rest..]);
    out
}

fn parse_numeric_body(body: &str, format: NumberFormat) -> Option<f64> {
    let (sign, digits) = match body.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", body.strip_prefix('+').unwrap_or(body)),
    };
    let compact: String = digits
        .chars()
        .filter(|c| !matches!(c, ' ' | '\'' | '\u{00A0}' | '\u{202F}'))
        .collect();

    let dots = compact.matches('.').count();
    let commas = compact.matches(',').count();
    let decimal = match (dots, commas) {
        (0, 0) => None,
        (_, 0) if dots > 1 => None,
        (0, _) if commas > 1 => None,
        (_, _) if dots > 0 && commas > 0 => {
            let last_dot = compact.rfind('.')?;
            let last_comma = compact.rfind(',')?;
            Some(if last_dot > last_comma { '.' } else { ',' })
        }
        _ => {
            let sep = if dots == 1 { '.' } else { ',' };
            let (before, after) = compact.split_once(sep)?;
            if after.len() == 3 && !before.is_empty() && before.len() <= 3 {
                (sep == format.decimal()).then_some(sep)
            } else {
                Some(sep)
            }
        }
    };

    let normalized: String = match decimal {
        Some(dec) => {
            let (int_part, frac) = compact.rsplit_once(dec)?;
            let int_digits: String = int_part.chars().filter(|c| c.is_ascii_digit()).collect();
            if frac.chars().any(|c| !c.is_ascii_digit()) {
                return None;
            }
            format!("{}{}.{}", sign, int_digits, frac)
        }
        None => {
            let int_digits: String = compact.chars().filter(|c| c.is_ascii_digit()).collect();
            format!("{}{}", sign, int_digits)
        }
    };
    normalized.parse().ok()
}

/// Infer the sheet's number format from textual numbers and currency cues
pub fn detect_number_format<'a>(
    texts: impl IntoIterator<Item = &'a str>,
    currency: Option<&str>,
) -> NumberFormat {
    let mut comma = 0usize;
    let mut point = 0usize;
    for text in texts {
        if COMMA_DECIMAL_CUE_RE.is_match(text) {
            comma += 1;
        }
        if POINT_DECIMAL_CUE_RE.is_match(text) {
            point += 1;
        }
    }
    if comma > point {
        NumberFormat::DecimalComma
    } else if point > comma {
        NumberFormat::DecimalPoint
    } else if currency.is_some_and(|c| COMMA_CURRENCIES.contains(&c)) {
        NumberFormat::DecimalComma
    } else {
        NumberFormat::DecimalPoint
    }
}

/// Number format for a whole grid
pub fn detect_grid_number_format(grid: &CellGrid, currency: Option<&str>) -> NumberFormat {
    let mut texts = Vec::new();
    for r in 0..grid.height() {
        for c in 0..grid.width() {
            if let Some(t) = grid.value(r, c).as_text() {
                if t.chars().any(|ch| ch.is_ascii_digit()) {
                    texts.push(t);
                }
            }
        }
    }
    detect_number_format(texts, currency)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_spellings() {
        for (text, month) in [
            ("Jan", 1),
            ("January", 1),
            ("JANUARY", 1),
            ("sept", 9),
            ("Sep", 9),
            ("  may ", 5),
            ("DEC.", 12),
        ] {
            let m = classify_month(text);
            assert_eq!(m.month, Some(month), "{}", text);
            assert!(m.confidence >= 0.9, "{}", text);
        }
    }

    #[test]
    fn test_month_with_year() {
        let m = classify_month("Jan-26");
        assert_eq!(m.month, Some(1));
        assert_eq!(m.year, Some(2026));
        assert_eq!(classify_month("March 2025").year, Some(2025));
        assert_eq!(classify_month("Jan '26").year, Some(2026));
        assert_eq!(classify_month("Feb/25").year, Some(2025));
        assert_eq!(classify_month("Dec. 26").year, None);
    }

    #[test]
    fn test_month_with_day_is_not_a_month_header() {
        for text in ["Jan 15", "15 Jan", "Jan 01", "26-Jan"] {
            let m = classify_month(text);
            assert_eq!(m.month, Some(1), "{}", text);
            assert_eq!(m.year, None, "{}", text);
            assert!(m.confidence < 0.5, "{}", text);
        }
    }

    #[test]
    fn test_month_in_sentence_is_weak() {
        assert!(classify_month("Rates may vary").confidence < 0.5);
        assert!(classify_month("Jan - Mar").confidence < 0.5);
        assert_eq!(classify_month("Breakfast daily").confidence, 0.0);
        assert_eq!(classify_month("").confidence, 0.0);
    }

    #[test]
    fn test_accommodation_types() {
        let m = classify_accommodation_type("Deluxe Ocean Villa");
        assert_eq!(m.label.as_deref(), Some("Deluxe Ocean Villa"));
        assert!(m.confidence >= 0.9);

        let m = classify_accommodation_type("Superior");
        assert!(m.confidence >= 0.7);

        let m = classify_accommodation_type("Garden Suite 3N/2PAX");
        assert_eq!(m.label.as_deref(), Some("Garden Suite"));

        assert_eq!(classify_accommodation_type("3N/2PAX").confidence, 0.0);
        assert_eq!(classify_accommodation_type("January").confidence, 0.0);
        assert_eq!(classify_accommodation_type("Breakfast").confidence, 0.0);
    }

    #[test]
    fn test_type_axis_header_has_no_label() {
        let m = classify_accommodation_type("Room Type");
        assert!(m.label.is_none());
        assert!(m.confidence > 0.6);
    }

    #[test]
    fn test_long_sentence_is_not_a_type() {
        let m = classify_accommodation_type("Daily breakfast for two served in the room");
        assert!(m.confidence < 0.6);
    }

    #[test]
    fn test_nights_pax_combined() {
        let m = classify_nights_pax("3N/2PAX");
        assert_eq!((m.nights, m.pax), (Some(3), Some(2)));
        assert!(m.confidence > 0.9);

        let m = classify_nights_pax("2 nights 2 adults");
        assert_eq!((m.nights, m.pax), (Some(2), Some(2)));

        let m = classify_nights_pax("Pax: 4");
        assert_eq!((m.nights, m.pax), (None, Some(4)));
        assert!(m.confidence > 0.8);

        let m = classify_nights_pax("7 Nights");
        assert_eq!(m.nights, Some(7));
    }

    #[test]
    fn test_nights_pax_keyword_only() {
        let m = classify_nights_pax("Nights / Pax");
        assert_eq!((m.nights, m.pax), (None, None));
        assert_eq!(m.confidence, 0.5);
        assert_eq!(classify_nights_pax("Breakfast").confidence, 0.0);
    }

    #[test]
    fn test_currency_detection() {
        assert_eq!(classify_currency("Rates in USD"), Some("USD"));
        assert_eq!(classify_currency("€ 150"), Some("EUR"));
        assert_eq!(classify_currency("US$ 200"), Some("USD"));
        assert_eq!(classify_currency("NZ$ 200"), Some("NZD"));
        assert_eq!(classify_currency("Rp 1.500.000"), Some("IDR"));
        assert_eq!(classify_currency("RM150"), Some("MYR"));
        assert_eq!(classify_currency("eur"), Some("EUR"));
        assert_eq!(classify_currency("Room rates"), None);
        assert_eq!(classify_currency("and the"), None);
    }

    #[test]
    fn test_find_multiple_currencies() {
        assert_eq!(find_currencies("USD / EUR"), vec!["USD", "EUR"]);
        assert_eq!(find_currencies("$100 or US$ 90"), vec!["USD"]);
    }

    #[test]
    fn test_special_period_keyword() {
        let m = classify_special_period("Easter");
        assert_eq!(m.label.as_deref(), Some("Easter"));
        assert!(m.confidence >= 0.9);

        let m = classify_special_period("Peak Season (20 Dec 2025 - 5 Jan 2026)");
        assert_eq!(m.label.as_deref(), Some("Peak Season"));
        assert_eq!(m.date_range, Some((date(2025, 12, 20), date(2026, 1, 5))));
    }

    #[test]
    fn test_special_period_partial_dates() {
        let m = classify_special_period("Festive 20 Dec - 5 Jan 2026");
        assert_eq!(m.date_range, Some((date(2025, 12, 20), date(2026, 1, 5))));
    }

    #[test]
    fn test_special_period_month_range() {
        let m = classify_special_period("Nov - Apr 2026");
        assert!(m.confidence >= 0.7);
        assert_eq!(m.date_range, Some((date(2025, 11, 1), date(2026, 4, 30))));
    }

    #[test]
    fn test_plain_month_is_not_special() {
        assert_eq!(classify_special_period("January").confidence, 0.0);
        assert_eq!(classify_special_period("150").confidence, 0.0);
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2025-04-01"), Some(date(2025, 4, 1)));
        assert_eq!(parse_date("01/04/2025"), Some(date(2025, 4, 1)));
        assert_eq!(parse_date("12/31/2025"), Some(date(2025, 12, 31)));
        assert_eq!(parse_date("1st April 2025"), Some(date(2025, 4, 1)));
        assert_eq!(parse_date("December 20, 2025"), Some(date(2025, 12, 20)));
        assert_eq!(parse_date("15-Sept-2025"), Some(date(2025, 9, 15)));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("32/13/2025"), None);
    }

    #[test]
    fn test_parse_number_formats() {
        let point = NumberFormat::DecimalPoint;
        let comma = NumberFormat::DecimalComma;
        assert_eq!(parse_number("1,234.50", point), Some(1234.5));
        assert_eq!(parse_number("1.234,50", point), Some(1234.5));
        assert_eq!(parse_number("150", point), Some(150.0));
        assert_eq!(parse_number("0", point), Some(0.0));
        assert_eq!(parse_number("1 500", point), Some(1500.0));
        assert_eq!(parse_number("1.500.000", point), Some(1_500_000.0));
        assert_eq!(parse_number("12,5", point), Some(12.5));
        assert_eq!(parse_number("1,234", point), Some(1234.0));
        assert_eq!(parse_number("1.234", point), Some(1.234));
        assert_eq!(parse_number("1.234", comma), Some(1234.0));
        assert_eq!(parse_number("1,234", comma), Some(1.234));
    }

    #[test]
    fn test_parse_amount_with_currency() {
        let a = parse_amount("€ 1.250,00", NumberFormat::DecimalComma).unwrap();
        assert_eq!(a.value, 1250.0);
        assert_eq!(a.currency, Some("EUR"));

        let a = parse_amount("USD 150 pp", NumberFormat::DecimalPoint).unwrap();
        assert_eq!(a.value, 150.0);
        assert_eq!(a.currency, Some("USD"));

        let a = parse_amount("(200)", NumberFormat::DecimalPoint).unwrap();
        assert_eq!(a.value, -200.0);
        assert!(a.currency.is_none());
    }

    #[test]
    fn test_non_numbers_rejected() {
        let point = NumberFormat::DecimalPoint;
        assert_eq!(parse_number("POA", point), None);
        assert_eq!(parse_number("on request", point), None);
        assert_eq!(parse_number("3N/2PAX", point), None);
        assert_eq!(parse_number("", point), None);
        assert_eq!(parse_number("2025-04-01", point), None);
    }

    #[test]
    fn test_detect_number_format() {
        assert_eq!(
            detect_number_format(["1.250,00", "980,50"], None),
            NumberFormat::DecimalComma
        );
        assert_eq!(
            detect_number_format(["1,250.00", "980.50"], None),
            NumberFormat::DecimalPoint
        );
        assert_eq!(detect_number_format([], Some("EUR")), NumberFormat::DecimalComma);
        assert_eq!(detect_number_format([], None), NumberFormat::DecimalPoint);
    }
}
