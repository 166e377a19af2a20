//! Price values and normalized pricing records

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// English month names, index 0 = January
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A price that is either a number or explicitly unavailable
///
/// A blank source cell is `Unavailable`; the numeral `0` is `Amount(0.0)`.
/// The two are never conflated. On the wire the price is a JSON number or the
/// string `"unavailable"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Price {
    Amount(f64),
    Unavailable,
}

impl Price {
    pub fn amount(&self) -> Option<f64> {
        match self {
            Price::Amount(v) => Some(*v),
            Price::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Price::Amount(_))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Amount(v) => write!(f, "{}", v),
            Price::Unavailable => write!(f, "unavailable"),
        }
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Price::Amount(v) => serializer.serialize_f64(*v),
            Price::Unavailable => serializer.serialize_str("unavailable"),
        }
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(f64),
            Text(String),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Number(v) => Ok(Price::Amount(v)),
            Wire::Text(s) if s == "unavailable" => Ok(Price::Unavailable),
            Wire::Text(s) => Err(serde::de::Error::custom(format!(
                "expected a number or \"unavailable\", got \"{}\"",
                s
            ))),
        }
    }
}

/// One extracted price cell before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCell {
    pub value: Price,
    pub currency: String,
    pub is_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<NaiveDate>,
}

impl PriceCell {
    pub fn amount(value: f64, currency: impl Into<String>) -> Self {
        Self {
            value: Price::Amount(value),
            currency: currency.into(),
            is_available: true,
            notes: None,
            valid_from: None,
            valid_to: None,
        }
    }

    pub fn unavailable(currency: impl Into<String>) -> Self {
        Self {
            value: Price::Unavailable,
            currency: currency.into(),
            is_available: false,
            notes: None,
            valid_from: None,
            valid_to: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A pricing period: a calendar month or a named special period
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Period {
    Month {
        /// 1 = January
        month: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        year: Option<i32>,
    },
    Special {
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<NaiveDate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<NaiveDate>,
    },
}

impl Period {
    pub fn month(month: u32) -> Self {
        Period::Month { month, year: None }
    }

    /// Display label used as the record's `month` value
    pub fn label(&self) -> String {
        match self {
            Period::Month { month, year } => {
                let name = MONTH_NAMES
                    .get((*month as usize).wrapping_sub(1))
                    .copied()
                    .unwrap_or("Unknown");
                match year {
                    Some(y) => format!("{} {}", name, y),
                    None => name.to_string(),
                }
            }
            Period::Special { label, .. } => label.clone(),
        }
    }

    pub fn is_special(&self) -> bool {
        matches!(self, Period::Special { .. })
    }

    #[allow(clippy::type_complexity)]
    fn sort_key(&self) -> (u8, Option<i32>, u32, String, Option<NaiveDate>, Option<NaiveDate>) {
        match self {
            Period::Month { month, year } => (0, *year, *month, String::new(), None, None),
            Period::Special { label, from, to } => (1, None, 0, label.to_lowercase(), *from, *to),
        }
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.label().cmp(&other.label()))
    }
}

/// Identity of a record; unique within one parse result
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    pub period: Period,
    pub accommodation_type: String,
    pub nights: Option<u32>,
    pub pax: Option<u32>,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.period.label(), self.accommodation_type)?;
        if let Some(n) = self.nights {
            write!(f, " / {}N", n)?;
        }
        if let Some(p) = self.pax {
            write!(f, " / {} pax", p)?;
        }
        Ok(())
    }
}

/// The normalized, flat pricing unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRecord {
    /// Calendar month label or special-period label
    pub month: String,
    pub accommodation_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nights: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pax: Option<u32>,
    pub price: Price,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_to: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PricingRecord {
    /// Build a record from its key and source price cell
    pub fn from_cell(key: &RecordKey, cell: &PriceCell) -> Self {
        let (special_period, from, to) = match &key.period {
            Period::Special { label, from, to } => (Some(label.clone()), *from, *to),
            Period::Month { .. } => (None, None, None),
        };
        Self {
            month: key.period.label(),
            accommodation_type: key.accommodation_type.clone(),
            nights: key.nights,
            pax: key.pax,
            price: cell.value,
            currency: cell.currency.clone(),
            special_period,
            valid_from: cell.valid_from.or(from),
            valid_to: cell.valid_to.or(to),
            notes: cell.notes.clone(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.price.is_available()
    }
}
