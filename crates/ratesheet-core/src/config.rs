//! Engine configuration
//!
//! Settings are plain serde structs with defaults for every field, so a
//! `ratesheet.toml` only needs the keys it wants to change:
//!
//! ```toml
//! [locale]
//! decimal_separator = ","
//!
//! [detection]
//! layout_confidence_threshold = 0.6
//!
//! [ranges]
//! max_price = 250000.0
//! max_pax = 12
//!
//! [inclusions]
//! placeholders = ["n/a", "tbc", "to be advised"]
//!
//! [defaults]
//! currency = "EUR"
//! accommodation_type = "Standard Room"
//! ```

use serde::{Deserialize, Serialize};

pub use ratesheet_validate::RangeSettings;

use crate::error::{ConfigError, Result};

/// Top-level engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub locale: LocaleSettings,
    pub detection: DetectionSettings,
    pub ranges: RangeSettings,
    pub inclusions: InclusionSettings,
    pub defaults: DefaultSettings,
}

impl EngineConfig {
    /// Parse and validate settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that make detection meaningless
    pub fn validate(&self) -> Result<()> {
        let d = &self.detection;
        for (name, value) in [
            ("layout_confidence_threshold", d.layout_confidence_threshold),
            ("classifier_threshold", d.classifier_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold {
                    name: name.to_string(),
                    value,
                });
            }
        }
        if d.scan_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "detection.scan_limit must be at least 1".to_string(),
            ));
        }

        let r = &self.ranges;
        if !(r.max_price > 0.0) {
            return Err(ConfigError::InvalidValue(format!(
                "ranges.max_price must be positive, got {}",
                r.max_price
            )));
        }
        if r.min_nights > r.max_nights {
            return Err(ConfigError::InvalidBounds {
                name: "nights".to_string(),
                min: r.min_nights,
                max: r.max_nights,
            });
        }
        if r.min_pax > r.max_pax {
            return Err(ConfigError::InvalidBounds {
                name: "pax".to_string(),
                min: r.min_pax,
                max: r.max_pax,
            });
        }

        let currency = &self.defaults.currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::InvalidCurrency(currency.clone()));
        }
        if self.defaults.accommodation_type.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "defaults.accommodation_type must not be empty".to_string(),
            ));
        }

        if let (Some(dec), Some(thousands)) =
            (self.locale.decimal_separator, self.locale.thousands_separator)
        {
            if dec == thousands {
                return Err(ConfigError::InvalidValue(format!(
                    "locale separators must differ, both are '{}'",
                    dec
                )));
            }
        }

        Ok(())
    }
}

/// Number formatting hints; unset values are detected from the sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LocaleSettings {
    pub decimal_separator: Option<char>,
    pub thousands_separator: Option<char>,
}

/// Layout analyzer tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    /// Rows and columns scanned for header candidates
    pub scan_limit: usize,
    /// Primary layouts below this confidence are flagged
    pub layout_confidence_threshold: f64,
    /// Minimum classifier confidence for a header cell to count
    pub classifier_threshold: f64,
    /// Blank lines tolerated inside a pricing block
    pub max_blank_gap: usize,
    /// Rows above the pricing block searched for title metadata
    pub title_rows: usize,
    /// Secondary candidates kept for review
    pub max_secondary: usize,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            scan_limit: 500,
            layout_confidence_threshold: 0.5,
            classifier_threshold: 0.6,
            max_blank_gap: 1,
            title_rows: 8,
            max_secondary: 3,
        }
    }
}

/// Inclusions block parsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InclusionSettings {
    /// Items discarded as placeholders (case-insensitive)
    pub placeholders: Vec<String>,
}

impl Default for InclusionSettings {
    fn default() -> Self {
        Self {
            placeholders: default_placeholders(),
        }
    }
}

fn default_placeholders() -> Vec<String> {
    ["n/a", "na", "tbc", "tba", "tbd", "none", "nil", "-", "--", "...", "?", "x"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Fallback values applied when the sheet is silent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultSettings {
    /// ISO 4217 code used when no currency is found in the sheet
    pub currency: String,
    /// Implicit type when a sheet names no accommodation types
    pub accommodation_type: String,
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            accommodation_type: "Standard".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detection.layout_confidence_threshold, 0.5);
        assert_eq!(config.defaults.accommodation_type, "Standard");
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
[locale]
decimal_separator = ","

[defaults]
currency = "EUR"
"#,
        )
        .unwrap();
        assert_eq!(config.locale.decimal_separator, Some(','));
        assert_eq!(config.defaults.currency, "EUR");
        assert_eq!(config.defaults.accommodation_type, "Standard");
        assert_eq!(config.detection.scan_limit, 500);
    }

    #[test]
    fn test_rejects_threshold_out_of_range() {
        let err = EngineConfig::from_toml_str(
            r#"
[detection]
layout_confidence_threshold = 1.5
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThreshold { .. }));
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let mut config = EngineConfig::default();
        config.ranges.min_pax = 10;
        config.ranges.max_pax = 2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_currency() {
        let mut config = EngineConfig::default();
        config.defaults.currency = "euro".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCurrency(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(matches!(
            EngineConfig::from_toml_str("[detection\nscan_limit = 3"),
            Err(ConfigError::Toml(_))
        ));
    }
}
