//! Error types for the engine.
//!
//! Only malformed configuration is an `Err`; data-quality problems in a sheet
//! are reported as issues on the parse result.

use thiserror::Error;

/// Result type for engine setup
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while building an engine configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML could not be parsed
    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Threshold outside 0..=1
    #[error("Threshold {name} must be within 0..=1, got {value}")]
    InvalidThreshold { name: String, value: f64 },

    /// Lower bound above upper bound
    #[error("Invalid {name} bounds: min {min} > max {max}")]
    InvalidBounds { name: String, min: u32, max: u32 },

    /// Default currency is not an ISO 4217 code
    #[error("Default currency must be a 3-letter ISO code, got '{0}'")]
    InvalidCurrency(String),

    /// Any other rejected value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}
