//! ratesheet-validate - Business-rule validation for parsed rate sheets
//!
//! This crate provides a pluggable validation engine that checks a
//! [`ParsedResortData`] against shape, range, consistency and completeness
//! rules and reports every finding as a [`ProcessingError`].
//!
//! # Architecture
//!
//! Individual rule families implement the [`Validator`] trait. The
//! [`ValidationEngine`] runs all registered validators and collects their
//! issues. Validators never fail: a broken sheet simply yields more issues.
//!
//! Facts that are not visible in the parsed result itself (the advertised
//! type/nights combinations, every currency seen in header text, the source
//! cell of each record) travel in a [`ValidationContext`].
//!
//! # Example
//!
//! ```
//! use ratesheet_model::ParsedResortData;
//! use ratesheet_validate::{ShapeValidator, ValidationContext, ValidationEngine};
//!
//! let mut engine = ValidationEngine::new();
//! engine.add_validator(Box::new(ShapeValidator));
//!
//! let data = ParsedResortData::default();
//! let issues = engine.validate(&data, &ValidationContext::new("Rates"));
//! assert!(issues.iter().any(|i| i.code == "RESORT_NAME_MISSING"));
//! ```

pub mod completeness;
pub mod consistency;
pub mod context;
pub mod range;
pub mod shape;

use ratesheet_model::{ParsedResortData, ProcessingError};

// Re-export validators
pub use completeness::CompletenessValidator;
pub use consistency::ConsistencyValidator;
pub use context::{RangeSettings, ValidationContext};
pub use range::RangeValidator;
pub use shape::ShapeValidator;

/// Trait for rate-sheet validators
///
/// Validators inspect a parsed result and return a list of issues. Each
/// validator has a unique code prefix naming its rule family.
pub trait Validator: Send + Sync {
    /// Get the validator's unique code (e.g., "RS1" for result shape)
    fn code(&self) -> &'static str;

    /// Get a human-readable name for this validator
    fn name(&self) -> &'static str {
        "unnamed"
    }

    /// Validate the parsed result and return any issues
    fn validate(&self, data: &ParsedResortData, ctx: &ValidationContext) -> Vec<ProcessingError>;
}

/// Validation engine that orchestrates multiple validators
pub struct ValidationEngine {
    /// Registered validators
    validators: Vec<Box<dyn Validator>>,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationEngine {
    /// Create a new empty validation engine
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// Create an engine with the four standard rule families
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.add_validator(Box::new(ShapeValidator));
        engine.add_validator(Box::new(RangeValidator));
        engine.add_validator(Box::new(ConsistencyValidator));
        engine.add_validator(Box::new(CompletenessValidator));
        engine
    }

    /// Add a validator to the engine
    pub fn add_validator(&mut self, validator: Box<dyn Validator>) {
        self.validators.push(validator);
    }

    /// Get the number of registered validators
    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    /// Get the names of all registered validators
    pub fn validator_names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    /// Validate a parsed result using all registered validators
    ///
    /// Issues come back in registration order, then in the order each
    /// validator found them.
    pub fn validate(&self, data: &ParsedResortData, ctx: &ValidationContext) -> Vec<ProcessingError> {
        let mut issues = Vec::new();

        for validator in &self.validators {
            let validator_issues = validator.validate(data, ctx);
            issues.extend(validator_issues);
        }

        issues
    }
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
