//! Configuration validation.
//!
//! Checks that assumptions and limits are within ranges the ratio engine
//! and data plumbing can work with.

use thiserror::Error;

use crate::config::{CacheConfig, Config, EngineConfig, ObservabilityConfig, ProviderConfig};

/// Longest accepted cache TTL: one year.
pub const MAX_CACHE_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Validate for Config {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors: Vec<ValidationError> = [
            self.engine.validate(),
            self.cache.validate(),
            self.provider.validate(),
            self.observability.validate(),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }
}

fn check_rate(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() || !(0.0..1.0).contains(&value) {
        return Err(ValidationError::InvalidValue {
            field: field.into(),
            reason: format!("{} is not a rate in [0, 1)", value),
        });
    }
    Ok(())
}

impl Validate for EngineConfig {
    fn validate(&self) -> ValidationResult<()> {
        check_rate("engine.risk_free_rate", self.risk_free_rate)?;
        check_rate("engine.market_return", self.market_return)?;
        check_rate("engine.cost_of_debt", self.cost_of_debt)?;
        check_rate("engine.corporate_tax_rate", self.corporate_tax_rate)?;
        Ok(())
    }
}

impl Validate for CacheConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.ttl_secs <= 0 || self.ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ValidationError::InvalidValue {
                field: "cache.ttl_secs".into(),
                reason: format!("must be between 1 and {}", MAX_CACHE_TTL_SECS),
            });
        }
        Ok(())
    }
}

impl Validate for ProviderConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.requests_per_minute == 0 {
            return Err(ValidationError::InvalidValue {
                field: "provider.requests_per_minute".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.data_dir.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "provider.data_dir".into(),
            });
        }
        Ok(())
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        Ok(())
    }
}
