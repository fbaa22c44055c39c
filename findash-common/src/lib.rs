//! Findash Common - Shared configuration, errors, and logging for findash crates.
//!
//! This crate provides:
//! - Configuration types and loading (`~/.findash/config.json` + `FINDASH_*` env)
//! - Configuration validation
//! - Error types and handling utilities
//! - Logging setup

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod validation;

pub use config::{
    CacheConfig, Config, EngineConfig, ObservabilityConfig, ProviderConfig, TaxPolicy,
};
pub use error::{Error, Result};
pub use validation::{Validate, ValidationError, ValidationResult};

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::{Config, EngineConfig, TaxPolicy};
    pub use crate::error::{Error, Result};
    pub use crate::logging::init_logging;
    pub use crate::validation::{Validate, ValidationError};
}
