//! Configuration management for findash.
//!
//! Configuration lives in a single file at `~/.findash/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (`FINDASH_*` prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `FINDASH_LOG_LEVEL` → observability.log_level
//! - `FINDASH_LOG_FORMAT` → observability.log_format
//! - `FINDASH_DATA_DIR` → provider.data_dir
//! - `FINDASH_REQUESTS_PER_MINUTE` → provider.requests_per_minute
//! - `FINDASH_CACHE_TTL_SECS` → cache.ttl_secs
//! - `FINDASH_TAX_POLICY` → engine.tax_policy (`fixed` | `effective`)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result, ResultExt};
use crate::validation::Validate;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".findash"),
        |dirs| dirs.home_dir().join(".findash"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Engine Assumptions
// ============================================================================

/// Which corporate tax rate feeds WACC and NOPAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxPolicy {
    /// Always use `corporate_tax_rate`.
    Fixed,
    /// income_tax_expense / pre_tax_income, falling back to `corporate_tax_rate`.
    Effective,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self::Effective
    }
}

impl std::str::FromStr for TaxPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "effective" => Ok(Self::Effective),
            other => Err(format!("unknown tax policy '{}'", other)),
        }
    }
}

/// Market assumptions used by the ratio engine.
///
/// All rates are decimal fractions (0.04 = 4%).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Risk-free rate for CAPM
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,

    /// Expected market return for CAPM; the equity premium is
    /// `market_return - risk_free_rate`.
    #[serde(default = "default_market_return", alias = "market_risk_premium")]
    pub market_return: f64,

    /// Assumed pre-tax cost of debt when the company carries debt
    #[serde(default = "default_cost_of_debt")]
    pub cost_of_debt: f64,

    /// Statutory corporate tax rate
    #[serde(default = "default_corporate_tax_rate")]
    pub corporate_tax_rate: f64,

    /// Tax rate convention
    #[serde(default)]
    pub tax_policy: TaxPolicy,
}

fn default_risk_free_rate() -> f64 {
    0.04
}

fn default_market_return() -> f64 {
    0.09
}

fn default_cost_of_debt() -> f64 {
    0.055
}

fn default_corporate_tax_rate() -> f64 {
    0.21
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: default_risk_free_rate(),
            market_return: default_market_return(),
            cost_of_debt: default_cost_of_debt(),
            corporate_tax_rate: default_corporate_tax_rate(),
            tax_policy: TaxPolicy::default(),
        }
    }
}

// ============================================================================
// Cache / Provider
// ============================================================================

/// Snapshot cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live for a cached snapshot, in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: i64,
}

fn default_cache_ttl() -> i64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
        }
    }
}

/// Market data provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider request budget
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    /// Directory holding `<TICKER>.json` snapshots for the file source
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_requests_per_minute() -> u32 {
    60
}

fn default_data_dir() -> String {
    "./data".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
            data_dir: default_data_dir(),
        }
    }
}

// ============================================================================
// Observability
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets to clamp to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

// ============================================================================
// Root
// ============================================================================

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// JSON Schema reference
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Ratio engine assumptions
    #[serde(default)]
    pub engine: EngineConfig,

    /// Snapshot cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Market data provider
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Logging
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .context(format!("Failed to parse config from {}", path.display()))
    }

    /// Load, apply environment overrides, and validate.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("FINDASH_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("FINDASH_LOG_FORMAT") {
            self.observability.log_format = format;
        }
        if let Some(dir) = lookup("FINDASH_DATA_DIR") {
            self.provider.data_dir = dir;
        }
        if let Some(rpm) = lookup("FINDASH_REQUESTS_PER_MINUTE") {
            match rpm.parse() {
                Ok(v) => self.provider.requests_per_minute = v,
                Err(_) => tracing::warn!(value = %rpm, "Ignoring FINDASH_REQUESTS_PER_MINUTE"),
            }
        }
        if let Some(ttl) = lookup("FINDASH_CACHE_TTL_SECS") {
            match ttl.parse() {
                Ok(v) => self.cache.ttl_secs = v,
                Err(_) => tracing::warn!(value = %ttl, "Ignoring FINDASH_CACHE_TTL_SECS"),
            }
        }
        if let Some(policy) = lookup("FINDASH_TAX_POLICY") {
            match policy.parse() {
                Ok(v) => self.engine.tax_policy = v,
                Err(e) => tracing::warn!(error = %e, "Ignoring FINDASH_TAX_POLICY"),
            }
        }
    }

    /// Save configuration to the given path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)
                    .context(format!("Failed to create config directory {}", dir.display()))?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(Error::from)
    }
}
