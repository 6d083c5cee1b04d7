//! Configuration management for the pipeline binaries
//!
//! Supports loading configuration from:
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml, config/local.toml)
//! - An explicit file passed on the command line
//! - Environment variables (prefixed with APP__)
//! - Default values

use crate::errors::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::{Validate, ValidationError};

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct AppConfig {
    /// Input and output file locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Validator thresholds
    #[serde(default)]
    #[validate(nested)]
    pub validation: ValidationSettings,

    /// Logging configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    #[serde(default = "default_cities")]
    pub cities: PathBuf,

    #[serde(default = "default_minimum_wages")]
    pub minimum_wages: PathBuf,

    #[serde(default = "default_blocklist")]
    pub blocklist: PathBuf,

    /// Restaurant list from the places fetch (optional input)
    #[serde(default = "default_restaurants")]
    pub restaurants: PathBuf,

    #[serde(default = "default_prices_raw")]
    pub prices_raw: PathBuf,

    #[serde(default = "default_prices_validated")]
    pub prices_validated: PathBuf,

    #[serde(default = "default_rejection_report")]
    pub rejection_report: PathBuf,

    #[serde(default = "default_cities_final")]
    pub cities_final: PathBuf,

    /// Directory of schema overrides; embedded schemas are used when unset
    pub schemas_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_typical_band"))]
pub struct ValidationSettings {
    /// Prices above this are rejected as implausible (CAD)
    #[serde(default = "default_price_ceiling")]
    #[validate(range(exclusive_min = 0.0))]
    pub price_ceiling: f64,

    /// Lower edge of the typical price band; below it is flagged
    #[serde(default = "default_typical_min")]
    #[validate(range(min = 0.0))]
    pub typical_min: f64,

    /// Upper edge of the typical price band; above it is flagged
    #[serde(default = "default_typical_max")]
    pub typical_max: f64,

    /// Extraction dates older than this many days are flagged stale
    #[serde(default = "default_stale_days")]
    #[validate(range(min = 1))]
    pub stale_days: u32,

    /// Standard deviations from the city mean before a regular price is an outlier
    #[serde(default = "default_outlier_z")]
    #[validate(range(exclusive_min = 0.0))]
    pub outlier_z: f64,

    /// Reject entries that carry any flag
    #[serde(default)]
    pub strict: bool,
}

fn validate_typical_band(settings: &ValidationSettings) -> std::result::Result<(), ValidationError> {
    if settings.typical_min < settings.typical_max && settings.typical_max <= settings.price_ceiling {
        Ok(())
    } else {
        let mut err = ValidationError::new("typical_band");
        err.message = Some(
            "expected typical_min < typical_max <= price_ceiling".into(),
        );
        Err(err)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logging: bool,
}

// Default value functions
fn default_cities() -> PathBuf { PathBuf::from("data/cities.json") }
fn default_minimum_wages() -> PathBuf { PathBuf::from("data/minimum_wages.json") }
fn default_blocklist() -> PathBuf { PathBuf::from("data/fast_food_blocklist.json") }
fn default_restaurants() -> PathBuf { PathBuf::from("data/restaurants_raw.json") }
fn default_prices_raw() -> PathBuf { PathBuf::from("data/prices_raw.json") }
fn default_prices_validated() -> PathBuf { PathBuf::from("data/prices_validated.json") }
fn default_rejection_report() -> PathBuf { PathBuf::from("data/prices_rejected.json") }
fn default_cities_final() -> PathBuf { PathBuf::from("data/cities_final.json") }
fn default_price_ceiling() -> f64 { 50.0 }
fn default_typical_min() -> f64 { 5.0 }
fn default_typical_max() -> f64 { 25.0 }
fn default_stale_days() -> u32 { 180 }
fn default_outlier_z() -> f64 { 2.0 }
fn default_log_level() -> String { "info".to_string() }

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cities: default_cities(),
            minimum_wages: default_minimum_wages(),
            blocklist: default_blocklist(),
            restaurants: default_restaurants(),
            prices_raw: default_prices_raw(),
            prices_validated: default_prices_validated(),
            rejection_report: default_rejection_report(),
            cities_final: default_cities_final(),
            schemas_dir: None,
        }
    }
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            price_ceiling: default_price_ceiling(),
            typical_min: default_typical_min(),
            typical_max: default_typical_max(),
            stale_days: default_stale_days(),
            outlier_z: default_outlier_z(),
            strict: false,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: false,
        }
    }
}

impl AppConfig {
    /// Load configuration, adding an explicit (required) file on top of the
    /// config/ directory layers
    pub fn load_with(explicit: Option<&Path>) -> Result<Self> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let mut builder = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            // Load from environment variables with APP__ prefix
            // e.g., APP__VALIDATION__PRICE_CEILING=40
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = config.try_deserialize()?;
        config.ensure_valid()?;
        Ok(config)
    }

    /// Reject settings the validator cannot work with
    pub fn ensure_valid(&self) -> Result<()> {
        self.validate().map_err(AppError::from)
    }
}
