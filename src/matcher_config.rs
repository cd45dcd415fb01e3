//! # Matcher Configuration Module
//!
//! Static configuration of the product matcher: the catalog, the OCR
//! substitution table, the uninformative common suffix and the two score
//! thresholds. Defaults describe the market grid; a JSON file and
//! environment variables can override them.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::{validate_names, DEFAULT_COMMON_SUFFIX, DEFAULT_PRODUCTS};
use crate::errors::{error_logging, AppError, AppResult};
use crate::substitution::default_substitutions;

/// Minimum score for a candidate found through the catalog index
pub const DEFAULT_FAST_PATH_THRESHOLD: f64 = 0.3;
/// Minimum score for the best candidate of the full catalog scan
pub const DEFAULT_FULL_SCAN_THRESHOLD: f64 = 0.4;

const CONFIG_PATH_ENV: &str = "MATCHER_CONFIG_PATH";
const FAST_PATH_ENV: &str = "MATCHER_FAST_PATH_THRESHOLD";
const FULL_SCAN_ENV: &str = "MATCHER_FULL_SCAN_THRESHOLD";

/// Configuration for product name correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Known-correct product names, in priority order
    pub catalog: Vec<String>,
    /// Wrong OCR glyph -> replacement text
    pub substitutions: BTreeMap<char, String>,
    /// Character pair ignored when indexing catalog entries
    pub common_suffix: [char; 2],
    /// Minimum score accepted from the indexed fast path (0.0-1.0)
    pub fast_path_threshold: f64,
    /// Minimum score accepted from the full scan (0.0-1.0)
    pub full_scan_threshold: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            catalog: DEFAULT_PRODUCTS.iter().map(|p| p.to_string()).collect(),
            substitutions: default_substitutions(),
            common_suffix: DEFAULT_COMMON_SUFFIX,
            fast_path_threshold: DEFAULT_FAST_PATH_THRESHOLD,
            full_scan_threshold: DEFAULT_FULL_SCAN_THRESHOLD,
        }
    }
}

impl MatcherConfig {
    /// Default configuration with threshold overrides from the environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Override thresholds from `MATCHER_FAST_PATH_THRESHOLD` and
    /// `MATCHER_FULL_SCAN_THRESHOLD` when they are set
    pub fn apply_env_overrides(&mut self) {
        if let Some(value) = threshold_from_env(FAST_PATH_ENV) {
            self.fast_path_threshold = value;
        }
        if let Some(value) = threshold_from_env(FULL_SCAN_ENV) {
            self.full_scan_threshold = value;
        }
    }

    /// Validate matcher configuration
    pub fn validate(&self) -> AppResult<()> {
        validate_names(&self.catalog)?;

        validate_threshold("fast_path_threshold", self.fast_path_threshold)?;
        validate_threshold("full_scan_threshold", self.full_scan_threshold)?;

        if let Some((from, _)) = self.substitutions.iter().find(|(_, to)| to.is_empty()) {
            return Err(AppError::Config(format!(
                "Substitution for '{}' cannot be empty",
                from
            )));
        }

        Ok(())
    }
}

fn validate_threshold(name: &str, value: f64) -> AppResult<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(AppError::Config(format!(
            "{} must be between 0.0 and 1.0, got {}",
            name, value
        )));
    }
    Ok(())
}

fn threshold_from_env(key: &str) -> Option<f64> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<f64>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(
                config_key = %key,
                value = %raw,
                error = %e,
                "Ignoring unparsable threshold override"
            );
            None
        }
    }
}

/// Load a matcher configuration from a JSON file.
///
/// Missing fields take their default values. The result is not validated;
/// `ProductMatcher::with_config` does that.
pub fn load_matcher_config_from_path(path: impl AsRef<Path>) -> AppResult<MatcherConfig> {
    let content = fs::read_to_string(path.as_ref())?;
    let config = serde_json::from_str(&content)?;
    Ok(config)
}

/// Load matcher configuration from the first available source.
///
/// Order: the file named by `MATCHER_CONFIG_PATH`, then the fallback paths,
/// then the built-in defaults. Threshold overrides from the environment are
/// applied last.
pub fn load_matcher_config() -> MatcherConfig {
    let mut config = load_config_file().unwrap_or_default();
    config.apply_env_overrides();
    config
}

fn load_config_file() -> Option<MatcherConfig> {
    if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
        info!(
            "Loading matcher config from environment variable: {}",
            config_path
        );
        match load_matcher_config_from_path(&config_path) {
            Ok(config) => {
                info!("Successfully loaded matcher config from: {}", config_path);
                return Some(config);
            }
            Err(e) => {
                error_logging::log_config_error(&e, CONFIG_PATH_ENV, "load_matcher_config");
                warn!(
                    "Failed to load matcher config from '{}'. Falling back to default paths.",
                    config_path
                );
            }
        }
    }

    let possible_paths = ["config/matcher.json", "../config/matcher.json"];

    for config_path in &possible_paths {
        if !Path::new(config_path).exists() {
            continue;
        }
        match load_matcher_config_from_path(config_path) {
            Ok(config) => {
                info!(
                    "Successfully loaded matcher config from fallback path: {}",
                    config_path
                );
                return Some(config);
            }
            Err(e) => {
                error_logging::log_io_error(&e, "load_matcher_config", Some(*config_path));
                warn!("Failed to load matcher config at '{}'. Trying next path.", config_path);
            }
        }
    }

    info!("No matcher config file found, using built-in catalog");
    None
}
