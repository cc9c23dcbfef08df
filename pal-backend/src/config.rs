use anyhow::Context;
use pal_common::{PropagationMode, Telescope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{PalError, PalResult};
use crate::model::astorb::{ASTORB_GRAPHQL_URL, PAGE_SIZE};
use crate::model::http::retry::DEFAULT_MAX_ATTEMPTS;
use crate::model::lowell::{DEFAULT_OBSERVATORY, LOWELL_EPHEMERIS_URL};
use crate::module::ephemeris::propagate::DEFAULT_DURATION_MINUTES;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PalConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub propagation: PropagationConfig,

    #[serde(default)]
    pub telescopes: BTreeMap<String, Telescope>,

    pub ephemeris: EphemerisRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_url")]
    pub url: String,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagationConfig {
    #[serde(default)]
    pub mode: PropagationMode,

    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,

    /// MPC observatory code for Lowell-generated positions
    #[serde(default = "default_observatory")]
    pub observatory: u32,

    #[serde(default = "default_lowell_url")]
    pub lowell_url: String,
}

/// What to compute: one telescope over an inclusive date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EphemerisRequest {
    pub telescope: String,
    /// `YYYY-MM-DD`
    pub start_date: String,
    /// `YYYY-MM-DD`
    pub end_date: String,

    /// Apply the telescope's limiting magnitude to catalog queries
    #[serde(default)]
    pub mag_lim: bool,

    /// Minutes between propagated positions
    #[serde(default = "default_propagation_interval")]
    pub propagation_interval: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_catalog_url() -> String {
    ASTORB_GRAPHQL_URL.to_string()
}

fn default_page_size() -> usize {
    PAGE_SIZE
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_duration_minutes() -> u32 {
    DEFAULT_DURATION_MINUTES
}

fn default_observatory() -> u32 {
    DEFAULT_OBSERVATORY
}

fn default_lowell_url() -> String {
    LOWELL_EPHEMERIS_URL.to_string()
}

fn default_propagation_interval() -> u32 {
    15
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
            page_size: default_page_size(),
            max_attempts: default_max_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            mode: PropagationMode::default(),
            duration_minutes: default_duration_minutes(),
            observatory: default_observatory(),
            lowell_url: default_lowell_url(),
        }
    }
}

impl PalConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::from_toml(&content).with_context(|| format!("Failed to load config file {}", path))
    }

    pub fn from_toml(content: &str) -> PalResult<Self> {
        toml::from_str(content).map_err(|e| PalError::config(format!("invalid config: {}", e)))
    }

    /// The named telescope with its name filled in, validated.
    pub fn telescope(&self, name: &str) -> PalResult<Telescope> {
        let mut telescope = self.telescopes.get(name).cloned().ok_or_else(|| {
            let known: Vec<&str> = self.telescopes.keys().map(String::as_str).collect();
            PalError::config(format!(
                "unknown telescope '{}' (configured: {})",
                name,
                known.join(", ")
            ))
        })?;
        telescope.name = name.to_string();
        telescope.validate().map_err(PalError::Configuration)?;
        Ok(telescope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        log_level = "debug"

        [propagation]
        mode = "lowell"

        [telescopes.Pathfinder]
        slug = "pf"
        latitude = 35.2
        longitude = -82.87
        altitude = 892.0
        dec_min = -20.0
        dec_max = 72.0
        limiting_magnitude = 16.0
        bright_limiting_magnitude = 14.5
        bright_field = true

        [ephemeris]
        telescope = "Pathfinder"
        start_date = "2027-01-15"
        end_date = "2027-01-17"
    "#;

    #[test]
    fn test_defaults_fill_missing_keys() {
        let config = PalConfig::from_toml(SAMPLE).unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.results_dir, PathBuf::from("results"));
        assert_eq!(config.catalog.url, ASTORB_GRAPHQL_URL);
        assert_eq!(config.catalog.page_size, 1000);
        assert_eq!(config.catalog.max_attempts, 5);
        assert_eq!(config.propagation.mode, PropagationMode::Lowell);
        assert_eq!(config.propagation.duration_minutes, 600);
        assert_eq!(config.propagation.observatory, 256);
        assert!(!config.ephemeris.mag_lim);
        assert_eq!(config.ephemeris.propagation_interval, 15);
    }

    #[test]
    fn test_telescope_lookup() {
        let config = PalConfig::from_toml(SAMPLE).unwrap();
        let telescope = config.telescope("Pathfinder").unwrap();

        assert_eq!(telescope.name, "Pathfinder");
        assert_eq!(telescope.slug, "pf");
        assert_eq!(telescope.mag_limit(), 14.5);

        let missing = config.telescope("Argus");
        assert!(matches!(missing, Err(PalError::Configuration(msg)) if msg.contains("Pathfinder")));
    }

    #[test]
    fn test_invalid_telescope_rejected() {
        let broken = SAMPLE.replace("dec_min = -20.0", "dec_min = 80.0");
        let config = PalConfig::from_toml(&broken).unwrap();
        assert!(matches!(
            config.telescope("Pathfinder"),
            Err(PalError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_request_is_configuration_error() {
        let result = PalConfig::from_toml("log_level = \"info\"");
        assert!(matches!(result, Err(PalError::Configuration(_))));
    }
}
