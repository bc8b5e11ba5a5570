//! Dashboard configuration.
//!
//! Settings live in `mall-insights.json` in the working directory, or in the
//! file named by `$MALL_INSIGHTS_CONFIG`. Missing fields take their defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::aggregate::DEFAULT_AGE_BIN_WIDTH;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "mall-insights.json";

/// Environment variable pointing at an alternative config file.
pub const CONFIG_ENV_VAR: &str = "MALL_INSIGHTS_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("age_bin_width must be at least 1")]
    ZeroBinWidth,
    #[error("top_n must be at least 1")]
    ZeroTopN,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Dataset opened at startup.
    #[serde(default)]
    pub data_path: Option<PathBuf>,

    /// Width of an age bin in years.
    #[serde(default = "default_age_bin_width")]
    pub age_bin_width: u32,

    /// How many categories the "top" lists show.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// How many of the most purchased categories the trend chart starts with.
    #[serde(default = "default_trend_categories")]
    pub default_trend_categories: usize,

    /// Initial window size in logical pixels.
    #[serde(default = "default_window_size")]
    pub window_size: [f32; 2],
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            age_bin_width: default_age_bin_width(),
            top_n: default_top_n(),
            default_trend_categories: default_trend_categories(),
            window_size: default_window_size(),
        }
    }
}

fn default_age_bin_width() -> u32 {
    DEFAULT_AGE_BIN_WIDTH
}
fn default_top_n() -> usize {
    3
}
fn default_trend_categories() -> usize {
    2
}
fn default_window_size() -> [f32; 2] {
    [1280.0, 900.0]
}

impl DashboardConfig {
    /// Load and validate configuration from a specific file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: DashboardConfig = serde_json::from_str(content).context("parsing JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `$MALL_INSIGHTS_CONFIG` or the default location.
    ///
    /// A missing default file is not an error; defaults are used instead.
    pub fn load_default() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::load(Path::new(&path));
        }

        let default_path = Path::new(CONFIG_FILE_NAME);
        if default_path.exists() {
            Self::load(default_path)
        } else {
            log::debug!("no {CONFIG_FILE_NAME} found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.age_bin_width == 0 {
            return Err(ConfigError::ZeroBinWidth);
        }
        if self.top_n == 0 {
            return Err(ConfigError::ZeroTopN);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_dashboard() {
        let config = DashboardConfig::default();
        assert_eq!(config.age_bin_width, 5);
        assert_eq!(config.top_n, 3);
        assert_eq!(config.default_trend_categories, 2);
        assert!(config.data_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config =
            DashboardConfig::from_json(r#"{"age_bin_width": 10, "data_path": "shop.csv"}"#)
                .unwrap();
        assert_eq!(config.age_bin_width, 10);
        assert_eq!(config.data_path, Some(PathBuf::from("shop.csv")));
        assert_eq!(config.top_n, 3);
        assert_eq!(config.window_size, [1280.0, 900.0]);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(DashboardConfig::from_json(r#"{"age_bin_width": 0}"#).is_err());
        assert!(DashboardConfig::from_json(r#"{"top_n": 0}"#).is_err());
        assert!(DashboardConfig::from_json("not json").is_err());

        let config = DashboardConfig {
            top_n: 0,
            ..DashboardConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTopN));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = DashboardConfig::load(Path::new("/nonexistent/mall-insights.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/mall-insights.json"));
    }
}
