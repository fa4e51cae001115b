use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{display::ErrorDetail, icon::IconStrategy, provider::DEFAULT_FORECAST_DAYS};

fn default_forecast_days() -> u8 {
    DEFAULT_FORECAST_DAYS
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_city = "Vijayawada"
/// forecast_days = 7
/// icons = "provider-url"
/// errors = "detailed"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// WeatherAPI.com key.
    pub api_key: Option<String>,

    /// City searched when none is given on the command line.
    pub default_city: Option<String>,

    #[serde(default = "default_forecast_days")]
    pub forecast_days: u8,

    #[serde(default)]
    pub icons: IconStrategy,

    #[serde(default)]
    pub errors: ErrorDetail,

    /// Override for the provider base URL.
    pub base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            default_city: None,
            forecast_days: DEFAULT_FORECAST_DAYS,
            icons: IconStrategy::default(),
            errors: ErrorDetail::default(),
            base_url: None,
        }
    }
}

impl Config {
    /// The configured API key, or an error telling the user how to set one.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()).ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `cityweather configure` and enter your WeatherAPI.com key."
            )
        })
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = Some(api_key.into());
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "cityweather", "cityweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
