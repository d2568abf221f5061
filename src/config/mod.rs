//! Configuration management for shopcrawl.
//!
//! Configuration is read from `~/.config/shopcrawl/config.toml` at startup
//! unless another path is given. If the default file doesn't exist, a
//! commented default configuration is created.

use crate::orchestrator::ScrapeConfig;
use crate::scheduler::ScheduleConfig;
use crate::scraper::ScraperConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where snapshots are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Target of the periodic export loop
    pub path: PathBuf,
    /// Target of the export run after each finished scrape attempt
    pub cycle_path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("products.csv"),
            cycle_path: PathBuf::from("files/products.csv"),
        }
    }
}

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scrape: ScrapeConfig,
    pub schedule: ScheduleConfig,
    pub export: ExportConfig,
    pub scraper: ScraperConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/shopcrawl/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("shopcrawl").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# shopcrawl configuration
#
# Intervals accept "30s", "10m", "1h", "1d" or a bare number of seconds.

[scrape]
search_term = "Handphone"
# Listing pages per scrape attempt
pages = 5
# Identical attempts run concurrently in every cycle
workers = 5
# Seconds to wait after an attempt finishes before exporting
settle_delay_secs = 10
# Stop scheduling when an attempt fails to save its products
shutdown_on_attempt_error = true

[schedule]
scrape_interval = "10m"
export_interval = "15m"

[export]
path = "products.csv"
cycle_path = "files/products.csv"

[scraper]
base_url = "https://www.tokopedia.com/search"
timeout_secs = 30

# "legacy": every page after the first reuses its first rating and merchant
# "positional": each item keeps the rating and merchant at its own position
alignment = "legacy"

# Listing page
item_selector = ".pcv3__info-content"
rating_selector = ".prd_rating-average-text"
merchant_selector = ".prd_link-shop-name"

# Detail page
name_selector = "h1[data-testid='lblPDPDetailProductName']"
description_selector = "div[data-testid='lblPDPDescriptionProduk']"
price_selector = ".price"
image_selector = ".css-1c345mg"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
