use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use url::Url;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    /// Catalog service settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Caption conversion settings
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Catalog service configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CatalogConfig {
    // @field: Site root, used for detail pages
    #[serde(default = "default_base_url")]
    pub base_url: String,

    // @field: Search form endpoint
    #[serde(default = "default_search_url")]
    pub search_url: String,

    // @field: Download endpoint
    #[serde(default = "default_download_url")]
    pub download_url: String,

    // @field: Client identifier sent with downloads
    #[serde(default = "default_client_id")]
    pub client_id: String,

    // @field: Subtitle language (ISO 639-1 or 639-3)
    #[serde(default = "default_language")]
    pub language: String,

    // @field: User agent of every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    // @field: Timeout seconds per request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Retries after a failed request
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    // @field: Base backoff, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    // @field: Pause between detail pages
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    // @field: Detail pages visited per candidate
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    // @field: Matched candidates enumerated per search
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search_url: default_search_url(),
            download_url: default_download_url(),
            client_id: default_client_id(),
            language: default_language(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            page_delay_ms: default_page_delay_ms(),
            max_pages: default_max_pages(),
            max_candidates: default_max_candidates(),
        }
    }
}

/// Caption conversion configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConversionConfig {
    /// Frame rate for frame-indexed captions without an fps header
    #[serde(default = "default_fps")]
    pub default_fps: f64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            default_fps: default_fps(),
        }
    }
}

/// Log level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching log crate filter
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
        }
    }
}

fn default_base_url() -> String {
    "https://www.napiprojekt.pl".to_string()
}

fn default_search_url() -> String {
    "https://www.napiprojekt.pl/ajax/search_catalog.php".to_string()
}

fn default_download_url() -> String {
    "https://napiprojekt.pl/api/api-napiprojekt3.php".to_string()
}

fn default_client_id() -> String {
    "NapiProjekt".to_string()
}

fn default_language() -> String {
    "pl".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500 // doubled on each retry
}

fn default_page_delay_ms() -> u64 {
    1000
}

fn default_max_pages() -> u32 {
    10
}

fn default_max_candidates() -> usize {
    5
}

fn default_fps() -> f64 {
    crate::formats::DEFAULT_FPS
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("base_url", &self.catalog.base_url),
            ("search_url", &self.catalog.search_url),
            ("download_url", &self.catalog.download_url),
        ] {
            Url::parse(value).with_context(|| format!("Invalid catalog {}: '{}'", name, value))?;
        }

        let _language_name = crate::language_utils::get_language_name(&self.catalog.language)?;

        if self.catalog.client_id.trim().is_empty() {
            return Err(anyhow!("Catalog client_id must not be empty"));
        }

        if self.catalog.max_pages == 0 {
            return Err(anyhow!("Catalog max_pages must be greater than zero"));
        }

        if self.catalog.max_candidates == 0 {
            return Err(anyhow!("Catalog max_candidates must be greater than zero"));
        }

        if !(self.conversion.default_fps.is_finite() && self.conversion.default_fps > 0.0) {
            return Err(anyhow!(
                "Conversion default_fps must be a positive number, got {}",
                self.conversion.default_fps
            ));
        }

        Ok(())
    }

    /// Read a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Load the configuration, writing a default one if the file is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }
}
