//! Configuration management for JobHound.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Main application configuration.
///
/// This is loaded from `~/.config/jobhound/config.toml` (or platform
/// equivalent). If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Crawl orchestration settings
    pub scraping: ScrapingConfig,
    /// Per-origin session and anti-detection settings
    pub session: SessionConfig,
    /// Response cache settings
    pub cache: CacheConfig,
    /// Database storage settings
    pub storage: StorageConfig,
    /// REST API settings
    pub api: ApiConfig,
    /// Background scheduler settings
    pub scheduler: SchedulerConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `JOBHOUND_DB_PATH`: Override the database file path
    /// - `JOBHOUND_API_PORT`: Override the API listen port
    /// - `JOBHOUND_HEADLESS`: Override browser headless mode (true/false)
    /// - `JOBHOUND_MAX_JOB_AGE_DAYS`: Override the freshness window
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;

        // Override from environment
        if let Ok(val) = std::env::var("JOBHOUND_DB_PATH") {
            if !val.is_empty() {
                config.storage.db_path = Some(val.clone());
                tracing::debug!("Override storage.db_path from env: {}", val);
            }
        }

        if let Ok(val) = std::env::var("JOBHOUND_API_PORT") {
            if let Ok(port) = val.parse() {
                config.api.port = port;
                tracing::debug!("Override api.port from env: {}", port);
            }
        }

        if let Ok(val) = std::env::var("JOBHOUND_HEADLESS") {
            if let Ok(headless) = val.parse() {
                config.session.headless = headless;
                tracing::debug!("Override session.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("JOBHOUND_MAX_JOB_AGE_DAYS") {
            if let Ok(days) = val.parse() {
                config.scraping.max_job_age_days = days;
                tracing::debug!("Override scraping.max_job_age_days from env: {}", days);
            }
        }

        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/jobhound/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "jobhound", "jobhound").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/jobhound`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "jobhound", "jobhound").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Resolve the database file path.
    ///
    /// Uses `storage.db_path` when set, otherwise `jobhound.db` under
    /// the data directory.
    pub fn db_path(&self) -> ConfigResult<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(Self::data_dir()?.join("jobhound.db")),
        }
    }
}

/// What to do with a detail page whose posted date cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateFallback {
    /// Reject the posting (counted as a parse rejection)
    #[default]
    Reject,
    /// Keep the posting and treat it as published now
    AssumeFresh,
}

/// Crawl orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Search terms to discover postings for
    pub search_terms: Vec<String>,
    /// Locations paired with each search term
    pub locations: Vec<String>,
    /// Maximum term/location pairs attempted per source per run
    pub max_searches: u32,
    /// Detail fetches processed concurrently within one source
    pub concurrency_limit: usize,
    /// Postings older than this many days are discarded
    pub max_job_age_days: u32,
    /// Consecutive blocking failures before a source's crawl is aborted
    pub max_consecutive_blocks: u32,
    /// Handling for detail pages with unparseable posted dates
    pub date_fallback: DateFallback,
    /// Pause between sources in milliseconds
    pub pause_between_sources_ms: u64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            search_terms: vec![
                "software engineer".to_string(),
                "rust developer".to_string(),
                "backend developer".to_string(),
            ],
            locations: vec!["remote".to_string()],
            max_searches: 8,
            concurrency_limit: 4,
            max_job_age_days: 7,
            max_consecutive_blocks: 3,
            date_fallback: DateFallback::Reject,
            pause_between_sources_ms: 5000,
        }
    }
}

/// Per-origin session and anti-detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Base inter-request delay in milliseconds
    pub base_delay_ms: u64,
    /// Requests a session may serve before it expires
    pub request_budget: u32,
    /// Cooldown after session expiry in seconds
    pub cooldown_secs: u64,
    /// Maximum simultaneous heavyweight fetch contexts across all origins
    pub max_fetch_contexts: usize,
    /// Idle time before a fetch context is released, in seconds
    pub context_idle_secs: u64,
    /// Interval between background sweep passes in seconds
    pub sweep_interval_secs: u64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Run the browser in headless mode
    pub headless: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 2000,
            request_budget: 40,
            cooldown_secs: 300,
            max_fetch_contexts: 2,
            context_idle_secs: 120,
            sweep_interval_secs: 60,
            timeout_secs: 30,
            headless: true,
        }
    }
}

/// Response cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live for cached responses in seconds
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 600 }
    }
}

/// Database storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file path; defaults to the XDG data directory when unset
    pub db_path: Option<String>,
}

/// REST API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Background scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Whether scheduled crawls are enabled
    pub enabled: bool,
    /// Hours between scheduled crawl runs
    pub interval_hours: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_hours: 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.scraping.max_searches, 8);
        assert_eq!(config.scraping.concurrency_limit, 4);
        assert_eq!(config.scraping.date_fallback, DateFallback::Reject);
        assert_eq!(config.session.base_delay_ms, 2000);
        assert_eq!(config.session.request_budget, 40);
        assert_eq!(config.cache.ttl_secs, 600);
        assert!(config.session.headless);
        assert!(!config.scheduler.enabled);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[scraping]"));
        assert!(toml_str.contains("[session]"));
        assert!(toml_str.contains("[api]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.api.port, config.api.port);
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        // Create a custom config
        let mut config = AppConfig::default();
        config.scraping.max_job_age_days = 14;
        config.session.request_budget = 25;

        // Save
        let contents = toml::to_string_pretty(&config).expect("serialize config");
        fs::write(&config_path, contents).expect("write config file");

        // Load
        let loaded_contents = fs::read_to_string(&config_path).expect("read config file");
        let loaded: AppConfig = toml::from_str(&loaded_contents).expect("parse loaded config");

        assert_eq!(loaded.scraping.max_job_age_days, 14);
        assert_eq!(loaded.session.request_budget, 25);
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("JOBHOUND_MAX_JOB_AGE_DAYS", "3");
        std::env::set_var("JOBHOUND_HEADLESS", "false");

        // Can't test load_with_env directly since it tries to read config file,
        // but we can test the logic
        let mut config = AppConfig::default();
        if let Ok(val) = std::env::var("JOBHOUND_MAX_JOB_AGE_DAYS") {
            if let Ok(days) = val.parse() {
                config.scraping.max_job_age_days = days;
            }
        }
        assert_eq!(config.scraping.max_job_age_days, 3);

        std::env::remove_var("JOBHOUND_MAX_JOB_AGE_DAYS");
        std::env::remove_var("JOBHOUND_HEADLESS");
    }

    #[test]
    fn test_partial_config() {
        // Test that partial TOML configs work with defaults
        let toml_str = r#"
[scraping]
max_searches = 4
date_fallback = "assume-fresh"

[api]
port = 8080
"#;

        let config: AppConfig = toml::from_str(toml_str).expect("parse partial config");
        assert_eq!(config.scraping.max_searches, 4);
        assert_eq!(config.scraping.date_fallback, DateFallback::AssumeFresh);
        assert_eq!(config.api.port, 8080);
        // These should be defaults
        assert_eq!(config.session.base_delay_ms, 2000);
        assert_eq!(config.scraping.concurrency_limit, 4);
    }

    #[test]
    fn test_db_path_override() {
        let mut config = AppConfig::default();
        config.storage.db_path = Some("/tmp/jobs.db".to_string());
        let path = config.db_path().expect("resolve db path");
        assert_eq!(path, PathBuf::from("/tmp/jobs.db"));
    }
}
