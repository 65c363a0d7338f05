//! Configuration for the gerirecall binary.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use gerirecall_core::{PersistencePolicy, Settings, DEFAULT_STORAGE_KEY};
use gerirecall_json::DEFAULT_MAX_BACKUPS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub storage: StorageConfig,

    /// When present, pushed into the scheduler on startup.
    #[serde(default)]
    pub scheduler: Option<SchedulerConfig>,

    #[serde(default)]
    pub api: ApiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            storage: StorageConfig::default(),
            scheduler: None,
            api: ApiConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Defaults to the platform data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_key")]
    pub key: String,

    #[serde(default = "default_max_backups")]
    pub max_backups: usize,

    /// Fail operations when the store cannot be written.
    #[serde(default)]
    pub strict: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            key: default_key(),
            max_backups: default_max_backups(),
            strict: false,
        }
    }
}

impl StorageConfig {
    pub fn policy(&self) -> PersistencePolicy {
        if self.strict {
            PersistencePolicy::Strict
        } else {
            PersistencePolicy::BestEffort
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_new_card_interval")]
    pub new_card_interval: u32,

    #[serde(default = "default_max_interval")]
    pub max_interval: u32,

    #[serde(default = "default_min_ease_factor")]
    pub min_ease_factor: f64,

    #[serde(default = "default_ease_factor")]
    pub default_ease_factor: f64,
}

impl From<&SchedulerConfig> for Settings {
    fn from(c: &SchedulerConfig) -> Self {
        Settings {
            new_card_interval: c.new_card_interval,
            max_interval: c.max_interval,
            min_ease_factor: c.min_ease_factor,
            default_ease_factor: c.default_ease_factor,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_max_backups() -> usize {
    DEFAULT_MAX_BACKUPS
}

fn default_new_card_interval() -> u32 {
    Settings::default().new_card_interval
}

fn default_max_interval() -> u32 {
    Settings::default().max_interval
}

fn default_min_ease_factor() -> f64 {
    Settings::default().min_ease_factor
}

fn default_ease_factor() -> f64 {
    Settings::default().default_ease_factor
}

fn default_addr() -> String {
    "127.0.0.1:8080".to_string()
}

impl Config {
    /// Path to the config file in the platform config directory.
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("org", "gerirecall", "gerirecall")
            .map(|pd| pd.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("gerirecall.toml"))
    }

    /// Reads `path`, or the default location when `None`. A missing file
    /// yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if let Some(s) = &config.scheduler {
            Settings::from(s).validate()?;
        }
        Ok(config)
    }
}
