use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::CampaignResult;

/// Root application configuration. Loaded from environment variables
/// with the prefix `CAMPAIGN_BANNER__` and an optional TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where dismissal state lives. Every surface configured with the same
/// `group` and `path` observes the same state.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_group")]
    pub group: String,
    /// JSON state file holding every group's slots.
    #[serde(default = "default_storage_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default = "default_log_json")]
    pub json: bool,
}

// Default functions
fn default_storage_group() -> String {
    "group.campaign.banner".to_string()
}
/// `$XDG_DATA_HOME/campaign-banner/state.json`, falling back to
/// `$HOME/.local/share` and then the working directory.
fn default_storage_path() -> String {
    let base = std::env::var_os("XDG_DATA_HOME")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME")
                .filter(|dir| !dir.is_empty())
                .map(|home| PathBuf::from(home).join(".local").join("share"))
        })
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("campaign-banner")
        .join("state.json")
        .display()
        .to_string()
}
fn default_log_filter() -> String {
    "campaign_banner=info".to_string()
}
fn default_log_json() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            group: default_storage_group(),
            path: default_storage_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: default_log_json(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables only.
    pub fn load() -> CampaignResult<Self> {
        Self::load_from(None)
    }

    /// Load configuration from an optional TOML file, then environment
    /// variables. Environment values take precedence over the file.
    pub fn load_from(path: Option<&Path>) -> CampaignResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("CAMPAIGN_BANNER")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
