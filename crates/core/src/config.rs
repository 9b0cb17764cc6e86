//! Application configuration.
//!
//! Values come from built-in defaults, then `~/.config/gamecat/config.toml`
//! when present, then `GAMECAT_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::provider::ProviderSettings;

/// Directory under the user's config directory holding `config.toml`.
pub const CONFIG_DIR: &str = "gamecat";
/// File name of the configuration file.
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "GAMECAT";

const DEFAULT_COMMITTED_PATH: &str = "games.json";
const DEFAULT_WORKING_PATH: &str = "games_clone.json";
const DEFAULT_API_BASE_URL: &str = "https://api.rawg.io/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const DEFAULT_CONFIG_TOML: &str = r#"# gamecat configuration

# Authoritative catalog, only rewritten by `gamecat commit`.
committed_path = "games.json"

# Editable working copy, refreshed whenever the committed file is newer.
working_path = "games_clone.json"

# Games database API.
api_base_url = "https://api.rawg.io/api"
# api_key = "your-key"   # or set GAMECAT_API_KEY
request_timeout_secs = 30
"#;

/// Runtime configuration for the catalog tools.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Committed catalog file.
    pub committed_path: PathBuf,
    /// Working copy file.
    pub working_path: PathBuf,
    /// Base URL of the games database API.
    pub api_base_url: String,
    /// API key sent with every provider request.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            committed_path: PathBuf::from(DEFAULT_COMMITTED_PATH),
            working_path: PathBuf::from(DEFAULT_WORKING_PATH),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Load from the default config file location.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load using `path` as the config file. A missing file is not an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let defaults = Self::default();
        let settings = Config::builder()
            .set_default(
                "committed_path",
                defaults.committed_path.to_string_lossy().into_owned(),
            )?
            .set_default(
                "working_path",
                defaults.working_path.to_string_lossy().into_owned(),
            )?
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("request_timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        let mut config: Self = settings
            .try_deserialize()
            .context("invalid configuration")?;
        config.api_key = config
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        Ok(config)
    }

    /// Settings for the metadata provider client.
    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            base_url: self.api_base_url.clone(),
            api_key: self.api_key.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Default config file location.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Write a commented default config file unless one already exists.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!("wrote default configuration to {}", path.display());
    Ok(true)
}
