//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the mock/real API toggle, backend URL, refresh cadence, which store
//! holds the session, and the last email used to log in.
//!
//! Configuration is stored at `~/.config/visionaries-school/config.json`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::client::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::api::mock::DEFAULT_MOCK_DELAY_MS;
use crate::auth::scheduler::DEFAULT_REFRESH_INTERVAL_SECS;
use crate::store::StoreKind;

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "visionaries-school";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub use_mock_data: bool,
    pub base_url: String,
    pub mock_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub refresh_interval_secs: u64,
    pub store: StoreKind,
    pub last_email: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_mock_data: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            mock_delay_ms: DEFAULT_MOCK_DELAY_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            store: StoreKind::default(),
            last_email: None,
            log_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    pub fn load_from(path: PathBuf) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let mut config: Self =
                serde_json::from_str(&contents).context("Failed to parse config file")?;
            config.sanitize();
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(Self::config_path()?)
    }

    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `VISIONARIES_*` environment variables on top of the file values.
    /// Unparseable values are logged and ignored.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(value) = var("VISIONARIES_USE_MOCK") {
            match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => self.use_mock_data = true,
                "0" | "false" | "no" => self.use_mock_data = false,
                other => warn!(value = other, "Ignoring invalid VISIONARIES_USE_MOCK"),
            }
        }
        if let Some(url) = var("VISIONARIES_BASE_URL") {
            self.base_url = url;
        }
        if let Some(value) = var("VISIONARIES_STORE") {
            match value.parse() {
                Ok(kind) => self.store = kind,
                Err(e) => warn!(error = %e, "Ignoring invalid VISIONARIES_STORE"),
            }
        }
        if let Some(value) = var("VISIONARIES_REFRESH_INTERVAL_SECS") {
            match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.refresh_interval_secs = secs,
                _ => warn!(value = %value, "Ignoring invalid VISIONARIES_REFRESH_INTERVAL_SECS"),
            }
        }
    }

    /// Replace zero durations with their defaults.
    fn sanitize(&mut self) {
        if self.refresh_interval_secs == 0 {
            warn!("refresh_interval_secs must be positive, using default");
            self.refresh_interval_secs = DEFAULT_REFRESH_INTERVAL_SECS;
        }
        if self.request_timeout_secs == 0 {
            warn!("request_timeout_secs must be positive, using default");
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the file-backed session store.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
