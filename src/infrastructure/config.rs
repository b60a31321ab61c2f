//! Application configuration
//!
//! Layered with the `config` crate: built-in defaults, an optional
//! `vttbridge.toml` next to the binary, then `VTTBRIDGE_*` environment
//! variables (`VTTBRIDGE_VTT__BASE_URL`, `VTTBRIDGE_SYNC__FAN_OUT`, ...).

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::domain::value_objects::SyncSettings;

const CONFIG_FILE: &str = "vttbridge";
const ENV_PREFIX: &str = "VTTBRIDGE";

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP server port
    pub server_port: u16,
    pub persistence: PersistenceConfig,
    pub vtt: VttConfig,
    pub sync: SyncSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    pub backend: PersistenceBackend,
    /// SQLite database file, used by the `sqlite` backend
    pub sqlite_path: String,
}

/// Connection settings for the VTT's REST API
#[derive(Debug, Clone, Deserialize)]
pub struct VttConfig {
    pub base_url: String,
    /// Sent as a bearer token when present
    #[serde(default)]
    pub api_key: Option<String>,
    /// Transport timeout of the HTTP client
    pub request_timeout_ms: u64,
}

impl AppConfig {
    /// Load configuration from defaults, `vttbridge.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let sync = SyncSettings::default();
        let builder = Config::builder()
            .set_default("server_port", 3000)?
            .set_default("persistence.backend", "memory")?
            .set_default("persistence.sqlite_path", "vttbridge.db")?
            .set_default("vtt.base_url", "http://localhost:30000")?
            .set_default("vtt.request_timeout_ms", 30_000)?
            .set_default("sync.call_timeout_ms", sync.call_timeout_ms as i64)?
            .set_default("sync.fan_out", sync.fan_out as i64)?;
        Ok(builder)
    }
}
