//! Server configuration
//!
//! Layers configuration sources in this order:
//! 1. Built-in defaults
//! 2. Optional config file (`config/default.{toml,yaml,json}` unless a path is given)
//! 3. Environment variables (`DASHBOARD__*`, nested keys separated by `__`)

use alerting::AlertConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use tracing::info;

use crate::rate_limit::RateLimitConfig;

const DEFAULT_CONFIG_FILE: &str = "config/default";
const ENV_PREFIX: &str = "DASHBOARD";

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Tracing level filter (`trace`, `debug`, `info`, `warn`, `error`)
    pub log_level: String,
    /// Emit JSON log lines instead of plain text
    pub log_json: bool,
    /// Cap on retained alert records
    pub max_alert_records: usize,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
}

impl AppConfig {
    /// Address the server binds to
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Message(format!("invalid bind address: {}", e)))
    }
}

/// Load configuration from the default file location and the environment
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(None)
}

/// Load configuration, reading `path` instead of the default file when given
pub fn load_config_from(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let file = match path {
        Some(path) => File::with_name(path).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let config = Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", 8080)?
        .set_default("log_level", "info")?
        .set_default("log_json", false)?
        .set_default("max_alert_records", storage::DEFAULT_MAX_ALERT_RECORDS as u64)?
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    info!(
        "Configuration loaded (bind {}:{}, log level {})",
        app_config.host, app_config.port, app_config.log_level
    );
    Ok(app_config)
}
