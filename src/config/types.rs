//! Core configuration types and loading.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

use super::defaults::{
    default_admin_pass, default_admin_user, default_docs_title, default_listen,
    default_max_connections,
};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnv { var: &'static str, reason: String },
}

/// Service configuration.
///
/// Every section is optional in the TOML file; environment variables
/// applied through [`Config::apply_env`] take precedence over the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// HTTP listener and process-level settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Store connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Documentation gate settings.
    #[serde(default)]
    pub docs: DocsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Overlay values from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.is_empty());

        if let Some(url) = get("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(user) = get("ADMIN_USER") {
            self.docs.username = user;
        }
        if let Some(pass) = get("ADMIN_PASS") {
            self.docs.password = pass;
        }
        if let Some(addr) = get("LISTEN_ADDR") {
            self.server.listen = addr.parse().map_err(|e| ConfigError::InvalidEnv {
                var: "LISTEN_ADDR",
                reason: format!("{e}"),
            })?;
        }
        if let Some(format) = get("LOG_FORMAT") {
            self.server.log_format = match format.to_ascii_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                other => {
                    return Err(ConfigError::InvalidEnv {
                        var: "LOG_FORMAT",
                        reason: format!("expected \"text\" or \"json\", got \"{other}\""),
                    });
                }
            };
        }
        Ok(())
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the API binds to (default: 0.0.0.0:8000).
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Prometheus metrics HTTP port. Absent or 0 disables the endpoint.
    #[serde(default)]
    pub metrics_port: Option<u16>,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            metrics_port: None,
            log_format: LogFormat::default(),
        }
    }
}

/// Log line format for the tracing subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Connection string. `postgres://` and `sqlite:` schemes are accepted.
    #[serde(default)]
    pub url: Option<String>,
    /// Upper bound on pooled connections (default: 5).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

/// Credentials and labels for the interactive API documentation.
#[derive(Debug, Clone, Deserialize)]
pub struct DocsConfig {
    #[serde(default = "default_admin_user")]
    pub username: String,
    #[serde(default = "default_admin_pass")]
    pub password: String,
    /// Title shown in Swagger UI, ReDoc and the OpenAPI description.
    #[serde(default = "default_docs_title")]
    pub title: String,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            username: default_admin_user(),
            password: default_admin_pass(),
            title: default_docs_title(),
        }
    }
}
