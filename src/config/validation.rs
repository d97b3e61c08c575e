//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use crate::db::Backend;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("database url is required (set DATABASE_URL or [database].url)")]
    MissingDatabaseUrl,
    #[error("database url scheme is not supported: {0}")]
    UnsupportedDatabaseUrl(String),
    #[error("database.max_connections must be at least 1")]
    ZeroMaxConnections,
    #[error("docs.username must not be empty")]
    EmptyAdminUser,
    #[error("docs.password must not be empty")]
    EmptyAdminPassword,
    #[error("server.metrics_port {0} collides with the API listener port")]
    MetricsPortConflict(u16),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.database.url.as_deref() {
        None => errors.push(ValidationError::MissingDatabaseUrl),
        Some(url) if Backend::from_url(url).is_none() => {
            errors.push(ValidationError::UnsupportedDatabaseUrl(redact(url)));
        }
        Some(_) => {}
    }

    if config.database.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }

    if config.docs.username.is_empty() {
        errors.push(ValidationError::EmptyAdminUser);
    }
    if config.docs.password.is_empty() {
        errors.push(ValidationError::EmptyAdminPassword);
    }

    if let Some(port) = config.server.metrics_port
        && port != 0
        && port == config.server.listen.port()
    {
        errors.push(ValidationError::MetricsPortConflict(port));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Keep only the scheme so credentials never reach the logs.
fn redact(url: &str) -> String {
    match url.split_once(':') {
        Some((scheme, _)) => format!("{scheme}:..."),
        None => "<no scheme>".to_string(),
    }
}
