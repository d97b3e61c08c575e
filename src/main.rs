//! leadcapd - lead capture API
//!
//! Accepts contact-form submissions, stores them in PostgreSQL (or SQLite
//! for local work) and serves them back to operators.

mod config;
mod db;
mod error;
mod http;
mod metrics;
mod telemetry;
mod validation;

use crate::config::Config;
use crate::http::AppState;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration: optional TOML file, then environment overrides
    let config_path = std::env::args().nth(1);
    let mut config = match config_path.as_deref() {
        Some(path) => Config::load(path)
            .map_err(|e| anyhow::anyhow!("failed to load config {path}: {e}"))?,
        None => Config::default(),
    };
    config.apply_env()?;

    // Initialize tracing
    telemetry::init_tracing(config.server.log_format);

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!(
            "Refusing to start with {} configuration error(s). See messages above.",
            errors.len()
        );
    }

    info!(
        listen = %config.server.listen,
        config = config_path.as_deref().unwrap_or("<env only>"),
        "Starting leadcapd"
    );

    if config::is_default_credential(&config.docs.username, &config.docs.password) {
        warn!(
            "INSECURE: API documentation is protected by placeholder or weak credentials. \
             Set ADMIN_USER and ADMIN_PASS before exposing this service."
        );
    }

    // Connect and make sure the schema exists before serving anything
    let database_url = config
        .database
        .url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;
    let store = db::connect(database_url, config.database.max_connections)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to initialize lead store");
            e
        })?;

    // Prometheus metrics are optional.
    // Convention: metrics_port = 0 disables the HTTP endpoint (used by tests).
    let metrics_port = config.server.metrics_port.unwrap_or(0);
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        info!("Metrics initialized");

        tokio::spawn(async move {
            http::run_metrics_server(metrics_port).await;
        });
        info!(port = metrics_port, "Prometheus HTTP server started");
    }

    let app = http::router(AppState::new(store, &config.docs));
    let listener = tokio::net::TcpListener::bind(config.server.listen)
        .await
        .map_err(|e| {
            error!(addr = %config.server.listen, error = %e, "Failed to bind API listener");
            e
        })?;
    info!(addr = %config.server.listen, "Lead capture API listening");

    http::serve(listener, app, shutdown_signal()).await?;

    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
