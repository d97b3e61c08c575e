//! Database module for persistent storage.
//!
//! Leads live in a single `leads` table reached through SQLx:
//! - PostgreSQL is the production backend
//! - SQLite serves local development and the test suite
//!
//! Both backends sit behind the [`LeadStore`] trait so request handlers never
//! know which one they are talking to.

mod leads;

pub use leads::{
    DEFAULT_LIST_LIMIT, Lead, LeadStore, MAX_LIST_LIMIT, MIN_LIST_LIMIT, PgLeadRepository,
    SqliteLeadRepository,
};

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Connection acquire timeout - prevents connection storms from blocking indefinitely.
pub(crate) const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum time a connection can remain idle before being closed.
pub(crate) const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("lead not found: {0}")]
    LeadNotFound(i32),
    #[error("unsupported database url scheme: {0}")]
    UnsupportedScheme(String),
}

/// Storage engine selected by the connection string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Sqlite,
}

impl Backend {
    /// Pick a backend from the URL scheme.
    pub fn from_url(url: &str) -> Option<Self> {
        let (scheme, _) = url.split_once(':')?;
        match scheme.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Connect to the store named by `url`, make sure the schema exists and
/// return the lead repository for it.
///
/// Any failure here is fatal to the process: the caller must not start
/// serving requests without a ready schema.
pub async fn connect(url: &str, max_connections: u32) -> Result<Arc<dyn LeadStore>, DbError> {
    let store: Arc<dyn LeadStore> = match Backend::from_url(url) {
        Some(Backend::Postgres) => Arc::new(PgLeadRepository::connect(url, max_connections).await?),
        Some(Backend::Sqlite) => {
            Arc::new(SqliteLeadRepository::connect(url, max_connections).await?)
        }
        None => {
            let scheme = url.split_once(':').map_or("", |(scheme, _)| scheme);
            return Err(DbError::UnsupportedScheme(scheme.to_string()));
        }
    };

    store.init_schema().await?;
    info!(backend = store.backend().as_str(), "Lead schema checked/created");

    Ok(store)
}
