//! SQLite lead repository.
//!
//! Timestamps are stored as RFC 3339 UTC text with millisecond precision so
//! that lexical order on `created_at` matches chronological order.

use super::models::Lead;
use super::{LeadStore, clamp_limit};
use crate::db::{ACQUIRE_TIMEOUT, Backend, DbError, IDLE_TIMEOUT};
use crate::telemetry::StoreTimer;
use crate::validation::NewLead;
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS leads (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        phone TEXT NOT NULL,
        email TEXT NULL,
        direction TEXT NOT NULL,
        message TEXT NULL,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
    )
"#;

const INSERT_LEAD: &str = r#"
    INSERT INTO leads (name, phone, email, direction, message)
    VALUES (?, ?, ?, ?, ?)
    RETURNING id, name, phone, email, direction, message, created_at
"#;

const SELECT_RECENT: &str = r#"
    SELECT id, name, phone, email, direction, message, created_at
    FROM leads
    ORDER BY created_at DESC, id DESC
    LIMIT ?
"#;

const SELECT_BY_ID: &str = r#"
    SELECT id, name, phone, email, direction, message, created_at
    FROM leads
    WHERE id = ?
"#;

/// Repository for leads stored in SQLite.
#[derive(Clone)]
pub struct SqliteLeadRepository {
    pool: SqlitePool,
}

impl SqliteLeadRepository {
    /// Open a connection pool against `url`.
    ///
    /// `sqlite::memory:` (or `sqlite://:memory:`) gets a uniquely named
    /// shared-cache database, so each pool sees its own private store.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DbError> {
        let pool = if is_memory_url(url) {
            // One pinned connection; the database vanishes when it closes.
            let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
            let memdb_uri = format!(
                "file:leadcap-memdb-{}-{}?mode=memory&cache=shared",
                std::process::id(),
                id
            );

            let options = SqliteConnectOptions::new()
                .filename(&memdb_uri)
                .shared_cache(true)
                .create_if_missing(true);

            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(ACQUIRE_TIMEOUT)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            let options = SqliteConnectOptions::from_str(url)?
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal);

            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .acquire_timeout(ACQUIRE_TIMEOUT)
                .idle_timeout(Some(IDLE_TIMEOUT))
                .test_before_acquire(true)
                .connect_with(options)
                .await?
        };

        info!(url = %url, "SQLite pool connected");
        Ok(Self { pool })
    }

    /// A ready-to-use private in-memory store.
    #[cfg(test)]
    pub async fn in_memory() -> Self {
        let repo = Self::connect("sqlite::memory:", 1)
            .await
            .expect("in-memory sqlite opens");
        repo.init_schema().await.expect("schema applies");
        repo
    }
}

fn is_memory_url(url: &str) -> bool {
    matches!(
        url,
        "sqlite::memory:" | "sqlite://:memory:" | "sqlite:memory:"
    )
}

#[async_trait]
impl LeadStore for SqliteLeadRepository {
    async fn init_schema(&self) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(CREATE_TABLE).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn create(&self, lead: &NewLead) -> Result<Lead, DbError> {
        let _timer = StoreTimer::new("create");

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, Lead>(INSERT_LEAD)
            .bind(lead.name())
            .bind(lead.phone())
            .bind(lead.email())
            .bind(lead.direction())
            .bind(lead.message())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(row)
    }

    async fn list(&self, limit: i64) -> Result<Vec<Lead>, DbError> {
        let _timer = StoreTimer::new("list");

        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query_as::<_, Lead>(SELECT_RECENT)
            .bind(clamp_limit(limit))
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(rows)
    }

    async fn get(&self, id: i32) -> Result<Lead, DbError> {
        let _timer = StoreTimer::new("get");

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, Lead>(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;

        row.ok_or(DbError::LeadNotFound(id))
    }

    fn backend(&self) -> Backend {
        Backend::Sqlite
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MAX_LIST_LIMIT;
    use crate::validation::{LeadSubmission, validate};

    fn submission(name: &str) -> NewLead {
        validate(LeadSubmission {
            name: name.into(),
            phone: "555-0100".into(),
            email: None,
            direction: "design".into(),
            message: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_returns_populated_lead() {
        let repo = SqliteLeadRepository::in_memory().await;
        let before = chrono::Utc::now();

        let lead = validate(LeadSubmission {
            name: "Ann Lee".into(),
            phone: "555-0100".into(),
            email: Some("ann@example.com".into()),
            direction: "design".into(),
            message: None,
        })
        .unwrap();
        let created = repo.create(&lead).await.unwrap();

        assert!(created.id > 0);
        assert_eq!(created.name, "Ann Lee");
        assert_eq!(created.phone, "555-0100");
        assert_eq!(created.email.as_deref(), Some("ann@example.com"));
        assert_eq!(created.direction, "design");
        assert_eq!(created.message, None);
        // The store keeps millisecond precision.
        assert!(created.created_at.timestamp_millis() >= before.timestamp_millis());
        assert!(created.created_at <= chrono::Utc::now());
    }

    #[tokio::test]
    async fn test_get_round_trips_every_field() {
        let repo = SqliteLeadRepository::in_memory().await;
        let lead = validate(LeadSubmission {
            name: "Bob O'Neil; DROP TABLE leads; --".into(),
            phone: "+1 (555) 0101".into(),
            email: Some("bob@example.org".into()),
            direction: "marketing".into(),
            message: Some("Hello 'world' \"quoted\"\nsecond line".into()),
        })
        .unwrap();

        let created = repo.create(&lead).await.unwrap();
        let fetched = repo.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(repo.list(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ids_increase() {
        let repo = SqliteLeadRepository::in_memory().await;
        let a = repo.create(&submission("Ann")).await.unwrap();
        let b = repo.create(&submission("Bob")).await.unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        let repo = SqliteLeadRepository::in_memory().await;
        let err = repo.get(99).await.unwrap_err();
        assert!(matches!(err, DbError::LeadNotFound(99)));
    }

    #[tokio::test]
    async fn test_list_empty_store() {
        let repo = SqliteLeadRepository::in_memory().await;
        assert!(repo.list(50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_one_returns_most_recent() {
        let repo = SqliteLeadRepository::in_memory().await;
        repo.create(&submission("First")).await.unwrap();
        let second = repo.create(&submission("Second")).await.unwrap();

        let page = repo.list(1).await.unwrap();
        assert_eq!(page, vec![second]);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_clamped() {
        let repo = SqliteLeadRepository::in_memory().await;
        for i in 0..5 {
            repo.create(&submission(&format!("Lead {i}"))).await.unwrap();
        }

        let all = repo.list(1_000).await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(
            all.windows(2)
                .all(|w| w[0].created_at >= w[1].created_at && w[0].id > w[1].id)
        );

        // Out-of-range limits are clamped rather than rejected.
        assert_eq!(repo.list(0).await.unwrap().len(), 1);
        assert_eq!(repo.list(-10).await.unwrap().len(), 1);
        assert_eq!(repo.list(3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_never_exceeds_ceiling() {
        let repo = SqliteLeadRepository::in_memory().await;
        for i in 0..(MAX_LIST_LIMIT + 5) {
            repo.create(&submission(&format!("Lead {i}"))).await.unwrap();
        }
        let page = repo.list(i64::MAX).await.unwrap();
        assert_eq!(page.len(), MAX_LIST_LIMIT as usize);
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let repo = SqliteLeadRepository::in_memory().await;
        let created = repo.create(&submission("Ann")).await.unwrap();
        repo.init_schema().await.unwrap();
        assert_eq!(repo.get(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_memory_stores_are_isolated() {
        let a = SqliteLeadRepository::in_memory().await;
        let b = SqliteLeadRepository::in_memory().await;
        a.create(&submission("Ann")).await.unwrap();
        assert!(b.list(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_sqlx_error() {
        let repo = SqliteLeadRepository::in_memory().await;
        sqlx::query("DROP TABLE leads")
            .execute(&repo.pool)
            .await
            .unwrap();
        let err = repo.create(&submission("Ann")).await.unwrap_err();
        assert!(matches!(err, DbError::Sqlx(_)));
        assert!(err.to_string().contains("no such table"));
    }
}
