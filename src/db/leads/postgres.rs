//! PostgreSQL lead repository.

use super::models::Lead;
use super::{LeadStore, clamp_limit};
use crate::db::{ACQUIRE_TIMEOUT, Backend, DbError, IDLE_TIMEOUT};
use crate::telemetry::StoreTimer;
use crate::validation::NewLead;
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS leads (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        phone TEXT NOT NULL,
        email TEXT NULL,
        direction TEXT NOT NULL,
        message TEXT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
"#;

const INSERT_LEAD: &str = r#"
    INSERT INTO leads (name, phone, email, direction, message)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, name, phone, email, direction, message, created_at
"#;

const SELECT_RECENT: &str = r#"
    SELECT id, name, phone, email, direction, message, created_at
    FROM leads
    ORDER BY created_at DESC, id DESC
    LIMIT $1
"#;

const SELECT_BY_ID: &str = r#"
    SELECT id, name, phone, email, direction, message, created_at
    FROM leads
    WHERE id = $1
"#;

/// Repository for leads stored in PostgreSQL.
#[derive(Clone)]
pub struct PgLeadRepository {
    pool: PgPool,
}

impl PgLeadRepository {
    /// Open a connection pool against `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .idle_timeout(Some(IDLE_TIMEOUT))
            .test_before_acquire(true)
            .connect(url)
            .await?;

        info!(max_connections, "PostgreSQL pool connected");
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadStore for PgLeadRepository {
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
        Backend::Postgres
    }
}
