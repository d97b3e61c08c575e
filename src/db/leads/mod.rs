//! Lead repository.
//!
//! One table, three operations: insert a validated lead, list the newest
//! leads, fetch one by id. Every value coming from a request is bound as a
//! query parameter and every operation runs in its own transaction.

mod models;
mod postgres;
mod sqlite;

pub use models::Lead;
pub use postgres::PgLeadRepository;
pub use sqlite::SqliteLeadRepository;

use super::{Backend, DbError};
use crate::validation::NewLead;
use async_trait::async_trait;

/// Smallest page `list` will return.
pub const MIN_LIST_LIMIT: i64 = 1;
/// Hard ceiling on a single `list` page.
pub const MAX_LIST_LIMIT: i64 = 500;
/// Page size when the caller does not ask for one.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Clamp a caller-supplied page size into `[MIN_LIST_LIMIT, MAX_LIST_LIMIT]`.
#[inline]
pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(MIN_LIST_LIMIT, MAX_LIST_LIMIT)
}

/// Persistent lead storage.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Create the `leads` table if it does not exist yet.
    async fn init_schema(&self) -> Result<(), DbError>;

    /// Insert a lead and return it with its store-assigned id and timestamp.
    async fn create(&self, lead: &NewLead) -> Result<Lead, DbError>;

    /// Newest leads first, at most `clamp_limit(limit)` of them.
    async fn list(&self, limit: i64) -> Result<Vec<Lead>, DbError>;

    /// Fetch a lead by exact id.
    async fn get(&self, id: i32) -> Result<Lead, DbError>;

    /// Which engine backs this store.
    fn backend(&self) -> Backend;
}
