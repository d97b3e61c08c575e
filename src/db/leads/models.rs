//! Lead database models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A captured contact-form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Lead {
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub direction: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}
