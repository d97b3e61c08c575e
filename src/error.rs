//! Unified error handling for the HTTP boundary.
//!
//! Every failure a handler can produce ends up as an [`ApiError`], which
//! knows its status code and its JSON `detail` payload.

use crate::db::DbError;
use crate::validation::ValidationError;
use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// Documentation gate errors
// ============================================================================

/// Reasons the documentation gate turned a request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    MissingCredentials,
    #[error("Invalid authentication credentials")]
    MalformedCredentials,
    #[error("Unauthorized")]
    InvalidCredentials,
}

// ============================================================================
// API errors
// ============================================================================

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("submission failed validation")]
    Validation(Vec<ValidationError>),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("invalid {location} parameter {name}: {reason}")]
    InvalidParam {
        location: &'static str,
        name: &'static str,
        reason: String,
    },

    #[error("Lead not found")]
    NotFound,

    #[error("DB error: {0}")]
    Storage(DbError),

    #[error("{0}")]
    Auth(#[from] AuthError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidBody(_) | Self::InvalidParam { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::LeadNotFound(_) => Self::NotFound,
            other => Self::Storage(other),
        }
    }
}

/// One entry of a 422 `detail` list.
#[derive(Debug, Serialize)]
struct FieldDetail {
    loc: Vec<&'static str>,
    msg: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            Self::Validation(errors) => {
                let detail: Vec<FieldDetail> = errors
                    .iter()
                    .map(|e| FieldDetail {
                        loc: vec!["body", e.field],
                        msg: e.rule.to_string(),
                        kind: e.rule.code(),
                    })
                    .collect();
                (status, Json(json!({ "detail": detail }))).into_response()
            }
            Self::InvalidBody(reason) => {
                let detail = vec![FieldDetail {
                    loc: vec!["body"],
                    msg: reason,
                    kind: "json_invalid",
                }];
                (status, Json(json!({ "detail": detail }))).into_response()
            }
            Self::InvalidParam {
                location,
                name,
                reason,
            } => {
                let detail = vec![FieldDetail {
                    loc: vec![location, name],
                    msg: reason,
                    kind: "int_parsing",
                }];
                (status, Json(json!({ "detail": detail }))).into_response()
            }
            Self::Auth(err) => {
                let mut response =
                    (status, Json(json!({ "detail": err.to_string() }))).into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Basic"));
                response
            }
            other => (status, Json(json!({ "detail": other.to_string() }))).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Rule;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Validation(vec![]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Storage(DbError::Sqlx(sqlx::Error::PoolTimedOut)).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_db_not_found_maps_to_not_found() {
        let err = ApiError::from(DbError::LeadNotFound(7));
        assert!(matches!(err, ApiError::NotFound));
    }

    #[tokio::test]
    async fn test_validation_body_shape() {
        let err = ApiError::Validation(vec![ValidationError {
            field: "name",
            rule: Rule::TooShort { min: 2 },
        }]);
        let body = body_json(err.into_response()).await;
        assert_eq!(body["detail"][0]["loc"], serde_json::json!(["body", "name"]));
        assert_eq!(body["detail"][0]["type"], "string_too_short");
        assert_eq!(
            body["detail"][0]["msg"],
            "String should have at least 2 characters"
        );
    }

    #[tokio::test]
    async fn test_storage_detail_embeds_cause() {
        let err = ApiError::from(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("DB error: "));
        assert!(detail.contains("timed out"));
    }

    #[tokio::test]
    async fn test_auth_error_carries_challenge() {
        let response = ApiError::from(AuthError::MissingCredentials).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Basic");
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Not authenticated");
    }

    #[tokio::test]
    async fn test_not_found_detail() {
        let body = body_json(ApiError::NotFound.into_response()).await;
        assert_eq!(body, serde_json::json!({ "detail": "Lead not found" }));
    }
}
