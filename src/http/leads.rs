//! Lead endpoints and the liveness probe.

use super::AppState;
use crate::db::{DEFAULT_LIST_LIMIT, DbError, Lead, MAX_LIST_LIMIT, MIN_LIST_LIMIT};
use crate::error::ApiError;
use crate::metrics;
use crate::validation::{self, LeadSubmission};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, info};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/leads", get(list_leads).post(create_lead))
        .route("/leads/:lead_id", get(get_lead))
}

const INT_PARSING_MSG: &str = "Input should be a valid integer, unable to parse string as an integer";

#[derive(Debug, Deserialize)]
struct ListParams {
    limit: Option<String>,
}

/// An integer parameter of arbitrary size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntParam {
    Value(i64),
    /// Larger than `i64::MAX`.
    Above,
    /// Smaller than `i64::MIN`.
    Below,
}

/// Parse `[+-]digits`. `None` means the text is not an integer at all.
fn parse_int_param(raw: &str) -> Option<IntParam> {
    let text = raw.trim();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    Some(match text.parse::<i64>() {
        Ok(value) => IntParam::Value(value),
        Err(_) if negative => IntParam::Below,
        Err(_) => IntParam::Above,
    })
}

fn int_parsing_error(location: &'static str, name: &'static str) -> ApiError {
    ApiError::InvalidParam {
        location,
        name,
        reason: INT_PARSING_MSG.to_string(),
    }
}

async fn ping() -> Json<Value> {
    Json(json!({ "ping": "pong" }))
}

/// POST /leads - validate and persist a submission.
///
/// Answers 200 with the stored lead, not 201.
async fn create_lead(
    State(state): State<AppState>,
    payload: Result<Json<LeadSubmission>, JsonRejection>,
) -> Result<Json<Lead>, ApiError> {
    let Json(submission) = payload.map_err(|rejection| {
        metrics::record_validation_failure();
        ApiError::InvalidBody(rejection.body_text())
    })?;

    let lead = validation::validate(submission).map_err(|errors| {
        metrics::record_validation_failure();
        debug!(
            fields = ?errors.iter().map(|e| e.field).collect::<Vec<_>>(),
            "Lead submission rejected"
        );
        ApiError::Validation(errors)
    })?;

    let created = state
        .store
        .create(&lead)
        .await
        .map_err(store_failure("create"))?;

    metrics::record_lead_created();
    info!(lead_id = created.id, direction = %created.direction, "Lead captured");
    Ok(Json(created))
}

/// GET /leads?limit=N - newest leads first.
async fn list_leads(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Lead>>, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::InvalidParam {
        location: "query",
        name: "limit",
        reason: rejection.body_text(),
    })?;

    let limit = match params.limit.as_deref() {
        None => DEFAULT_LIST_LIMIT,
        Some(raw) => match parse_int_param(raw) {
            Some(IntParam::Value(limit)) => limit,
            Some(IntParam::Above) => MAX_LIST_LIMIT,
            Some(IntParam::Below) => MIN_LIST_LIMIT,
            None => return Err(int_parsing_error("query", "limit")),
        },
    };

    let leads = state
        .store
        .list(limit)
        .await
        .map_err(store_failure("list"))?;
    Ok(Json(leads))
}

/// GET /leads/{id} - one lead by id.
async fn get_lead(
    State(state): State<AppState>,
    lead_id: Result<Path<String>, PathRejection>,
) -> Result<Json<Lead>, ApiError> {
    let Path(lead_id) = lead_id.map_err(|rejection| ApiError::InvalidParam {
        location: "path",
        name: "lead_id",
        reason: rejection.body_text(),
    })?;

    // Ids outside the column's range were never issued.
    let id = match parse_int_param(&lead_id) {
        Some(IntParam::Value(id)) => i32::try_from(id).map_err(|_| ApiError::NotFound)?,
        Some(IntParam::Above | IntParam::Below) => return Err(ApiError::NotFound),
        None => return Err(int_parsing_error("path", "lead_id")),
    };

    let lead = state.store.get(id).await.map_err(store_failure("get"))?;
    Ok(Json(lead))
}

/// Log and count store failures on their way to a 500.
fn store_failure(operation: &'static str) -> impl Fn(DbError) -> ApiError {
    move |err| {
        let err = ApiError::from(err);
        if let ApiError::Storage(cause) = &err {
            metrics::record_store_error();
            error!(operation, error = %cause, "Lead store call failed");
        }
        err
    }
}
