//! Interactive API documentation behind HTTP Basic auth.
//!
//! `/docs` (Swagger UI), `/redoc` and `/openapi.json` are only served to
//! callers presenting the configured admin credentials. None of the three
//! appears in the OpenAPI description itself.

use super::AppState;
use crate::config::DocsConfig;
use crate::error::{ApiError, AuthError};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::{self, Next};
use axum::response::{Html, Response};
use axum::routing::get;
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

const OPENAPI_URL: &str = "/openapi.json";

/// Credential check and pre-rendered documents for the docs endpoints.
pub struct DocsGate {
    username: String,
    password: String,
    title: String,
    openapi: Value,
}

impl DocsGate {
    pub fn new(config: &DocsConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
            title: config.title.clone(),
            openapi: openapi_document(&config.title),
        }
    }

    /// Check the `Authorization` header against the configured credentials.
    ///
    /// Both halves are always compared so the response time does not reveal
    /// which one was wrong.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let value = headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError::MissingCredentials)?;
        let value = value
            .to_str()
            .map_err(|_| AuthError::MalformedCredentials)?;

        let (scheme, encoded) = value
            .split_once(' ')
            .ok_or(AuthError::MissingCredentials)?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return Err(AuthError::MissingCredentials);
        }

        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|_| AuthError::MalformedCredentials)?;
        let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedCredentials)?;
        let (user, pass) = decoded
            .split_once(':')
            .ok_or(AuthError::MalformedCredentials)?;

        let user_ok = user.as_bytes().ct_eq(self.username.as_bytes());
        let pass_ok = pass.as_bytes().ct_eq(self.password.as_bytes());

        if bool::from(user_ok & pass_ok) {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

pub fn routes(gate: Arc<DocsGate>) -> Router<AppState> {
    Router::new()
        .route(OPENAPI_URL, get(openapi_json))
        .route("/docs", get(swagger_docs))
        .route("/redoc", get(redoc_docs))
        .route_layer(middleware::from_fn_with_state(gate, require_docs_auth))
}

async fn require_docs_auth(
    State(gate): State<Arc<DocsGate>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(err) = gate.authorize(request.headers()) {
        if err == AuthError::InvalidCredentials {
            warn!(path = %request.uri().path(), "Rejected documentation credentials");
        }
        return Err(err.into());
    }
    Ok(next.run(request).await)
}

async fn openapi_json(State(state): State<AppState>) -> Json<Value> {
    Json(state.docs.openapi.clone())
}

async fn swagger_docs(State(state): State<AppState>) -> Html<String> {
    Html(swagger_ui_html(&state.docs.title))
}

async fn redoc_docs(State(state): State<AppState>) -> Html<String> {
    Html(redoc_html(&state.docs.title))
}

fn swagger_ui_html(title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<link type="text/css" rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css">
<title>{title} - Swagger UI</title>
</head>
<body>
<div id="swagger-ui"></div>
<script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
<script>
const ui = SwaggerUIBundle({{
    url: '{OPENAPI_URL}',
    dom_id: '#swagger-ui',
    layout: 'BaseLayout',
    deepLinking: true,
    showExtensions: true,
    showCommonExtensions: true,
    presets: [SwaggerUIBundle.presets.apis, SwaggerUIBundle.SwaggerUIStandalonePreset],
}})
</script>
</body>
</html>"#,
        title = escape_html(title),
    )
}

fn redoc_html(title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>{title} - ReDoc</title>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1">
<style>body {{ margin: 0; padding: 0; }}</style>
</head>
<body>
<noscript>ReDoc requires Javascript to function. Please enable it to browse the documentation.</noscript>
<redoc spec-url="{OPENAPI_URL}"></redoc>
<script src="https://cdn.jsdelivr.net/npm/redoc@2/bundles/redoc.standalone.js"></script>
</body>
</html>"#,
        title = escape_html(title),
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// OpenAPI 3.1 description of the public endpoints.
fn openapi_document(title: &str) -> Value {
    let validation_error = json!({
        "description": "Validation Error",
        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/HTTPValidationError" } } }
    });
    let detail_error = |description: &str| {
        json!({
            "description": description,
            "content": { "application/json": { "schema": { "$ref": "#/components/schemas/HTTPError" } } }
        })
    };
    let lead_response = json!({
        "description": "Successful Response",
        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Lead" } } }
    });

    json!({
        "openapi": "3.1.0",
        "info": { "title": title, "version": env!("CARGO_PKG_VERSION") },
        "paths": {
            "/ping": {
                "get": {
                    "summary": "Ping",
                    "operationId": "ping",
                    "responses": {
                        "200": {
                            "description": "Successful Response",
                            "content": { "application/json": { "schema": {
                                "type": "object",
                                "properties": { "ping": { "type": "string", "const": "pong" } },
                                "required": ["ping"]
                            } } }
                        }
                    }
                }
            },
            "/leads": {
                "post": {
                    "summary": "Create Lead",
                    "operationId": "create_lead",
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": { "$ref": "#/components/schemas/LeadCreate" } } }
                    },
                    "responses": {
                        "200": lead_response,
                        "422": validation_error,
                        "500": detail_error("Store failure")
                    }
                },
                "get": {
                    "summary": "List Leads",
                    "operationId": "list_leads",
                    "parameters": [{
                        "name": "limit",
                        "in": "query",
                        "required": false,
                        "description": "Page size, clamped to 1..=500",
                        "schema": { "type": "integer", "default": 50 }
                    }],
                    "responses": {
                        "200": {
                            "description": "Successful Response",
                            "content": { "application/json": { "schema": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Lead" }
                            } } }
                        },
                        "422": validation_error,
                        "500": detail_error("Store failure")
                    }
                }
            },
            "/leads/{lead_id}": {
                "get": {
                    "summary": "Get Lead",
                    "operationId": "get_lead",
                    "parameters": [{
                        "name": "lead_id",
                        "in": "path",
                        "required": true,
                        "schema": { "type": "integer" }
                    }],
                    "responses": {
                        "200": lead_response,
                        "404": detail_error("Lead not found"),
                        "422": validation_error,
                        "500": detail_error("Store failure")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "LeadCreate": {
                    "type": "object",
                    "required": ["name", "phone", "direction"],
                    "properties": {
                        "name": { "type": "string", "minLength": 2 },
                        "phone": { "type": "string", "minLength": 5 },
                        "email": { "anyOf": [{ "type": "string", "format": "email" }, { "type": "null" }] },
                        "direction": { "type": "string", "minLength": 1 },
                        "message": { "anyOf": [{ "type": "string" }, { "type": "null" }] }
                    }
                },
                "Lead": {
                    "type": "object",
                    "required": ["id", "name", "phone", "email", "direction", "message", "created_at"],
                    "properties": {
                        "id": { "type": "integer" },
                        "name": { "type": "string" },
                        "phone": { "type": "string" },
                        "email": { "anyOf": [{ "type": "string", "format": "email" }, { "type": "null" }] },
                        "direction": { "type": "string" },
                        "message": { "anyOf": [{ "type": "string" }, { "type": "null" }] },
                        "created_at": { "type": "string", "format": "date-time" }
                    }
                },
                "HTTPError": {
                    "type": "object",
                    "required": ["detail"],
                    "properties": { "detail": { "type": "string" } }
                },
                "ValidationError": {
                    "type": "object",
                    "required": ["loc", "msg", "type"],
                    "properties": {
                        "loc": { "type": "array", "items": { "type": "string" } },
                        "msg": { "type": "string" },
                        "type": { "type": "string" }
                    }
                },
                "HTTPValidationError": {
                    "type": "object",
                    "properties": {
                        "detail": { "type": "array", "items": { "$ref": "#/components/schemas/ValidationError" } }
                    }
                }
            }
        }
    })
}
