//! HTTP surface.
//!
//! - [`leads`]: the public lead endpoints and `/ping`
//! - [`docs`]: Swagger UI, ReDoc and the OpenAPI description behind Basic auth
//!
//! The Prometheus endpoint runs on its own listener, see [`run_metrics_server`].

mod docs;
mod leads;

pub use docs::DocsGate;

use crate::config::DocsConfig;
use crate::db::LeadStore;
use axum::{Router, routing::get};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LeadStore>,
    pub docs: Arc<DocsGate>,
}

impl AppState {
    pub fn new(store: Arc<dyn LeadStore>, docs: &DocsConfig) -> Self {
        Self {
            store,
            docs: Arc::new(DocsGate::new(docs)),
        }
    }
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(leads::routes())
        .merge(docs::routes(state.docs.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(crate::telemetry::spans::request)
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
        .with_state(state)
}

/// Serve the API until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

/// Run the HTTP server for Prometheus metrics.
///
/// Binds to `0.0.0.0:port` and serves the `/metrics` endpoint.
/// This is a long-running task that should be spawned in the background.
pub async fn run_metrics_server(port: u16) {
    let app = Router::new().route("/metrics", get(metrics_handler));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Prometheus HTTP server listening on {}", addr);

    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind metrics server on {}: {}", addr, e);
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Metrics server error: {}", e);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::db::SqliteLeadRepository;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::Value;
    use tower::ServiceExt;

    pub const TEST_USER: &str = "ops";
    pub const TEST_PASS: &str = "correct-horse-battery";

    /// A router over a fresh in-memory store.
    pub async fn app() -> Router {
        let store: Arc<dyn LeadStore> = Arc::new(SqliteLeadRepository::in_memory().await);
        let docs = DocsConfig {
            username: TEST_USER.to_string(),
            password: TEST_PASS.to_string(),
            ..DocsConfig::default()
        };
        router(AppState::new(store, &docs))
    }

    pub fn basic(user: &str, pass: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
    }

    pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        let (status, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    pub async fn post_json(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let (status, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }
}
