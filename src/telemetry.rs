//! Telemetry utilities: subscriber setup and store-call timing.

use crate::config::LogFormat;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Guard for timing a repository call and recording metrics.
///
/// Records latency when dropped, including on early `?` returns.
pub struct StoreTimer {
    operation: &'static str,
    start: Instant,
}

impl StoreTimer {
    /// Start timing an operation.
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for StoreTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_store_call(self.operation, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use axum::body::Body;
    use axum::http::Request;
    use tracing::{Span, info_span};

    /// Create a span for one HTTP request, tagged with a fresh request id.
    pub fn request(request: &Request<Body>) -> Span {
        let request_id = uuid::Uuid::new_v4();
        info_span!(
            "request",
            id = %request_id,
            method = %request.method(),
            path = %request.uri().path(),
        )
    }
}
