//! Prometheus metrics collection for leadcap.
//!
//! Exposed on a separate HTTP listener when `server.metrics_port` is set.
//!
//! - `leads_created_total` - leads persisted
//! - `lead_validation_failures_total` - submissions rejected before storage
//! - `lead_store_errors_total` - store failures surfaced as 500s
//! - `lead_store_duration_seconds{operation}` - repository call latency

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Total leads successfully persisted.
pub static LEADS_CREATED: OnceLock<IntCounter> = OnceLock::new();

/// Total submissions rejected by validation.
pub static VALIDATION_FAILURES: OnceLock<IntCounter> = OnceLock::new();

/// Total store failures returned to callers.
pub static STORE_ERRORS: OnceLock<IntCounter> = OnceLock::new();

/// Repository call latency by operation.
pub static STORE_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Called once at startup; recording before `init` is a silent no-op.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            match $init {
                Ok(m) => {
                    if let Err(e) = r.register(Box::new(m.clone())) {
                        tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                    }
                    let _ = $metric.set(m);
                }
                Err(e) => {
                    tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                }
            }
        };
    }

    register!(LEADS_CREATED, IntCounter::new("leads_created_total", "Leads persisted"));
    register!(VALIDATION_FAILURES, IntCounter::new("lead_validation_failures_total", "Lead submissions rejected by validation"));
    register!(STORE_ERRORS, IntCounter::new("lead_store_errors_total", "Store failures surfaced to callers"));
    register!(STORE_LATENCY, HistogramVec::new(
        HistogramOpts::new("lead_store_duration_seconds", "Lead repository call latency")
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["operation"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

#[inline]
pub fn record_lead_created() {
    if let Some(c) = LEADS_CREATED.get() {
        c.inc();
    }
}

#[inline]
pub fn record_validation_failure() {
    if let Some(c) = VALIDATION_FAILURES.get() {
        c.inc();
    }
}

#[inline]
pub fn record_store_error() {
    if let Some(c) = STORE_ERRORS.get() {
        c.inc();
    }
}

/// Record a repository call with latency.
#[inline]
pub fn record_store_call(operation: &str, duration_secs: f64) {
    if let Some(h) = STORE_LATENCY.get() {
        h.with_label_values(&[operation]).observe(duration_secs);
    }
}
