//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts and latency for the operational surface
//! - Search mirror upserts and deletes by document kind and outcome
//! - Backlog sweeps and the documents they re-submitted
//! - Vote transitions by target kind
//! - Cascade deletions by outcome

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

const NAMESPACE: &str = "community_store";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace(NAMESPACE)
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Mirror upserts by document kind and outcome ("ok", "error")
pub static MIRROR_SYNC_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mirror_sync_total", "Search mirror upsert attempts").namespace(NAMESPACE),
        &["kind", "outcome"],
    )
    .expect("Failed to create MIRROR_SYNC_TOTAL metric")
});

/// Mirror deletes by document kind and outcome
pub static MIRROR_DELETE_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mirror_delete_total", "Search mirror delete attempts").namespace(NAMESPACE),
        &["kind", "outcome"],
    )
    .expect("Failed to create MIRROR_DELETE_TOTAL metric")
});

/// Completed backlog sweeps
pub static BACKLOG_SWEEP_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new("backlog_sweep_total", "Completed backlog sweeps").namespace(NAMESPACE),
    )
    .expect("Failed to create BACKLOG_SWEEP_TOTAL metric")
});

/// Documents handled by sweeps, by kind and outcome ("indexed", "failed", "skipped")
pub static BACKLOG_SWEPT_DOCUMENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "backlog_swept_documents_total",
            "Unindexed documents re-submitted by the backlog sweep",
        )
        .namespace(NAMESPACE),
        &["kind", "outcome"],
    )
    .expect("Failed to create BACKLOG_SWEPT_DOCUMENTS_TOTAL metric")
});

/// Applied vote requests by target kind and transition
pub static VOTES_APPLIED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("votes_applied_total", "Vote requests applied to the ledger")
            .namespace(NAMESPACE),
        &["kind", "transition"], // "cast", "flip", "retract", "noop"
    )
    .expect("Failed to create VOTES_APPLIED_TOTAL metric")
});

/// Group cascades by outcome ("completed", "failed")
pub static CASCADE_DELETIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cascade_deletions_total", "Group cascade deletions").namespace(NAMESPACE),
        &["outcome"],
    )
    .expect("Failed to create CASCADE_DELETIONS_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
        .expect("Failed to register HTTP_REQUEST_DURATION_SECONDS");
    registry
        .register(Box::new(MIRROR_SYNC_TOTAL.clone()))
        .expect("Failed to register MIRROR_SYNC_TOTAL");
    registry
        .register(Box::new(MIRROR_DELETE_TOTAL.clone()))
        .expect("Failed to register MIRROR_DELETE_TOTAL");
    registry
        .register(Box::new(BACKLOG_SWEEP_TOTAL.clone()))
        .expect("Failed to register BACKLOG_SWEEP_TOTAL");
    registry
        .register(Box::new(BACKLOG_SWEPT_DOCUMENTS_TOTAL.clone()))
        .expect("Failed to register BACKLOG_SWEPT_DOCUMENTS_TOTAL");
    registry
        .register(Box::new(VOTES_APPLIED_TOTAL.clone()))
        .expect("Failed to register VOTES_APPLIED_TOTAL");
    registry
        .register(Box::new(CASCADE_DELETIONS_TOTAL.clone()))
        .expect("Failed to register CASCADE_DELETIONS_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

fn outcome(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "error"
    }
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

pub fn record_mirror_sync(kind: &str, ok: bool) {
    MIRROR_SYNC_TOTAL
        .with_label_values(&[kind, outcome(ok)])
        .inc();
}

pub fn record_mirror_delete(kind: &str, ok: bool) {
    MIRROR_DELETE_TOTAL
        .with_label_values(&[kind, outcome(ok)])
        .inc();
}

/// Record one finished sweep and the per-kind document counts.
pub fn record_sweep(kind: &str, indexed: u64, failed: u64, skipped: u64) {
    for (label, count) in [("indexed", indexed), ("failed", failed), ("skipped", skipped)] {
        if count > 0 {
            BACKLOG_SWEPT_DOCUMENTS_TOTAL
                .with_label_values(&[kind, label])
                .inc_by(count);
        }
    }
}

pub fn record_sweep_completed() {
    BACKLOG_SWEEP_TOTAL.inc();
}

pub fn record_vote(kind: &str, transition: &str) {
    VOTES_APPLIED_TOTAL
        .with_label_values(&[kind, transition])
        .inc();
}

pub fn record_cascade(completed: bool) {
    CASCADE_DELETIONS_TOTAL
        .with_label_values(&[if completed { "completed" } else { "failed" }])
        .inc();
}
