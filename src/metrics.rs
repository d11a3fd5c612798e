// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the external-route53 operator.
//!
//! All metrics carry the namespace prefix `external_route53_io_` (prometheus-safe
//! version of "external-route53.io").
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Reconcile outcomes, durations and requeues
//! - **Provider Metrics** - Route 53 record changes and health check lifecycle
//! - **Error Metrics** - Errors by category
//!
//! # Example
//!
//! ```rust,no_run
//! use external_route53::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success("Service", std::time::Duration::from_millis(120));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "external_route53_io";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

fn counter_vec(name: &str, help: &str, labels: &[&str]) -> CounterVec {
    let opts = Opts::new(format!("{METRICS_NAMESPACE}_{name}"), help);
    let counter = CounterVec::new(opts, labels).expect("metric definition is valid");
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .expect("metric is registered once");
    counter
}

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by resource type and status
///
/// Labels:
/// - `resource_type`: Kind of resource (`Service`, `HealthCheck`)
/// - `status`: Outcome (`success`, `error`, `requeue`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    counter_vec(
        "reconciliations_total",
        "Total number of reconciliations by resource type and status",
        &["resource_type", "status"],
    )
});

/// Duration of reconciliations in seconds
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds by resource type",
    )
    .buckets(vec![0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]);
    let histogram =
        HistogramVec::new(opts, &["resource_type"]).expect("metric definition is valid");
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .expect("metric is registered once");
    histogram
});

/// Total number of requeue operations
///
/// Labels:
/// - `resource_type`: Kind of resource
/// - `reason`: Status reason of the failure that caused the requeue
pub static REQUEUE_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    counter_vec(
        "requeues_total",
        "Total number of requeue operations by resource type and reason",
        &["resource_type", "reason"],
    )
});

// ============================================================================
// Provider Metrics
// ============================================================================

/// Total number of record set changes submitted to Route 53
///
/// Labels:
/// - `action`: `UPSERT` or `DELETE`
pub static RECORD_CHANGES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    counter_vec(
        "record_changes_total",
        "Total number of record set changes submitted by action",
        &["action"],
    )
});

/// Route 53 health check lifecycle operations
///
/// Labels:
/// - `operation`: `created`, `updated` or `deleted`
pub static HEALTH_CHECK_OPERATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    counter_vec(
        "health_check_operations_total",
        "Total number of Route 53 health check operations",
        &["operation"],
    )
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of errors by resource type and error category
///
/// Labels:
/// - `resource_type`: Kind of resource
/// - `error_type`: Category (`configuration`, `ownership_conflict`, `resolution`, `provider`, `kubernetes`)
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    counter_vec(
        "errors_total",
        "Total number of errors by resource type and error category",
        &["resource_type", "error_type"],
    )
});

/// Record a successful reconciliation
pub fn record_reconciliation_success(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "success"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a failed reconciliation
pub fn record_reconciliation_error(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "error"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a reconciliation requeue
///
/// # Arguments
/// * `resource_type` - The kind of resource reconciled
/// * `reason` - Reason for requeue (a status reason such as `ProviderError`)
pub fn record_reconciliation_requeue(resource_type: &str, reason: &str) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "requeue"])
        .inc();
    REQUEUE_TOTAL
        .with_label_values(&[resource_type, reason])
        .inc();
}

/// Record the changes of a submitted change batch
pub fn record_record_changes(action: &str, count: usize) {
    #[allow(clippy::cast_precision_loss)]
    RECORD_CHANGES_TOTAL
        .with_label_values(&[action])
        .inc_by(count as f64);
}

pub fn record_health_check_created() {
    HEALTH_CHECK_OPERATIONS_TOTAL
        .with_label_values(&["created"])
        .inc();
}

pub fn record_health_check_updated() {
    HEALTH_CHECK_OPERATIONS_TOTAL
        .with_label_values(&["updated"])
        .inc();
}

pub fn record_health_check_deleted() {
    HEALTH_CHECK_OPERATIONS_TOTAL
        .with_label_values(&["deleted"])
        .inc();
}

/// Record an error
pub fn record_error(resource_type: &str, error_type: &str) {
    ERRORS_TOTAL
        .with_label_values(&[resource_type, error_type])
        .inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
