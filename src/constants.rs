// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Global constants for the external-route53 operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// Kind name for `HealthCheck` resource
pub const KIND_HEALTH_CHECK: &str = "HealthCheck";

/// Kind name for core `Service` resource
pub const KIND_SERVICE: &str = "Service";

// ============================================================================
// Record Constants
// ============================================================================

/// The only record type the operator writes for primary records
pub const SUPPORTED_RECORD_TYPE: &str = "A";

/// Default record weight when no weight annotation is present
pub const DEFAULT_RECORD_WEIGHT: i64 = 1;

/// Maximum weight accepted by Route 53 for weighted records
pub const MAX_RECORD_WEIGHT: i64 = 255;

/// Default TTL for primary records (10 seconds)
pub const DEFAULT_RECORD_TTL_SECS: i64 = 10;

/// Minimum TTL accepted for primary records
pub const MIN_RECORD_TTL_SECS: i64 = 10;

/// TTL of the ownership marker TXT record (5 minutes)
pub const MARKER_TTL_SECS: i64 = 300;

/// Default prefix prepended to the hostname to form the marker record name
pub const DEFAULT_MARKER_PREFIX: &str = "extr53-";

/// Value of the ownership marker TXT record (quoted, as TXT data requires)
pub const MARKER_SIGNATURE: &str = "\"set by external-route53\"";

/// Comment attached to every change batch
pub const CHANGE_BATCH_COMMENT: &str = "change from external-route53";

/// Number of record sets requested per listing page
pub const RECORD_LIST_PAGE_SIZE: i32 = 100;

// ============================================================================
// Health Check Constants
// ============================================================================

/// Request interval when `fastInterval` is enabled
pub const FAST_REQUEST_INTERVAL_SECS: i32 = 10;

/// Request interval when `fastInterval` is disabled
pub const STANDARD_REQUEST_INTERVAL_SECS: i32 = 30;

/// Failure threshold used when the spec leaves it unset
pub const DEFAULT_FAILURE_THRESHOLD: i32 = 3;

/// Tag key carrying the human readable health check name
pub const HEALTH_CHECK_NAME_TAG: &str = "Name";

// ============================================================================
// Controller Error Handling Constants
// ============================================================================

/// Requeue duration for retryable controller errors (1 minute)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 60;

/// Requeue duration after an ownership conflict (10 minutes)
pub const CONFLICT_REQUEUE_DURATION_SECS: u64 = 600;

/// Requeue duration after a successful reconcile (5 minutes)
pub const SUCCESS_REQUEUE_DURATION_SECS: u64 = 300;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
