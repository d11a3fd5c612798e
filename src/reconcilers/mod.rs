// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Reconciliation logic for Services and `HealthCheck` resources.
//!
//! Reconcilers return `anyhow::Result<Action>`. Engine failures keep their
//! [`crate::errors::Error`] type inside the `anyhow::Error`, which lets the
//! controller's error policy pick a requeue delay per failure kind:
//!
//! | failure | requeue |
//! | --- | --- |
//! | configuration | none, wait for the object to change |
//! | ownership conflict | 10 minutes |
//! | anything else | 60 seconds |

pub mod finalizers;
pub mod healthcheck;
pub mod retry;
pub mod service;
pub mod status;

pub use healthcheck::reconcile_health_check;
pub use service::reconcile_service;

use crate::constants::{CONFLICT_REQUEUE_DURATION_SECS, ERROR_REQUEUE_DURATION_SECS};
use crate::errors::Error;
use crate::status_reasons::{REASON_KUBERNETES_ERROR, REASON_RECONCILE_FAILED};
use std::time::Duration;

/// Check if a resource's spec has changed by comparing generation with `observed_generation`.
///
/// - When they match: spec hasn't changed since last reconciliation → skip work
/// - When they differ: spec has changed → reconcile
/// - When `observed_generation` is None: first reconciliation → reconcile
#[must_use]
pub fn should_reconcile(current_generation: Option<i64>, observed_generation: Option<i64>) -> bool {
    match (current_generation, observed_generation) {
        (Some(current), Some(observed)) => current != observed,
        (Some(_), None) => true,
        _ => false,
    }
}

/// The engine error carried by a reconcile failure, if any.
#[must_use]
pub fn engine_error(err: &anyhow::Error) -> Option<&Error> {
    err.downcast_ref::<Error>()
}

/// Delay before a failed object is reconciled again; `None` waits for a change.
#[must_use]
pub fn requeue_after(err: &anyhow::Error) -> Option<Duration> {
    match engine_error(err) {
        Some(Error::Configuration(_)) => None,
        Some(Error::OwnershipConflict { .. }) => {
            Some(Duration::from_secs(CONFLICT_REQUEUE_DURATION_SECS))
        }
        _ => Some(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS)),
    }
}

/// Status reason describing a reconcile failure.
#[must_use]
pub fn failure_reason(err: &anyhow::Error) -> &'static str {
    match engine_error(err) {
        Some(engine) => engine.status_reason(),
        None if err.downcast_ref::<kube::Error>().is_some() => REASON_KUBERNETES_ERROR,
        None => REASON_RECONCILE_FAILED,
    }
}

/// Metrics category of a reconcile failure.
#[must_use]
pub fn failure_category(err: &anyhow::Error) -> &'static str {
    match engine_error(err) {
        Some(engine) => engine.category(),
        None if err.downcast_ref::<kube::Error>().is_some() => "kubernetes",
        None => "reconcile",
    }
}
