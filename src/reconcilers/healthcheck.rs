// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Reconciliation of `HealthCheck` resources.
//!
//! The Route 53 check is keyed by its caller reference, so a pass can always find
//! the check it created earlier even when `status.id` was lost. A resource whose spec
//! generation was already applied and reported `Ready` is left alone.

use crate::context::Context;
use crate::crd::HealthCheck;
use crate::errors;
use crate::healthcheck::HealthCheckDescriptor;
use crate::labels::HEALTH_CHECK_FINALIZER;
use crate::reconcilers::finalizers::{ensure_finalizer, handle_deletion, FinalizerCleanup};
use crate::reconcilers::should_reconcile;
use crate::reconcilers::status::{find_condition, HealthCheckStatusUpdater};
use crate::status_reasons::{CONDITION_TYPE_READY, REASON_SYNCED};
use anyhow::Result;
use kube::runtime::controller::Action;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[async_trait::async_trait]
impl FinalizerCleanup for HealthCheck {
    async fn cleanup(&self, ctx: &Context) -> Result<()> {
        let descriptor = HealthCheckDescriptor::from_resource(self);
        let (_, freed) = ctx.providers.provisioner().delete(&descriptor).await?;
        info!(
            namespace = %descriptor.namespace,
            name = %descriptor.name,
            id = ?freed,
            "Released Route 53 health check"
        );
        Ok(())
    }
}

/// Whether the current generation is applied, reported ready and has an id.
#[must_use]
pub fn is_up_to_date(health_check: &HealthCheck) -> bool {
    let Some(status) = health_check.status.as_ref() else {
        return false;
    };
    let has_id = status.id.as_deref().is_some_and(|id| !id.is_empty());
    let ready = find_condition(&status.conditions, CONDITION_TYPE_READY)
        .is_some_and(|c| c.status == "True");

    has_id
        && ready
        && !should_reconcile(health_check.metadata.generation, status.observed_generation)
}

/// Fold the result of an ensure into the pending status.
pub fn record_outcome(
    updater: &mut HealthCheckStatusUpdater,
    generation: Option<i64>,
    outcome: &errors::Result<HealthCheckDescriptor>,
) {
    match outcome {
        Ok(ensured) => {
            let id = ensured.provider_health_check_id.clone();
            let message = format!(
                "Route 53 health check {} matches generation {}",
                id.as_deref().unwrap_or_default(),
                generation.unwrap_or_default()
            );
            updater.set_id(id);
            updater.set_observed_generation(generation);
            updater.set_ready(REASON_SYNCED, &message);
        }
        Err(err) => updater.set_not_ready(err.status_reason(), &err.to_string()),
    }
}

/// Reconcile a `HealthCheck`.
///
/// # Errors
///
/// Returns engine errors (downcastable to [`errors::Error`]) and Kubernetes API errors.
pub async fn reconcile_health_check(ctx: Arc<Context>, health_check: HealthCheck) -> Result<Action> {
    if health_check.metadata.deletion_timestamp.is_some() {
        handle_deletion(&ctx, &health_check, HEALTH_CHECK_FINALIZER).await?;
        return Ok(Action::await_change());
    }

    ensure_finalizer(&ctx.client, &health_check, HEALTH_CHECK_FINALIZER).await?;

    if is_up_to_date(&health_check) {
        debug!(
            namespace = %health_check.namespace().unwrap_or_default(),
            name = %health_check.name_any(),
            "Generation already applied, skipping"
        );
        return Ok(Action::await_change());
    }

    let descriptor = HealthCheckDescriptor::from_resource(&health_check);
    let outcome = ctx.providers.provisioner().ensure(&descriptor).await;

    let mut updater = HealthCheckStatusUpdater::new(&health_check);
    record_outcome(&mut updater, health_check.metadata.generation, &outcome);

    match outcome {
        Ok(ensured) => {
            updater.apply(&ctx.client).await?;
            info!(
                namespace = %ensured.namespace,
                name = %ensured.name,
                id = ?ensured.provider_health_check_id,
                "HealthCheck in sync"
            );
            Ok(Action::await_change())
        }
        Err(err) => {
            if let Err(status_err) = updater.apply(&ctx.client).await {
                warn!(error = %status_err, "Failed to record HealthCheck failure in status");
            }
            Err(err.into())
        }
    }
}

#[cfg(test)]
#[path = "healthcheck_tests.rs"]
mod healthcheck_tests;
