// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Reconciliation of annotated Services.
//!
//! A Service is managed once it carries the hostname annotation. Each pass:
//!
//! 1. Keeps the Service finalizer in place so records are deleted before the Service
//!    goes away.
//! 2. When `external-route53.io/health-check: "true"` is set and no health check id is
//!    annotated yet, creates a `HealthCheck` for the Service, waits for its Route 53 id
//!    and writes the id back into the health check id annotation.
//! 3. Interprets the annotations, resolves the alias target zone and upserts the
//!    primary record together with its ownership marker.

use crate::context::{Context, Providers};
use crate::crd::HealthCheck;
use crate::errors::{self, Error};
use crate::healthcheck::resource::{build_for_service, health_check_requested, spec_patch};
use crate::labels::{HEALTH_CHECK_ID_ANNOTATION, HOSTNAME_ANNOTATION, SERVICE_FINALIZER};
use crate::metrics;
use crate::provider::{ChangeAction, ChangeBatch};
use crate::reconcilers::finalizers::{
    ensure_finalizer, handle_deletion, has_finalizer, remove_finalizer, FinalizerCleanup,
};
use crate::reconcilers::retry::{health_check_backoff, retry_api_call, wait_for};
use anyhow::{Context as _, Result};
use k8s_openapi::api::core::v1::Service;
use kube::api::{Patch, PatchParams, PostParams};
use kube::runtime::controller::Action;
use kube::{Api, ResourceExt};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// Hostname the Service asks to be published under, if any.
#[must_use]
pub fn managed_hostname(service: &Service) -> Option<&str> {
    service
        .annotations()
        .get(HOSTNAME_ANNOTATION)
        .map(|h| h.trim())
        .filter(|h| !h.is_empty())
}

/// Upsert the Service's primary record and ownership marker.
///
/// # Errors
///
/// Returns the interpreter, resolver or synchronizer error unchanged.
pub async fn sync_service_records(
    providers: &Providers,
    service: &Service,
) -> errors::Result<ChangeBatch> {
    let intent = providers.resolved_intent(service).await?;
    let batch = providers.synchronizer().upsert(&intent).await?;
    metrics::record_record_changes(ChangeAction::Upsert.as_str(), batch.changes.len());
    Ok(batch)
}

/// Delete the Service's primary record and ownership marker.
///
/// Only the record identity is needed, so a Service whose load balancer is already
/// gone is still withdrawn. A Service without a usable hostname or hosted zone names no
/// record; it is released without touching Route 53.
///
/// # Errors
///
/// Returns ownership and provider errors from the synchronizer.
pub async fn delete_service_records(
    providers: &Providers,
    service: &Service,
) -> errors::Result<Option<ChangeBatch>> {
    let intent = match providers.delete_intent(service) {
        Ok(intent) => intent,
        Err(Error::Configuration(reason)) => {
            warn!(
                namespace = %service.namespace().unwrap_or_default(),
                name = %service.name_any(),
                reason = %reason,
                "Service names no Route 53 record, leaving Route 53 untouched"
            );
            return Ok(None);
        }
        Err(err) => return Err(err),
    };

    let deleted = providers.synchronizer().delete(&intent).await?;
    if let Some(batch) = &deleted {
        metrics::record_record_changes(ChangeAction::Delete.as_str(), batch.changes.len());
    }
    Ok(deleted)
}

#[async_trait::async_trait]
impl FinalizerCleanup for Service {
    async fn cleanup(&self, ctx: &Context) -> Result<()> {
        let deleted = delete_service_records(&ctx.providers, self).await?;
        info!(
            namespace = %self.namespace().unwrap_or_default(),
            name = %self.name_any(),
            changes = deleted.map_or(0, |batch| batch.changes.len()),
            "Removed Service records"
        );
        Ok(())
    }
}

/// Create the Service's `HealthCheck`, wait for its id and annotate the Service with it.
async fn link_health_check(ctx: &Context, service: &mut Service) -> Result<()> {
    let Some(resource) = build_for_service(service)? else {
        return Ok(());
    };

    let namespace = service.namespace().unwrap_or_default();
    let name = resource.name_any();
    let health_checks: Api<HealthCheck> = Api::namespaced(ctx.client.clone(), &namespace);

    match health_checks.create(&PostParams::default(), &resource).await {
        Ok(_) => info!(namespace = %namespace, name = %name, "Created HealthCheck for Service"),
        Err(kube::Error::Api(response)) if response.code == 409 => {
            // Bring the existing resource in line with the Service's current ingress and port
            let patch_body = spec_patch(&resource);
            let params = PatchParams::default();
            let patch = Patch::Merge(&patch_body);
            retry_api_call(
                || health_checks.patch(&name, &params, &patch),
                "update existing HealthCheck spec",
            )
            .await
            .with_context(|| format!("updating HealthCheck {namespace}/{name}"))?;
            info!(
                namespace = %namespace,
                name = %name,
                "Updated existing HealthCheck for Service"
            );
        }
        Err(err) => {
            return Err(err).with_context(|| format!("creating HealthCheck {namespace}/{name}"));
        }
    }

    let id = wait_for(
        health_check_backoff(),
        || {
            let health_checks = health_checks.clone();
            let name = name.clone();
            async move {
                let found = health_checks.get_opt(&name).await?;
                Ok::<_, anyhow::Error>(
                    found
                        .and_then(|hc| hc.status)
                        .and_then(|status| status.id)
                        .filter(|id| !id.is_empty()),
                )
            }
        },
        "HealthCheck status.id",
    )
    .await?;

    let services: Api<Service> = Api::namespaced(ctx.client.clone(), &namespace);
    let service_name = service.name_any();
    let annotation = json!({ "metadata": { "annotations": { HEALTH_CHECK_ID_ANNOTATION: id } } });
    let params = PatchParams::default();
    let patch = Patch::Merge(&annotation);
    retry_api_call(
        || services.patch(&service_name, &params, &patch),
        "annotate service with health check id",
    )
    .await?;

    info!(
        namespace = %namespace,
        name = %service_name,
        health_check_id = %id,
        "Linked Route 53 health check to Service"
    );
    service
        .annotations_mut()
        .insert(HEALTH_CHECK_ID_ANNOTATION.to_string(), id);
    Ok(())
}

/// Reconcile a Service.
///
/// # Errors
///
/// Returns engine errors (downcastable to [`errors::Error`]) and Kubernetes API errors.
pub async fn reconcile_service(ctx: Arc<Context>, service: Service) -> Result<Action> {
    let namespace = service.namespace().unwrap_or_default();
    let name = service.name_any();

    if managed_hostname(&service).is_none() {
        if has_finalizer(&service, SERVICE_FINALIZER) {
            warn!(
                namespace = %namespace,
                name = %name,
                "Hostname annotation removed, releasing Service without deleting its records"
            );
            remove_finalizer(&ctx.client, &service, SERVICE_FINALIZER).await?;
        }
        return Ok(Action::await_change());
    }

    if service.metadata.deletion_timestamp.is_some() {
        handle_deletion(&ctx, &service, SERVICE_FINALIZER).await?;
        return Ok(Action::await_change());
    }

    ensure_finalizer(&ctx.client, &service, SERVICE_FINALIZER).await?;

    let mut service = service;
    if health_check_requested(&service) {
        link_health_check(&ctx, &mut service).await?;
    }

    let batch = sync_service_records(&ctx.providers, &service).await?;
    info!(
        namespace = %namespace,
        name = %name,
        changes = batch.changes.len(),
        "Service records in sync"
    );

    Ok(Action::requeue(ctx.providers.config.requeue_interval))
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod service_tests;
