// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Finalizer management for managed Services and `HealthCheck` resources.
//!
//! A finalizer keeps an object alive until the Route 53 state derived from it has been
//! removed. Both controllers follow the same pattern:
//!
//! ```rust,ignore
//! use external_route53::reconcilers::finalizers::{ensure_finalizer, handle_deletion};
//!
//! if resource.metadata.deletion_timestamp.is_some() {
//!     return handle_deletion(&ctx, &resource, FINALIZER).await;
//! }
//! ensure_finalizer(&ctx.client, &resource, FINALIZER).await?;
//! ```

use crate::context::Context;
use anyhow::Result;
use kube::api::{Patch, PatchParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use serde_json::json;
use tracing::info;

/// Cleanup that must succeed before a finalizer is removed.
#[async_trait::async_trait]
pub trait FinalizerCleanup: Resource + ResourceExt + Clone {
    /// Remove the external state owned by this resource.
    ///
    /// # Errors
    ///
    /// An error keeps the finalizer in place; deletion is retried on the next
    /// reconciliation.
    async fn cleanup(&self, ctx: &Context) -> Result<()>;
}

/// Whether `resource` carries `finalizer`.
#[must_use]
pub fn has_finalizer<T: Resource>(resource: &T, finalizer: &str) -> bool {
    resource
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|name| name == finalizer))
}

async fn patch_finalizers<T>(client: &Client, resource: &T, finalizers: Vec<String>) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    let namespace = resource.namespace().unwrap_or_default();
    let api: Api<T> = Api::namespaced(client.clone(), &namespace);
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(
        &resource.name_any(),
        &PatchParams::default(),
        &Patch::Merge(&patch),
    )
    .await?;
    Ok(())
}

/// Add a finalizer to a resource if not already present.
///
/// # Errors
///
/// Returns an error if the API patch operation fails.
pub async fn ensure_finalizer<T>(client: &Client, resource: &T, finalizer: &str) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    if has_finalizer(resource, finalizer) {
        return Ok(());
    }

    let mut finalizers = resource.meta().finalizers.clone().unwrap_or_default();
    finalizers.push(finalizer.to_string());
    patch_finalizers(client, resource, finalizers).await?;

    info!(
        kind = %T::kind(&()),
        namespace = %resource.namespace().unwrap_or_default(),
        name = %resource.name_any(),
        finalizer,
        "Added finalizer"
    );
    Ok(())
}

/// Remove a finalizer from a resource if present.
///
/// # Errors
///
/// Returns an error if the API patch operation fails.
pub async fn remove_finalizer<T>(client: &Client, resource: &T, finalizer: &str) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    if !has_finalizer(resource, finalizer) {
        return Ok(());
    }

    let mut finalizers = resource.meta().finalizers.clone().unwrap_or_default();
    finalizers.retain(|f| f != finalizer);
    patch_finalizers(client, resource, finalizers).await?;

    info!(
        kind = %T::kind(&()),
        namespace = %resource.namespace().unwrap_or_default(),
        name = %resource.name_any(),
        finalizer,
        "Removed finalizer"
    );
    Ok(())
}

/// Run the resource's cleanup, then remove its finalizer.
///
/// Does nothing when the finalizer is absent.
///
/// # Errors
///
/// Returns an error if cleanup or the finalizer removal fails; the finalizer then
/// stays and deletion is retried.
pub async fn handle_deletion<T>(ctx: &Context, resource: &T, finalizer: &str) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + FinalizerCleanup
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>
        + Send
        + Sync,
{
    if !has_finalizer(resource, finalizer) {
        return Ok(());
    }

    info!(
        kind = %T::kind(&()),
        namespace = %resource.namespace().unwrap_or_default(),
        name = %resource.name_any(),
        "Running cleanup before deletion"
    );

    resource.cleanup(ctx).await?;
    remove_finalizer(&ctx.client, resource, finalizer).await
}

#[cfg(test)]
#[path = "finalizers_tests.rs"]
mod finalizers_tests;
