// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Status condition helpers and the `HealthCheck` status updater.
//!
//! Conditions follow the Kubernetes conventions:
//! - `type`: The aspect of the resource being reported (`Ready`)
//! - `status`: "True", "False", or "Unknown"
//! - `reason`: A programmatic identifier (CamelCase)
//! - `message`: A human-readable explanation
//! - `lastTransitionTime`: RFC3339 timestamp when the condition changed
//!
//! # Example
//!
//! ```rust,no_run
//! use external_route53::reconcilers::status::create_condition;
//!
//! let condition = create_condition("Ready", "True", "Synced", "Health check in sync");
//! assert_eq!(condition.status, "True");
//! ```

use crate::crd::{Condition, HealthCheck, HealthCheckStatus};
use crate::status_reasons::CONDITION_TYPE_READY;
use anyhow::Result;
use chrono::Utc;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::debug;

/// Create a new Kubernetes condition with the current timestamp.
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Find a condition by type in a list of conditions.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Update or add a condition in a mutable conditions list (in-memory, no API call).
///
/// The `lastTransitionTime` is preserved while the status stays the same.
pub fn update_condition_in_memory(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        let last_transition_time = if existing.status == status {
            existing
                .last_transition_time
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339())
        } else {
            Utc::now().to_rfc3339()
        };

        existing.status = status.to_string();
        existing.reason = Some(reason.to_string());
        existing.message = Some(message.to_string());
        existing.last_transition_time = Some(last_transition_time);
    } else {
        conditions.push(create_condition(condition_type, status, reason, message));
    }
}

/// Compare two condition lists ignoring `lastTransitionTime`.
#[must_use]
pub fn conditions_equal(current: &[Condition], new: &[Condition]) -> bool {
    current.len() == new.len()
        && new.iter().all(|new_cond| {
            find_condition(current, &new_cond.r#type).is_some_and(|curr| {
                curr.status == new_cond.status
                    && curr.reason == new_cond.reason
                    && curr.message == new_cond.message
            })
        })
}

/// Collects `HealthCheck` status changes and writes them in one patch.
pub struct HealthCheckStatusUpdater {
    namespace: String,
    name: String,
    current_status: Option<HealthCheckStatus>,
    new_status: HealthCheckStatus,
}

impl HealthCheckStatusUpdater {
    #[must_use]
    pub fn new(health_check: &HealthCheck) -> Self {
        let current_status = health_check.status.clone();
        Self {
            namespace: health_check.namespace().unwrap_or_default(),
            name: health_check.name_any(),
            new_status: current_status.clone().unwrap_or_default(),
            current_status,
        }
    }

    /// Record the Route 53 id, or clear it with `None`.
    pub fn set_id(&mut self, id: Option<String>) {
        self.new_status.id = id;
    }

    pub fn set_observed_generation(&mut self, generation: Option<i64>) {
        self.new_status.observed_generation = generation;
    }

    pub fn set_ready(&mut self, reason: &str, message: &str) {
        update_condition_in_memory(
            &mut self.new_status.conditions,
            CONDITION_TYPE_READY,
            "True",
            reason,
            message,
        );
    }

    pub fn set_not_ready(&mut self, reason: &str, message: &str) {
        update_condition_in_memory(
            &mut self.new_status.conditions,
            CONDITION_TYPE_READY,
            "False",
            reason,
            message,
        );
    }

    #[must_use]
    pub fn status(&self) -> &HealthCheckStatus {
        &self.new_status
    }

    /// Whether the collected status differs from the one read from the cluster.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        match &self.current_status {
            None => true,
            Some(current) => {
                current.id != self.new_status.id
                    || current.result != self.new_status.result
                    || current.observed_generation != self.new_status.observed_generation
                    || !conditions_equal(&current.conditions, &self.new_status.conditions)
            }
        }
    }

    /// Apply the collected status changes, skipping the call when nothing changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the Kubernetes API call fails.
    pub async fn apply(&self, client: &Client) -> Result<()> {
        if !self.has_changes() {
            debug!(
                namespace = %self.namespace,
                name = %self.name,
                "HealthCheck status unchanged, skipping update"
            );
            return Ok(());
        }

        let api: Api<HealthCheck> = Api::namespaced(client.clone(), &self.namespace);
        let patch = json!({ "status": self.new_status });
        api.patch_status(&self.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;

        debug!(
            namespace = %self.namespace,
            name = %self.name,
            id = ?self.new_status.id,
            "Updated HealthCheck status"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
