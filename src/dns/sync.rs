// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Record synchronizer: applies a [`RecordIntent`] to Route 53.
//!
//! Both operations validate the intent and check ownership before mutating anything,
//! then submit a single atomic change batch holding the primary record and its marker.

use super::ownership::{ObservedRecords, OwnershipValidator};
use super::RecordIntent;
use crate::constants::{CHANGE_BATCH_COMMENT, MARKER_SIGNATURE, MARKER_TTL_SECS};
use crate::errors::Result;
use crate::provider::{
    AliasTarget, Change, ChangeAction, ChangeBatch, RecordSet, RecordType, Route53Api,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Primary record set for `intent`.
#[must_use]
pub fn primary_record(intent: &RecordIntent) -> RecordSet {
    let (ttl, values, alias_target) = if intent.is_alias {
        (
            None,
            Vec::new(),
            Some(AliasTarget {
                hosted_zone_id: intent
                    .alias_target_zone_id
                    .clone()
                    .unwrap_or_else(|| intent.hosted_zone_id.clone()),
                dns_name: intent.target_hostname.clone().unwrap_or_default(),
                evaluate_target_health: true,
            }),
        )
    } else {
        (
            Some(intent.ttl),
            intent.target_ip_address.iter().cloned().collect(),
            None,
        )
    };

    RecordSet {
        name: intent.hostname.clone(),
        record_type: RecordType::from(intent.record_type.as_str()),
        set_identifier: Some(intent.set_identifier.clone()),
        weight: Some(intent.weight),
        ttl,
        values,
        alias_target,
        health_check_id: intent.health_check_id.clone(),
    }
}

/// Ownership marker record set for `intent`.
#[must_use]
pub fn marker_record(intent: &RecordIntent, marker_name: &str) -> RecordSet {
    RecordSet {
        name: marker_name.to_string(),
        record_type: RecordType::Txt,
        set_identifier: Some(intent.set_identifier.clone()),
        weight: Some(intent.weight),
        ttl: Some(MARKER_TTL_SECS),
        values: vec![MARKER_SIGNATURE.to_string()],
        alias_target: None,
        health_check_id: None,
    }
}

/// Issues UPSERT and DELETE change batches for managed records.
#[derive(Clone)]
pub struct RecordSynchronizer {
    route53: Arc<dyn Route53Api>,
    validator: OwnershipValidator,
}

impl RecordSynchronizer {
    pub fn new(route53: Arc<dyn Route53Api>, marker_prefix: impl Into<String>) -> Self {
        let validator = OwnershipValidator::new(route53.clone(), marker_prefix);
        Self { route53, validator }
    }

    #[must_use]
    pub fn validator(&self) -> &OwnershipValidator {
        &self.validator
    }

    /// Create or update the primary record and its marker.
    ///
    /// Returns the submitted batch.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::Error::Configuration`] for an invalid intent,
    /// [`crate::errors::Error::OwnershipConflict`] when the hostname is not ours, and
    /// [`crate::errors::Error::Provider`] when a provider call fails.
    pub async fn upsert(&self, intent: &RecordIntent) -> Result<ChangeBatch> {
        intent.validate()?;
        let observed = self.validator.validate(intent).await?;

        let batch = ChangeBatch {
            comment: Some(CHANGE_BATCH_COMMENT.to_string()),
            changes: vec![
                Change {
                    action: ChangeAction::Upsert,
                    record_set: primary_record(intent),
                },
                Change {
                    action: ChangeAction::Upsert,
                    record_set: marker_record(intent, &observed.marker_name),
                },
            ],
        };

        self.route53
            .change_resource_record_sets(&intent.hosted_zone_id, &batch)
            .await?;

        info!(
            hostname = %intent.hostname,
            set_identifier = %intent.set_identifier,
            hosted_zone_id = %intent.hosted_zone_id,
            alias = intent.is_alias,
            "Upserted record and ownership marker"
        );
        Ok(batch)
    }

    /// Delete the primary record and marker owned by the intent's set identifier.
    ///
    /// Deletes use the record sets exactly as observed, so only the intent's identity is
    /// validated; target, TTL and weight are ignored. When neither exists no call is made
    /// and `None` is returned. A provider "not found" is treated as success.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::Error::Configuration`] for an invalid identity, and ownership or
    /// provider errors as [`Self::upsert`] does.
    pub async fn delete(&self, intent: &RecordIntent) -> Result<Option<ChangeBatch>> {
        intent.validate_identity()?;
        let observed = self.validator.observe(intent).await?;

        let Some(batch) = delete_batch(intent, &observed) else {
            debug!(
                hostname = %intent.hostname,
                set_identifier = %intent.set_identifier,
                "No owned records to delete"
            );
            return Ok(None);
        };
        OwnershipValidator::verify(intent, &observed)?;

        match self
            .route53
            .change_resource_record_sets(&intent.hosted_zone_id, &batch)
            .await
        {
            Ok(()) => {
                info!(
                    hostname = %intent.hostname,
                    set_identifier = %intent.set_identifier,
                    changes = batch.changes.len(),
                    "Deleted record and ownership marker"
                );
                Ok(Some(batch))
            }
            Err(err) if err.is_not_found() => {
                debug!(hostname = %intent.hostname, error = %err, "Records already gone");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }
}

fn delete_batch(intent: &RecordIntent, observed: &ObservedRecords) -> Option<ChangeBatch> {
    let changes: Vec<Change> = [
        observed.primary_for(intent),
        observed.marker_for(&intent.set_identifier),
    ]
    .into_iter()
    .flatten()
    .map(|record| Change {
        action: ChangeAction::Delete,
        record_set: record.clone(),
    })
    .collect();

    if changes.is_empty() {
        None
    } else {
        Some(ChangeBatch {
            comment: Some(CHANGE_BATCH_COMMENT.to_string()),
            changes,
        })
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod sync_tests;
