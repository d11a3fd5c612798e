// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Ownership validation through the `TXT` management marker.
//!
//! A hostname may be modified only when either
//! 1. nothing exists at the hostname yet, or
//! 2. a `TXT` marker at `<prefix><hostname>` carries the intent's set identifier.
//!
//! Route 53 lists names in reversed-label order, so `extr53-app.example.net` sorts
//! after `app.example.net` and a single listing that starts at the marker never shows
//! the primary name. The validator therefore lists at both names.

use super::RecordIntent;
use crate::errors::{Error, Result};
use crate::provider::{domain_equal, RecordSet, RecordSetQuery, RecordType, Route53Api};
use std::sync::Arc;
use tracing::debug;

/// Record sets observed at a hostname and at its marker name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObservedRecords {
    pub marker_name: String,
    /// Every record set named exactly like the hostname.
    pub at_hostname: Vec<RecordSet>,
    /// Every record set named exactly like the marker.
    pub at_marker: Vec<RecordSet>,
}

impl ObservedRecords {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.at_hostname.is_empty() && self.at_marker.is_empty()
    }

    /// The marker carrying `set_identifier`, if any.
    #[must_use]
    pub fn marker_for(&self, set_identifier: &str) -> Option<&RecordSet> {
        self.at_marker.iter().find(|record| {
            record.record_type == RecordType::Txt
                && record.set_identifier.as_deref() == Some(set_identifier)
        })
    }

    /// The primary record of `intent`'s type carrying its set identifier, if any.
    #[must_use]
    pub fn primary_for(&self, intent: &RecordIntent) -> Option<&RecordSet> {
        self.at_hostname.iter().find(|record| {
            record.record_type.as_str() == intent.record_type
                && record.set_identifier.as_deref() == Some(intent.set_identifier.as_str())
        })
    }

    /// Whether `set_identifier` may modify the hostname.
    #[must_use]
    pub fn is_owned_by(&self, set_identifier: &str) -> bool {
        self.is_empty() || self.marker_for(set_identifier).is_some() || self.at_hostname.is_empty()
    }
}

/// Checks the ownership marker before any mutating call.
#[derive(Clone)]
pub struct OwnershipValidator {
    route53: Arc<dyn Route53Api>,
    marker_prefix: String,
}

impl OwnershipValidator {
    pub fn new(route53: Arc<dyn Route53Api>, marker_prefix: impl Into<String>) -> Self {
        Self {
            route53,
            marker_prefix: marker_prefix.into(),
        }
    }

    #[must_use]
    pub fn marker_name(&self, hostname: &str) -> String {
        format!("{}{}", self.marker_prefix, hostname)
    }

    async fn list_named(&self, hosted_zone_id: &str, name: &str) -> Result<Vec<RecordSet>> {
        let listed = self
            .route53
            .list_resource_record_sets(&RecordSetQuery::starting_at(hosted_zone_id, name))
            .await?;
        Ok(listed
            .into_iter()
            .filter(|record| domain_equal(&record.name, name))
            .collect())
    }

    /// List the record sets at the intent's hostname and marker name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] if a listing fails.
    pub async fn observe(&self, intent: &RecordIntent) -> Result<ObservedRecords> {
        let marker_name = self.marker_name(&intent.hostname);
        let at_marker = self.list_named(&intent.hosted_zone_id, &marker_name).await?;
        let at_hostname = self
            .list_named(&intent.hosted_zone_id, &intent.hostname)
            .await?;

        debug!(
            hostname = %intent.hostname,
            marker = %marker_name,
            at_hostname = at_hostname.len(),
            at_marker = at_marker.len(),
            "Observed records"
        );

        Ok(ObservedRecords {
            marker_name,
            at_hostname,
            at_marker,
        })
    }

    /// Confirm that `intent` may modify the observed records.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OwnershipConflict`] when records exist at the hostname and no
    /// marker carries the intent's set identifier.
    pub fn verify(intent: &RecordIntent, observed: &ObservedRecords) -> Result<()> {
        if observed.is_owned_by(&intent.set_identifier) {
            Ok(())
        } else {
            Err(Error::OwnershipConflict {
                hostname: intent.hostname.clone(),
                set_identifier: intent.set_identifier.clone(),
                marker_name: observed.marker_name.clone(),
            })
        }
    }

    /// Observe and verify in one step, returning the observation for exact deletes.
    ///
    /// # Errors
    ///
    /// See [`Self::observe`] and [`Self::verify`].
    pub async fn validate(&self, intent: &RecordIntent) -> Result<ObservedRecords> {
        let observed = self.observe(intent).await?;
        Self::verify(intent, &observed)?;
        Ok(observed)
    }
}

#[cfg(test)]
#[path = "ownership_tests.rs"]
mod ownership_tests;
