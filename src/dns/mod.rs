// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Route 53 record reconciliation.
//!
//! A Service's annotations are turned into a [`RecordIntent`] by [`intent::interpret`],
//! the alias target zone of a load balancer hostname is filled in by
//! [`alias::AliasZoneResolver`], and [`sync::RecordSynchronizer`] applies the intent
//! after [`ownership::OwnershipValidator`] has confirmed that the hostname is ours.
//!
//! # Ownership marker
//!
//! Every managed record is accompanied by a `TXT` record named `<prefix><hostname>`
//! carrying the same set identifier and weight. Records at a hostname without a
//! matching marker belong to someone else and are never modified.

pub mod alias;
pub mod intent;
pub mod ownership;
pub mod sync;

pub use alias::AliasZoneResolver;
pub use intent::{interpret, interpret_for_delete, Backing, Endpoint, IngressPoint};
pub use ownership::{ObservedRecords, OwnershipValidator};
pub use sync::RecordSynchronizer;

use crate::constants::{MAX_RECORD_WEIGHT, MIN_RECORD_TTL_SECS, SUPPORTED_RECORD_TYPE};
use crate::errors::{Error, Result};

/// Normalized DNS change request derived from an endpoint.
///
/// Built fresh on every reconcile and never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordIntent {
    pub hostname: String,
    /// Only `A` is supported.
    pub record_type: String,
    pub set_identifier: String,
    pub weight: i64,
    pub ttl: i64,
    pub health_check_id: Option<String>,
    pub hosted_zone_id: String,
    pub is_alias: bool,
    /// Canonical hosted zone of the load balancer behind an alias target.
    pub alias_target_zone_id: Option<String>,
    pub target_hostname: Option<String>,
    pub target_ip_address: Option<String>,
}

impl RecordIntent {
    /// Check that the alias flag agrees with the selected target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when an alias lacks a target hostname, a plain
    /// record lacks a target address, or both targets are set.
    pub fn check_target(&self) -> Result<()> {
        match (
            self.is_alias,
            self.target_hostname.as_deref().filter(|s| !s.is_empty()),
            self.target_ip_address.as_deref().filter(|s| !s.is_empty()),
        ) {
            (true, Some(_), None) | (false, None, Some(_)) => Ok(()),
            (true, None, _) => Err(Error::configuration(format!(
                "alias record requested for '{}' but no target hostname is available",
                self.hostname
            ))),
            (false, _, None) => Err(Error::configuration(format!(
                "plain record requested for '{}' but no target IP address is available",
                self.hostname
            ))),
            (true, Some(_), Some(_)) | (false, Some(_), Some(_)) => {
                Err(Error::configuration(format!(
                    "record for '{}' has both a target hostname and a target IP address",
                    self.hostname
                )))
            }
        }
    }

    /// Validate the fields that name the record: zone, hostname, set identifier, type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] describing the first invalid field.
    pub fn validate_identity(&self) -> Result<()> {
        if self.hosted_zone_id.is_empty() {
            return Err(Error::configuration("hosted zone id is missing"));
        }
        if self.hostname.is_empty() {
            return Err(Error::configuration("hostname is missing"));
        }
        if self.set_identifier.is_empty() {
            return Err(Error::configuration("set identifier is missing"));
        }
        if self.record_type != SUPPORTED_RECORD_TYPE {
            return Err(Error::configuration(format!(
                "record type '{}' is not supported, only '{SUPPORTED_RECORD_TYPE}' is",
                self.record_type
            )));
        }
        Ok(())
    }

    /// Validate every field before an upsert.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.validate_identity()?;
        if self.ttl < MIN_RECORD_TTL_SECS {
            return Err(Error::configuration(format!(
                "ttl {} is below the minimum of {MIN_RECORD_TTL_SECS} seconds",
                self.ttl
            )));
        }
        if !(0..=MAX_RECORD_WEIGHT).contains(&self.weight) {
            return Err(Error::configuration(format!(
                "weight {} is outside 0..={MAX_RECORD_WEIGHT}",
                self.weight
            )));
        }
        self.check_target()
    }
}
