// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Alias zone resolution for Elastic Load Balancing v2 hostnames.
//!
//! An alias record pointing at a Network Load Balancer must name the load balancer's
//! canonical hosted zone, not the zone the record lives in. NLB DNS names have the
//! form `<name>-<random>.elb.<region>.amazonaws.com`; the load balancer name is
//! recovered from the first label and looked up with `DescribeLoadBalancers`.

use super::RecordIntent;
use crate::errors::{Error, Result};
use crate::provider::LoadBalancerApi;
use std::sync::Arc;
use tracing::debug;

const ELB_SUFFIX: &str = ".amazonaws.com";
const ELB_MARKER: &str = ".elb";

/// Return the first label of `hostname` if it is an ELBv2 DNS name.
fn elb_first_label(hostname: &str) -> Option<&str> {
    let name = hostname.trim_end_matches('.');
    let lower = name.to_ascii_lowercase();
    if !lower.ends_with(ELB_SUFFIX) {
        return None;
    }
    let without_suffix = &name[..name.len() - ELB_SUFFIX.len()];
    let (rest, region) = without_suffix.rsplit_once('.')?;
    if region.is_empty()
        || !region
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return None;
    }
    if !rest.to_ascii_lowercase().ends_with(ELB_MARKER) {
        return None;
    }
    let prefix = &rest[..rest.len() - ELB_MARKER.len()];
    prefix.split('.').next().filter(|label| !label.is_empty())
}

/// Derive the load balancer name from an ELBv2 DNS name.
///
/// Returns `None` when the hostname is not an ELBv2 name, and `Some(None)` when it is
/// one but its first label carries no `-<random>` suffix to strip.
#[must_use]
pub fn load_balancer_name(hostname: &str) -> Option<Option<String>> {
    elb_first_label(hostname).map(|label| {
        label
            .rsplit_once('-')
            .map(|(name, _)| name)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    })
}

/// Resolves the canonical hosted zone of load balancer alias targets.
#[derive(Clone)]
pub struct AliasZoneResolver {
    load_balancers: Arc<dyn LoadBalancerApi>,
}

impl AliasZoneResolver {
    #[must_use]
    pub fn new(load_balancers: Arc<dyn LoadBalancerApi>) -> Self {
        Self { load_balancers }
    }

    /// Resolve the canonical hosted zone of `hostname`.
    ///
    /// Hostnames that are not ELBv2 DNS names resolve to `None` without a lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Resolution`] when the lookup fails, finds no load balancer, or
    /// the load balancer reports no canonical hosted zone.
    pub async fn resolve(&self, hostname: &str) -> Result<Option<String>> {
        let Some(name) = load_balancer_name(hostname) else {
            return Ok(None);
        };
        let name = name.ok_or_else(|| Error::Resolution {
            hostname: hostname.to_string(),
            reason: "cannot derive a load balancer name from the first label".to_string(),
        })?;

        debug!(hostname, load_balancer = %name, "Looking up load balancer hosted zone");

        let found = self
            .load_balancers
            .describe_load_balancers(std::slice::from_ref(&name))
            .await
            .map_err(|e| Error::Resolution {
                hostname: hostname.to_string(),
                reason: e.to_string(),
            })?;

        let load_balancer = found.into_iter().next().ok_or_else(|| Error::Resolution {
            hostname: hostname.to_string(),
            reason: format!("no load balancer named '{name}'"),
        })?;

        load_balancer
            .canonical_hosted_zone_id
            .filter(|zone| !zone.is_empty())
            .map(Some)
            .ok_or_else(|| Error::Resolution {
                hostname: hostname.to_string(),
                reason: format!("load balancer '{name}' has no canonical hosted zone"),
            })
    }

    /// Fill in `alias_target_zone_id` for alias intents targeting a load balancer.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::Resolution`] from [`Self::resolve`].
    pub async fn apply(&self, intent: &mut RecordIntent) -> Result<()> {
        if !intent.is_alias {
            return Ok(());
        }
        if let Some(target) = intent.target_hostname.clone() {
            intent.alias_target_zone_id = self.resolve(&target).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "alias_tests.rs"]
mod alias_tests;
