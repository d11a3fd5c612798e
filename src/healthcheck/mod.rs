// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Route 53 health check provisioning.
//!
//! A [`HealthCheckDescriptor`] is the normalized form of a `HealthCheck` resource.
//! [`HealthCheckProvisioner`] makes Route 53 match it, finding existing checks through
//! their caller reference `<namespace>/<name>/<uid>/<generation>`. Every generation of
//! a resource gets a new caller reference, so lookups also accept any earlier
//! generation of the same owner.

pub mod resource;

use crate::constants::{
    FAST_REQUEST_INTERVAL_SECS, HEALTH_CHECK_NAME_TAG, STANDARD_REQUEST_INTERVAL_SECS,
};
use crate::crd::{HealthCheck, HealthCheckProtocol};
use crate::errors::{Error, Result};
use crate::metrics;
use crate::provider::{
    HealthCheckConfig, HealthCheckSummary, HealthCheckType, HealthCheckUpdate, Route53Api,
};
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Normalized health check declaration plus the provider id observed for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HealthCheckDescriptor {
    pub namespace: String,
    pub name: String,
    pub uid: String,
    pub generation: i64,
    pub enabled: bool,
    pub inverted: bool,
    pub protocol: HealthCheckProtocol,
    pub port: i32,
    pub path: Option<String>,
    pub endpoint_address: Option<String>,
    pub endpoint_hostname: Option<String>,
    pub failure_threshold: i32,
    pub fast_interval: bool,
    pub search_string: Option<String>,
    pub measure_latency: bool,
    pub provider_health_check_id: Option<String>,
}

impl HealthCheckDescriptor {
    #[must_use]
    pub fn from_resource(resource: &HealthCheck) -> Self {
        let spec = &resource.spec;
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

        Self {
            namespace: resource.namespace().unwrap_or_default(),
            name: resource.name_any(),
            uid: resource.uid().unwrap_or_default(),
            generation: resource.metadata.generation.unwrap_or_default(),
            enabled: spec.enabled,
            inverted: spec.invert,
            protocol: spec.protocol,
            port: spec.port,
            path: non_empty(&spec.path),
            endpoint_address: non_empty(&spec.endpoint.address),
            endpoint_hostname: non_empty(&spec.endpoint.hostname),
            failure_threshold: spec.failure_threshold,
            fast_interval: spec.features.fast_interval,
            search_string: non_empty(&spec.features.search_string),
            measure_latency: spec.features.latency_graph,
            provider_health_check_id: resource
                .status
                .as_ref()
                .and_then(|s| s.id.clone())
                .filter(|id| !id.is_empty()),
        }
    }

    /// Prefix shared by the caller references of every generation of this resource.
    #[must_use]
    pub fn owner_prefix(&self) -> String {
        format!("{}/{}/{}/", self.namespace, self.name, self.uid)
    }

    #[must_use]
    pub fn caller_reference(&self) -> String {
        format!("{}{}", self.owner_prefix(), self.generation)
    }

    /// Value of the `Name` tag.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    #[must_use]
    pub fn check_type(&self) -> HealthCheckType {
        match (self.protocol, self.search_string.is_some()) {
            (HealthCheckProtocol::Tcp, _) => HealthCheckType::Tcp,
            (HealthCheckProtocol::Http, false) => HealthCheckType::Http,
            (HealthCheckProtocol::Http, true) => HealthCheckType::HttpStrMatch,
            (HealthCheckProtocol::Https, false) => HealthCheckType::Https,
            (HealthCheckProtocol::Https, true) => HealthCheckType::HttpsStrMatch,
        }
    }

    /// Route 53 configuration for this descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] unless exactly one of the endpoint address and
    /// hostname is set.
    pub fn to_config(&self) -> Result<HealthCheckConfig> {
        if self.endpoint_address.is_some() == self.endpoint_hostname.is_some() {
            return Err(Error::configuration(format!(
                "health check {} needs exactly one of endpoint.address and endpoint.hostname",
                self.display_name()
            )));
        }

        let is_tcp = self.protocol == HealthCheckProtocol::Tcp;
        Ok(HealthCheckConfig {
            check_type: self.check_type(),
            ip_address: self.endpoint_address.clone(),
            fully_qualified_domain_name: self.endpoint_hostname.clone(),
            port: self.port,
            resource_path: if is_tcp { None } else { self.path.clone() },
            search_string: if is_tcp {
                None
            } else {
                self.search_string.clone()
            },
            enable_sni: if is_tcp { None } else { Some(true) },
            failure_threshold: self.failure_threshold,
            inverted: self.inverted,
            disabled: !self.enabled,
            request_interval: if self.fast_interval {
                FAST_REQUEST_INTERVAL_SECS
            } else {
                STANDARD_REQUEST_INTERVAL_SECS
            },
            measure_latency: self.measure_latency,
        })
    }
}

/// Pick the existing health check belonging to `descriptor`.
///
/// Preference: exact caller reference, then the newest earlier generation of the same
/// owner, then the cached id if Route 53 still lists it.
fn find_existing<'a>(
    descriptor: &HealthCheckDescriptor,
    existing: &'a [HealthCheckSummary],
) -> Option<&'a HealthCheckSummary> {
    let caller_reference = descriptor.caller_reference();
    let prefix = descriptor.owner_prefix();

    existing
        .iter()
        .find(|hc| hc.caller_reference == caller_reference)
        .or_else(|| {
            existing
                .iter()
                .filter_map(|hc| {
                    hc.caller_reference
                        .strip_prefix(&prefix)
                        .and_then(|generation| generation.parse::<i64>().ok())
                        .map(|generation| (generation, hc))
                })
                .max_by_key(|(generation, _)| *generation)
                .map(|(_, hc)| hc)
        })
        .or_else(|| {
            descriptor
                .provider_health_check_id
                .as_deref()
                .and_then(|id| existing.iter().find(|hc| hc.id == id))
        })
}

/// Creates, updates and deletes Route 53 health checks.
#[derive(Clone)]
pub struct HealthCheckProvisioner {
    route53: Arc<dyn Route53Api>,
}

impl HealthCheckProvisioner {
    #[must_use]
    pub fn new(route53: Arc<dyn Route53Api>) -> Self {
        Self { route53 }
    }

    /// Make Route 53 hold a health check matching `descriptor`.
    ///
    /// Returns the descriptor with `provider_health_check_id` populated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an unusable descriptor and
    /// [`Error::Provider`] when listing, creating, updating or tagging fails.
    pub async fn ensure(&self, descriptor: &HealthCheckDescriptor) -> Result<HealthCheckDescriptor> {
        let config = descriptor.to_config()?;
        let existing = self.route53.list_health_checks().await?;

        let id = match find_existing(descriptor, &existing) {
            Some(found) => {
                let id = self
                    .route53
                    .update_health_check(&found.id, &HealthCheckUpdate::from(&config))
                    .await?;
                metrics::record_health_check_updated();
                debug!(
                    health_check = %descriptor.display_name(),
                    id = %id,
                    caller_reference = %found.caller_reference,
                    "Updated Route 53 health check"
                );
                id
            }
            None => {
                let caller_reference = descriptor.caller_reference();
                let id = self
                    .route53
                    .create_health_check(&caller_reference, &config)
                    .await?;
                metrics::record_health_check_created();
                info!(
                    health_check = %descriptor.display_name(),
                    id = %id,
                    caller_reference = %caller_reference,
                    "Created Route 53 health check"
                );
                id
            }
        };

        self.route53
            .tag_health_check(
                &id,
                &[(HEALTH_CHECK_NAME_TAG.to_string(), descriptor.display_name())],
            )
            .await?;

        Ok(HealthCheckDescriptor {
            provider_health_check_id: Some(id),
            ..descriptor.clone()
        })
    }

    /// Delete the health check belonging to `descriptor`.
    ///
    /// Uses the recorded id, or looks the check up by caller reference when no id was
    /// recorded. Returns the descriptor with the id cleared, and the id that was freed.
    /// A check that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] when the delete fails for another reason.
    pub async fn delete(
        &self,
        descriptor: &HealthCheckDescriptor,
    ) -> Result<(HealthCheckDescriptor, Option<String>)> {
        let cleared = HealthCheckDescriptor {
            provider_health_check_id: None,
            ..descriptor.clone()
        };

        let cached = descriptor.provider_health_check_id.clone();
        let id = match cached {
            Some(id) => id,
            None => {
                // The id may have been lost before it reached the status
                let existing = self.route53.list_health_checks().await?;
                match find_existing(descriptor, &existing) {
                    Some(found) => {
                        debug!(
                            health_check = %descriptor.display_name(),
                            id = %found.id,
                            caller_reference = %found.caller_reference,
                            "Found Route 53 health check by caller reference"
                        );
                        found.id.clone()
                    }
                    None => {
                        debug!(
                            health_check = %descriptor.display_name(),
                            "No Route 53 health check exists, nothing to delete"
                        );
                        return Ok((cleared, None));
                    }
                }
            }
        };

        match self.route53.delete_health_check(&id).await {
            Ok(()) => {
                metrics::record_health_check_deleted();
                info!(health_check = %descriptor.display_name(), id = %id, "Deleted Route 53 health check");
            }
            Err(err) if err.is_not_found() => {
                warn!(
                    health_check = %descriptor.display_name(),
                    id = %id,
                    "Route 53 health check already deleted"
                );
            }
            Err(err) => return Err(err.into()),
        }

        Ok((cleared, Some(id)))
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
