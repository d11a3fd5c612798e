// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Shared context for all controllers.
//!
//! Controllers receive an `Arc<Context>` holding:
//! - Kubernetes client
//! - [`Providers`]: the resolved configuration and the injected Route 53 and
//!   Elastic Load Balancing clients
//!
//! Everything that talks to AWS goes through [`Providers`], which needs no Kubernetes
//! client and is exercised against the in-memory provider in tests.

use crate::config::OperatorConfig;
use crate::dns::{
    interpret, interpret_for_delete, AliasZoneResolver, Endpoint, RecordIntent, RecordSynchronizer,
};
use crate::errors::Result;
use crate::healthcheck::HealthCheckProvisioner;
use crate::provider::{LoadBalancerApi, Route53Api};
use k8s_openapi::api::core::v1::Service;
use kube::Client;
use std::sync::Arc;

/// Shared context passed to all controllers.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,

    /// Configuration and provider clients
    pub providers: Providers,
}

impl Context {
    #[must_use]
    pub fn new(client: Client, providers: Providers) -> Self {
        Self { client, providers }
    }
}

/// Configuration plus the provider clients the engine components are built from.
#[derive(Clone)]
pub struct Providers {
    pub config: OperatorConfig,
    pub route53: Arc<dyn Route53Api>,
    pub load_balancers: Arc<dyn LoadBalancerApi>,
}

impl Providers {
    #[must_use]
    pub fn new(
        config: OperatorConfig,
        route53: Arc<dyn Route53Api>,
        load_balancers: Arc<dyn LoadBalancerApi>,
    ) -> Self {
        Self {
            config,
            route53,
            load_balancers,
        }
    }

    #[must_use]
    pub fn synchronizer(&self) -> RecordSynchronizer {
        RecordSynchronizer::new(self.route53.clone(), self.config.marker_prefix.clone())
    }

    #[must_use]
    pub fn resolver(&self) -> AliasZoneResolver {
        AliasZoneResolver::new(self.load_balancers.clone())
    }

    #[must_use]
    pub fn provisioner(&self) -> HealthCheckProvisioner {
        HealthCheckProvisioner::new(self.route53.clone())
    }

    /// Interpret the Service's annotations into a record intent.
    ///
    /// The alias target zone is left unresolved; see [`Self::resolved_intent`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::Error::Configuration`] for unusable annotations.
    pub fn intent(&self, service: &Service) -> Result<RecordIntent> {
        interpret(
            &Endpoint::from_service(service),
            self.config.default_hosted_zone_id.as_deref(),
        )
    }

    /// Interpret only the record identity of the Service, for withdrawing its records.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::Error::Configuration`] when the hostname or hosted zone
    /// is missing or the record type is unsupported.
    pub fn delete_intent(&self, service: &Service) -> Result<RecordIntent> {
        interpret_for_delete(
            &Endpoint::from_service(service),
            self.config.default_hosted_zone_id.as_deref(),
        )
    }

    /// Interpret the Service and resolve the alias target zone.
    ///
    /// # Errors
    ///
    /// Returns [`crate::errors::Error::Configuration`] for unusable annotations and
    /// [`crate::errors::Error::Resolution`] when the load balancer cannot be resolved.
    pub async fn resolved_intent(&self, service: &Service) -> Result<RecordIntent> {
        let mut intent = self.intent(service)?;
        self.resolver().apply(&mut intent).await?;
        Ok(intent)
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
