// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! `HealthCheck` resources generated for annotated Services.

use crate::constants::DEFAULT_FAILURE_THRESHOLD;
use crate::crd::{
    HealthCheck, HealthCheckEndpoint, HealthCheckFeatures, HealthCheckProtocol, HealthCheckSpec,
};
use crate::errors::{Error, Result};
use crate::labels::{
    HEALTH_CHECK_ANNOTATION, HEALTH_CHECK_ID_ANNOTATION, K8S_MANAGED_BY,
    MANAGED_BY_EXTERNAL_ROUTE53,
};
use k8s_openapi::api::core::v1::Service;
use kube::api::ObjectMeta;
use kube::{Resource, ResourceExt};
use serde_json::json;
use std::collections::BTreeMap;

/// Whether the Service asks for a health check that it does not reference yet.
#[must_use]
pub fn health_check_requested(service: &Service) -> bool {
    let annotations = service.annotations();
    annotations.get(HEALTH_CHECK_ANNOTATION).map(String::as_str) == Some("true")
        && annotations
            .get(HEALTH_CHECK_ID_ANNOTATION)
            .is_none_or(|id| id.trim().is_empty())
}

/// Build the `HealthCheck` probing `service`.
///
/// The check targets the first port over TCP (the node port for `NodePort` Services)
/// at the first load balancer ingress address, or its hostname when no address is
/// reported. The resource is named after the Service and owned by it.
///
/// Returns `None` for `ExternalName` Services, which have nothing to check.
///
/// # Errors
///
/// Returns [`Error::Configuration`] when the Service has no port or no ingress point.
pub fn build_for_service(service: &Service) -> Result<Option<HealthCheck>> {
    let spec = service.spec.as_ref();
    let service_type = spec.and_then(|s| s.type_.as_deref());
    if service_type == Some("ExternalName") {
        return Ok(None);
    }

    let id = format!(
        "{}/{}",
        service.namespace().unwrap_or_default(),
        service.name_any()
    );

    let first_port = spec
        .and_then(|s| s.ports.as_ref())
        .and_then(|ports| ports.first())
        .ok_or_else(|| Error::configuration(format!("service {id} has no ports")))?;

    let port = if service_type == Some("NodePort") {
        first_port.node_port.ok_or_else(|| {
            Error::configuration(format!("service {id} has no node port allocated yet"))
        })?
    } else {
        first_port.port
    };

    let ingress = service
        .status
        .as_ref()
        .and_then(|s| s.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_ref())
        .and_then(|ingress| ingress.first())
        .ok_or_else(|| Error::configuration(format!("service {id} has no load balancer ingress")))?;

    let address = ingress.ip.clone().filter(|ip| !ip.is_empty());
    let endpoint = HealthCheckEndpoint {
        hostname: if address.is_none() {
            ingress.hostname.clone().filter(|h| !h.is_empty())
        } else {
            None
        },
        address,
    };

    let mut labels = BTreeMap::new();
    labels.insert(
        K8S_MANAGED_BY.to_string(),
        MANAGED_BY_EXTERNAL_ROUTE53.to_string(),
    );

    Ok(Some(HealthCheck {
        metadata: ObjectMeta {
            name: Some(service.name_any()),
            namespace: service.namespace(),
            labels: Some(labels),
            owner_references: service.controller_owner_ref(&()).map(|owner| vec![owner]),
            ..ObjectMeta::default()
        },
        spec: HealthCheckSpec {
            enabled: true,
            invert: false,
            protocol: HealthCheckProtocol::Tcp,
            port,
            path: None,
            endpoint,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            features: HealthCheckFeatures {
                fast_interval: true,
                search_string: None,
                latency_graph: false,
            },
        },
        status: None,
    }))
}

/// Merge patch replacing the spec of an existing `HealthCheck` with `resource`'s.
///
/// Unset optional fields are sent as `null` so that values left over from the
/// previous spec, such as an old endpoint hostname, are removed.
#[must_use]
pub fn spec_patch(resource: &HealthCheck) -> serde_json::Value {
    let spec = &resource.spec;
    json!({
        "spec": {
            "enabled": spec.enabled,
            "invert": spec.invert,
            "protocol": spec.protocol,
            "port": spec.port,
            "path": spec.path,
            "endpoint": {
                "address": spec.endpoint.address,
                "hostname": spec.endpoint.hostname,
            },
            "failureThreshold": spec.failure_threshold,
            "features": {
                "fastInterval": spec.features.fast_interval,
                "searchString": spec.features.search_string,
                "latencyGraph": spec.features.latency_graph,
            },
        }
    })
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod resource_tests;
