// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions for external-route53.
//!
//! # Resource Types
//!
//! - [`HealthCheck`] - A Route 53 health check, either declared directly or created
//!   by the operator for a Service annotated with `external-route53.io/health-check: "true"`.
//!
//! # Example: Declaring a Health Check
//!
//! ```rust,no_run
//! use external_route53::crd::{
//!     HealthCheckEndpoint, HealthCheckFeatures, HealthCheckProtocol, HealthCheckSpec,
//! };
//!
//! let spec = HealthCheckSpec {
//!     enabled: true,
//!     invert: false,
//!     protocol: HealthCheckProtocol::Https,
//!     port: 443,
//!     path: Some("/healthz".to_string()),
//!     endpoint: HealthCheckEndpoint {
//!         address: None,
//!         hostname: Some("app.example.net".to_string()),
//!     },
//!     failure_threshold: 3,
//!     features: HealthCheckFeatures {
//!         fast_interval: true,
//!         search_string: None,
//!         latency_graph: false,
//!     },
//! };
//! ```

use crate::constants::DEFAULT_FAILURE_THRESHOLD;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

fn default_failure_threshold() -> i32 {
    DEFAULT_FAILURE_THRESHOLD
}

/// Protocol used by Route 53 to check the endpoint.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub enum HealthCheckProtocol {
    #[serde(rename = "HTTP")]
    Http,
    #[serde(rename = "HTTPS")]
    Https,
    #[serde(rename = "TCP")]
    Tcp,
}

/// Checked endpoint. Exactly one of `address` and `hostname` is expected.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckEndpoint {
    /// IPv4 or IPv6 address of the endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Fully qualified domain name of the endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

/// Optional health check behavior.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckFeatures {
    /// Check every 10 seconds instead of every 30. Only honored at creation.
    #[serde(default)]
    pub fast_interval: bool,

    /// String that must appear in the first 5120 bytes of an HTTP(S) response body.
    ///
    /// Switches the check type to `HTTP_STR_MATCH` or `HTTPS_STR_MATCH`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_string: Option<String>,

    /// Record latency graphs in Route 53. Only honored at creation.
    #[serde(default)]
    pub latency_graph: bool,
}

/// `HealthCheck` declares a Route 53 health check.
///
/// The Route 53 id of the provisioned check is reported in `status.id` and can be
/// attached to a weighted record through the
/// `external-dns.alpha.kubernetes.io/aws-health-check-id` Service annotation.
///
/// # Example YAML
///
/// ```yaml
/// apiVersion: external-route53.io/v1
/// kind: HealthCheck
/// metadata:
///   name: web
///   namespace: default
/// spec:
///   protocol: TCP
///   port: 80
///   endpoint:
///     address: 192.0.2.10
///   features:
///     fastInterval: true
/// ```
#[derive(CustomResource, Clone, Debug, Serialize, Deserialize, PartialEq, JsonSchema)]
#[kube(
    group = "external-route53.io",
    version = "v1",
    kind = "HealthCheck",
    namespaced,
    shortname = "hc",
    doc = "HealthCheck represents a Route 53 health check probing an endpoint over HTTP, HTTPS or TCP.",
    printcolumn = r#"{"name":"Protocol","type":"string","jsonPath":".spec.protocol"}"#,
    printcolumn = r#"{"name":"Port","type":"integer","jsonPath":".spec.port"}"#,
    printcolumn = r#"{"name":"ID","type":"string","jsonPath":".status.id"}"#,
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#
)]
#[kube(status = "HealthCheckStatus")]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckSpec {
    /// Disabled checks are reported healthy by Route 53 without checking.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Report the inverse of the check result.
    #[serde(default)]
    pub invert: bool,

    pub protocol: HealthCheckProtocol,

    #[schemars(range(min = 1, max = 65535))]
    pub port: i32,

    /// Request path for HTTP and HTTPS checks. Ignored for TCP.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default)]
    pub endpoint: HealthCheckEndpoint,

    /// Consecutive failed checks before the endpoint is considered unhealthy.
    #[serde(default = "default_failure_threshold")]
    #[schemars(range(min = 1, max = 10))]
    pub failure_threshold: i32,

    #[serde(default)]
    pub features: HealthCheckFeatures,
}

/// Last observed check result.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub enum HealthCheckResult {
    Healthy,
    Unhealthy,
}

/// `HealthCheck` status
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckStatus {
    /// Route 53 health check id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<HealthCheckResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Condition represents an observation of a resource's current state.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition, e.g. `Ready`.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
