// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Route 53 and Elastic Load Balancing client capabilities.
//!
//! The reconciliation engine never talks to the AWS SDK directly. It receives an
//! [`Route53Api`] and a [`LoadBalancerApi`] handle, which lets the controller run
//! against [`aws::AwsRoute53`] in production and [`memory::InMemoryRoute53`] in tests.
//!
//! The types in this module mirror the subset of the Route 53 wire model that the
//! operator uses: weighted `A`/alias record sets, the `TXT` ownership marker, and
//! health checks.

pub mod aws;
pub mod memory;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

// Provider operation names, used in errors, logs and call accounting.
pub const OP_LIST_RESOURCE_RECORD_SETS: &str = "ListResourceRecordSets";
pub const OP_CHANGE_RESOURCE_RECORD_SETS: &str = "ChangeResourceRecordSets";
pub const OP_LIST_HEALTH_CHECKS: &str = "ListHealthChecks";
pub const OP_CREATE_HEALTH_CHECK: &str = "CreateHealthCheck";
pub const OP_UPDATE_HEALTH_CHECK: &str = "UpdateHealthCheck";
pub const OP_DELETE_HEALTH_CHECK: &str = "DeleteHealthCheck";
pub const OP_CHANGE_TAGS_FOR_RESOURCE: &str = "ChangeTagsForResource";
pub const OP_DESCRIBE_LOAD_BALANCERS: &str = "DescribeLoadBalancers";

/// Error returned by a provider call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The target of a delete (record set or health check) does not exist.
    #[error("{operation}: resource not found: {message}")]
    NotFound {
        /// Provider operation that failed (e.g. `ChangeResourceRecordSets`)
        operation: &'static str,
        /// Message reported by the provider
        message: String,
    },

    /// Any other failed provider request.
    #[error("{operation} failed: {message}")]
    Request {
        /// Provider operation that failed
        operation: &'static str,
        /// Message reported by the provider
        message: String,
    },
}

impl ProviderError {
    pub fn not_found(operation: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            operation,
            message: message.into(),
        }
    }

    pub fn request(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Request {
            operation,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// DNS record type as reported by Route 53.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    A,
    Txt,
    Other(String),
}

impl RecordType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::A => "A",
            Self::Txt => "TXT",
            Self::Other(other) => other,
        }
    }
}

impl From<&str> for RecordType {
    fn from(value: &str) -> Self {
        match value {
            "A" => Self::A,
            "TXT" => Self::Txt,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alias target of an alias record set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTarget {
    pub hosted_zone_id: String,
    pub dns_name: String,
    pub evaluate_target_health: bool,
}

/// A resource record set, either observed or about to be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    pub name: String,
    pub record_type: RecordType,
    pub set_identifier: Option<String>,
    pub weight: Option<i64>,
    /// Absent for alias records.
    pub ttl: Option<i64>,
    /// Record values; empty for alias records.
    pub values: Vec<String>,
    pub alias_target: Option<AliasTarget>,
    pub health_check_id: Option<String>,
}

/// Action of a single change inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Upsert,
    Delete,
}

impl ChangeAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upsert => "UPSERT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub action: ChangeAction,
    pub record_set: RecordSet,
}

/// Ordered list of changes applied atomically by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    pub comment: Option<String>,
    pub changes: Vec<Change>,
}

/// Parameters of a record set listing.
///
/// Route 53 returns record sets in its canonical order (labels compared right to
/// left) beginning at `start_name`, so the result also contains names that sort
/// after it. Callers filter by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSetQuery {
    pub hosted_zone_id: String,
    pub start_name: String,
    pub start_type: Option<RecordType>,
    pub start_identifier: Option<String>,
}

impl RecordSetQuery {
    pub fn starting_at(hosted_zone_id: impl Into<String>, start_name: impl Into<String>) -> Self {
        Self {
            hosted_zone_id: hosted_zone_id.into(),
            start_name: start_name.into(),
            start_type: None,
            start_identifier: None,
        }
    }
}

/// Route 53 health check type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthCheckType {
    Http,
    Https,
    HttpStrMatch,
    HttpsStrMatch,
    Tcp,
}

impl HealthCheckType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "HTTP",
            Self::Https => "HTTPS",
            Self::HttpStrMatch => "HTTP_STR_MATCH",
            Self::HttpsStrMatch => "HTTPS_STR_MATCH",
            Self::Tcp => "TCP",
        }
    }
}

/// Full configuration sent when creating a health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckConfig {
    pub check_type: HealthCheckType,
    pub ip_address: Option<String>,
    pub fully_qualified_domain_name: Option<String>,
    pub port: i32,
    pub resource_path: Option<String>,
    pub search_string: Option<String>,
    pub enable_sni: Option<bool>,
    pub failure_threshold: i32,
    pub inverted: bool,
    pub disabled: bool,
    pub request_interval: i32,
    pub measure_latency: bool,
}

/// Mutable fields sent when updating an existing health check.
///
/// Route 53 fixes the type, request interval and latency measurement at creation,
/// so they have no counterpart here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckUpdate {
    pub ip_address: Option<String>,
    pub fully_qualified_domain_name: Option<String>,
    pub port: i32,
    pub resource_path: Option<String>,
    pub search_string: Option<String>,
    pub enable_sni: Option<bool>,
    pub failure_threshold: i32,
    pub inverted: bool,
    pub disabled: bool,
}

impl From<&HealthCheckConfig> for HealthCheckUpdate {
    fn from(config: &HealthCheckConfig) -> Self {
        Self {
            ip_address: config.ip_address.clone(),
            fully_qualified_domain_name: config.fully_qualified_domain_name.clone(),
            port: config.port,
            resource_path: config.resource_path.clone(),
            search_string: config.search_string.clone(),
            enable_sni: config.enable_sni,
            failure_threshold: config.failure_threshold,
            inverted: config.inverted,
            disabled: config.disabled,
        }
    }
}

/// Identity of an existing health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckSummary {
    pub id: String,
    pub caller_reference: String,
}

/// Elastic Load Balancing v2 load balancer, reduced to what alias records need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerSummary {
    pub name: String,
    pub dns_name: Option<String>,
    pub canonical_hosted_zone_id: Option<String>,
}

/// Route 53 operations used by the reconciliation engine.
#[async_trait]
pub trait Route53Api: Send + Sync {
    /// List record sets in a hosted zone starting at the query position.
    async fn list_resource_record_sets(
        &self,
        query: &RecordSetQuery,
    ) -> Result<Vec<RecordSet>, ProviderError>;

    /// Apply a change batch atomically.
    ///
    /// A DELETE of a record set that does not exist fails the whole batch with
    /// [`ProviderError::NotFound`].
    async fn change_resource_record_sets(
        &self,
        hosted_zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<(), ProviderError>;

    /// List every health check in the account.
    async fn list_health_checks(&self) -> Result<Vec<HealthCheckSummary>, ProviderError>;

    /// Create a health check and return its id.
    async fn create_health_check(
        &self,
        caller_reference: &str,
        config: &HealthCheckConfig,
    ) -> Result<String, ProviderError>;

    /// Update a health check in place and return its id.
    async fn update_health_check(
        &self,
        health_check_id: &str,
        update: &HealthCheckUpdate,
    ) -> Result<String, ProviderError>;

    /// Delete a health check. A missing check yields [`ProviderError::NotFound`].
    async fn delete_health_check(&self, health_check_id: &str) -> Result<(), ProviderError>;

    /// Add or replace tags on a health check.
    async fn tag_health_check(
        &self,
        health_check_id: &str,
        tags: &[(String, String)],
    ) -> Result<(), ProviderError>;
}

/// Elastic Load Balancing v2 operations used by the alias zone resolver.
#[async_trait]
pub trait LoadBalancerApi: Send + Sync {
    /// Describe load balancers by name. Unknown names yield an empty list.
    async fn describe_load_balancers(
        &self,
        names: &[String],
    ) -> Result<Vec<LoadBalancerSummary>, ProviderError>;
}

/// Compare two DNS names, ignoring case and a trailing root dot.
#[must_use]
pub fn domain_equal(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

/// Route 53 canonical sort key for a name: lowercase labels in reverse order.
#[must_use]
pub fn canonical_name_key(name: &str) -> Vec<String> {
    name.trim_end_matches('.')
        .split('.')
        .rev()
        .map(str::to_ascii_lowercase)
        .collect()
}
