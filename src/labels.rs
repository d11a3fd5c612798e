// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Annotation keys and finalizer names recognized by the operator.
//!
//! Keys in the `external-dns.alpha.kubernetes.io` namespace are shared with
//! external-dns so that Services can be migrated between the two controllers
//! without rewriting their metadata.

// ============================================================================
// external-dns Compatible Annotations
// ============================================================================

/// Fully qualified record name to manage for the Service
pub const HOSTNAME_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/hostname";

/// Record TTL in seconds
pub const TTL_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/ttl";

/// Switches between alias records and plain address records
pub const ALIAS_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/alias";

/// Weight for weighted routing
pub const WEIGHT_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/aws-weight";

/// Set identifier scoping the weighted record
pub const SET_IDENTIFIER_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/set-identifier";

/// Route 53 health check id attached to the record (written back by the operator)
pub const HEALTH_CHECK_ID_ANNOTATION: &str = "external-dns.alpha.kubernetes.io/aws-health-check-id";

// ============================================================================
// external-route53 Annotations
// ============================================================================

/// Record type of the primary record (only `A` is accepted)
pub const RECORD_TYPE_ANNOTATION: &str = "external-route53.io/record-type";

/// Requests a `HealthCheck` resource for the Service when set to `"true"`
pub const HEALTH_CHECK_ANNOTATION: &str = "external-route53.io/health-check";

/// Hosted zone holding the record, overriding the configured default
pub const HOSTED_ZONE_ID_ANNOTATION: &str = "external-route53.io/hosted-zone-id";

// ============================================================================
// Finalizers
// ============================================================================

/// Finalizer keeping a managed Service alive until its records are deleted
pub const SERVICE_FINALIZER: &str = "service.finalizer.external-route53.io";

/// Finalizer keeping a `HealthCheck` alive until its Route 53 check is deleted
pub const HEALTH_CHECK_FINALIZER: &str = "healthcheck.finalizer.external-route53.io";

// ============================================================================
// Labels
// ============================================================================

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Value for `app.kubernetes.io/managed-by` on resources created by this operator
pub const MANAGED_BY_EXTERNAL_ROUTE53: &str = "external-route53";
