// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Standard Kubernetes status condition reasons for external-route53 resources.
//!
//! Reasons are programmatic identifiers in CamelCase that explain why a condition has
//! a particular status. `HealthCheck` resources carry a single `type: Ready` condition.
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   id: 9c5a0f6e-3b1d-4c8e-a0f2-6d7e8f9a0b1c
//!   observedGeneration: 2
//!   conditions:
//!     - type: Ready
//!       status: "True"
//!       reason: Synced
//!       message: "Health check 9c5a0f6e-3b1d-4c8e-a0f2-6d7e8f9a0b1c is in sync"
//! ```

// ============================================================================
// Success Reasons
// ============================================================================

/// The provider resource matches the declared state.
pub const REASON_SYNCED: &str = "Synced";

// ============================================================================
// Failure Reasons
// ============================================================================

/// The declared configuration cannot be turned into a provider request.
///
/// **Retried:** only after the object changes.
pub const REASON_CONFIGURATION_INVALID: &str = "ConfigurationInvalid";

/// Records at the hostname are managed by another system.
///
/// **Retried:** after a long delay, operator intervention expected.
pub const REASON_OWNERSHIP_CONFLICT: &str = "OwnershipConflict";

/// The alias target zone of a load balancer could not be resolved.
pub const REASON_RESOLUTION_FAILED: &str = "ResolutionFailed";

/// A Route 53 or Elastic Load Balancing call failed.
pub const REASON_PROVIDER_ERROR: &str = "ProviderError";

/// A Kubernetes API call failed.
pub const REASON_KUBERNETES_ERROR: &str = "KubernetesError";

/// Any other failure, e.g. a health check id that did not appear in time.
pub const REASON_RECONCILE_FAILED: &str = "ReconcileFailed";

// ============================================================================
// Condition Types
// ============================================================================

/// Encompassing readiness condition.
pub const CONDITION_TYPE_READY: &str = "Ready";

#[cfg(test)]
#[path = "status_reasons_tests.rs"]
mod status_reasons_tests;
