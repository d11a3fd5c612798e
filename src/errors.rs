// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Error types for the record and health check reconciliation engine.
//!
//! Errors are split by how the controller should react to them:
//! - [`Error::Configuration`]: the declared annotations or spec are unusable; nothing
//!   changes until the object is edited.
//! - [`Error::OwnershipConflict`]: another system manages the hostname; an operator has
//!   to step in, so the object is only revisited after a long delay.
//! - [`Error::Resolution`], [`Error::Provider`], [`Error::Kubernetes`]: transient, retried
//!   on the regular error requeue.

use crate::provider::ProviderError;
use crate::status_reasons;
use thiserror::Error;

/// Errors produced by the reconciliation engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Declared configuration is missing or invalid.
    ///
    /// Returned by the annotation interpreter and by synchronizer validation, e.g. for a
    /// missing hosted zone, a TTL below the minimum, or an alias without a target hostname.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Records exist at the hostname that this controller does not own.
    ///
    /// The hostname has records but no ownership marker carrying the set identifier,
    /// which means the name is co-managed by another system.
    #[error(
        "hostname '{hostname}' is co-managed by another system: no ownership marker at \
         '{marker_name}' for set identifier '{set_identifier}'"
    )]
    OwnershipConflict {
        /// Primary record name
        hostname: String,
        /// Set identifier of the intent that was refused
        set_identifier: String,
        /// Name of the TXT marker that was expected
        marker_name: String,
    },

    /// The alias target zone of a load balancer hostname could not be determined.
    #[error("cannot resolve alias target zone for '{hostname}': {reason}")]
    Resolution {
        /// Load balancer DNS name
        hostname: String,
        /// Why resolution failed
        reason: String,
    },

    /// A Route 53 or Elastic Load Balancing call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A Kubernetes API call failed.
    #[error(transparent)]
    Kubernetes(#[from] kube::Error),
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns true if the operation may succeed when retried without any change
    /// to the object.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Resolution { .. } | Self::Provider(_) | Self::Kubernetes(_) => true,
            Self::Configuration(_) | Self::OwnershipConflict { .. } => false,
        }
    }

    /// Returns the status condition reason for this error.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::Configuration(_) => status_reasons::REASON_CONFIGURATION_INVALID,
            Self::OwnershipConflict { .. } => status_reasons::REASON_OWNERSHIP_CONFLICT,
            Self::Resolution { .. } => status_reasons::REASON_RESOLUTION_FAILED,
            Self::Provider(_) => status_reasons::REASON_PROVIDER_ERROR,
            Self::Kubernetes(_) => status_reasons::REASON_KUBERNETES_ERROR,
        }
    }

    /// Short category label used for metrics.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::OwnershipConflict { .. } => "ownership_conflict",
            Self::Resolution { .. } => "resolution",
            Self::Provider(_) => "provider",
            Self::Kubernetes(_) => "kubernetes",
        }
    }
}

/// Result alias for engine operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
