// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Operator runtime configuration.
//!
//! The binary resolves command line flags and environment variables into an
//! [`OperatorConfig`]; the library only ever sees the resolved values.

use crate::constants::{DEFAULT_MARKER_PREFIX, METRICS_SERVER_PORT, SUCCESS_REQUEUE_DURATION_SECS};
use std::time::Duration;

/// Resolved operator configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorConfig {
    /// Hosted zone used when a Service carries no hosted zone annotation.
    pub default_hosted_zone_id: Option<String>,

    /// Prefix prepended to a hostname to name its ownership marker.
    pub marker_prefix: String,

    /// Region of the Elastic Load Balancing API, when it differs from the default chain.
    pub elb_region: Option<String>,

    /// Delay before a successfully reconciled object is revisited.
    pub requeue_interval: Duration,

    pub metrics_port: u16,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            default_hosted_zone_id: None,
            marker_prefix: DEFAULT_MARKER_PREFIX.to_string(),
            elb_region: None,
            requeue_interval: Duration::from_secs(SUCCESS_REQUEUE_DURATION_SECS),
            metrics_port: METRICS_SERVER_PORT,
        }
    }
}

impl OperatorConfig {
    /// Marker record name for `hostname`.
    #[must_use]
    pub fn marker_name(&self, hostname: &str) -> String {
        format!("{}{}", self.marker_prefix, hostname)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
