// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Unit tests for operator configuration.

#[cfg(test)]
mod tests {
    use crate::config::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = OperatorConfig::default();
        assert_eq!(config.marker_prefix, "extr53-");
        assert_eq!(config.requeue_interval, Duration::from_secs(300));
        assert_eq!(config.metrics_port, 8080);
        assert!(config.default_hosted_zone_id.is_none());
    }

    #[test]
    fn test_marker_name_uses_prefix() {
        let config = OperatorConfig {
            marker_prefix: "owner-".to_string(),
            ..OperatorConfig::default()
        };
        assert_eq!(config.marker_name("app.example.net"), "owner-app.example.net");
    }
}
