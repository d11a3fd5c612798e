// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Unit tests for health check provisioning.

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::crd::{HealthCheckEndpoint, HealthCheckFeatures, HealthCheckSpec, HealthCheckStatus};
    use crate::provider::memory::InMemoryRoute53;
    use crate::provider::{
        ProviderError, OP_CHANGE_TAGS_FOR_RESOURCE, OP_CREATE_HEALTH_CHECK, OP_DELETE_HEALTH_CHECK,
        OP_UPDATE_HEALTH_CHECK,
    };

    fn descriptor() -> HealthCheckDescriptor {
        HealthCheckDescriptor {
            namespace: "default".to_string(),
            name: "web".to_string(),
            uid: "uid-1".to_string(),
            generation: 1,
            enabled: true,
            inverted: false,
            protocol: HealthCheckProtocol::Tcp,
            port: 80,
            path: Some("/ignored".to_string()),
            endpoint_address: Some("192.0.2.10".to_string()),
            endpoint_hostname: None,
            failure_threshold: 3,
            fast_interval: true,
            search_string: None,
            measure_latency: false,
            provider_health_check_id: None,
        }
    }

    fn provisioner(route53: &Arc<InMemoryRoute53>) -> HealthCheckProvisioner {
        HealthCheckProvisioner::new(route53.clone())
    }

    #[test]
    fn test_caller_reference_includes_generation() {
        let d = descriptor();
        assert_eq!(d.owner_prefix(), "default/web/uid-1/");
        assert_eq!(d.caller_reference(), "default/web/uid-1/1");
        assert_eq!(d.display_name(), "default/web");
    }

    #[test]
    fn test_tcp_config_has_no_path_or_sni() {
        let config = descriptor().to_config().unwrap();

        assert_eq!(config.check_type, HealthCheckType::Tcp);
        assert!(config.resource_path.is_none());
        assert!(config.enable_sni.is_none());
        assert_eq!(config.request_interval, 10);
        assert!(!config.disabled);
    }

    #[test]
    fn test_https_config_sends_path_and_sni() {
        let d = HealthCheckDescriptor {
            protocol: HealthCheckProtocol::Https,
            path: Some("/healthz".to_string()),
            endpoint_address: None,
            endpoint_hostname: Some("app.example.net".to_string()),
            fast_interval: false,
            enabled: false,
            ..descriptor()
        };

        let config = d.to_config().unwrap();

        assert_eq!(config.check_type, HealthCheckType::Https);
        assert_eq!(config.resource_path.as_deref(), Some("/healthz"));
        assert_eq!(config.enable_sni, Some(true));
        assert_eq!(config.request_interval, 30);
        assert_eq!(
            config.fully_qualified_domain_name.as_deref(),
            Some("app.example.net")
        );
        assert!(config.disabled);
    }

    #[test]
    fn test_search_string_switches_to_string_match() {
        for (protocol, expected) in [
            (HealthCheckProtocol::Http, HealthCheckType::HttpStrMatch),
            (HealthCheckProtocol::Https, HealthCheckType::HttpsStrMatch),
            (HealthCheckProtocol::Tcp, HealthCheckType::Tcp),
        ] {
            let d = HealthCheckDescriptor {
                protocol,
                search_string: Some("ok".to_string()),
                ..descriptor()
            };
            assert_eq!(d.check_type(), expected);
        }
    }

    #[test]
    fn test_endpoint_must_be_exclusive() {
        let both = HealthCheckDescriptor {
            endpoint_hostname: Some("app.example.net".to_string()),
            ..descriptor()
        };
        let neither = HealthCheckDescriptor {
            endpoint_address: None,
            ..descriptor()
        };

        assert!(matches!(both.to_config(), Err(Error::Configuration(_))));
        assert!(matches!(neither.to_config(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_descriptor_from_resource() {
        let mut resource = HealthCheck::new(
            "web",
            HealthCheckSpec {
                enabled: true,
                invert: true,
                protocol: HealthCheckProtocol::Http,
                port: 8080,
                path: Some(String::new()),
                endpoint: HealthCheckEndpoint {
                    address: Some("192.0.2.10".to_string()),
                    hostname: Some(String::new()),
                },
                failure_threshold: 5,
                features: HealthCheckFeatures {
                    fast_interval: false,
                    search_string: Some("ready".to_string()),
                    latency_graph: true,
                },
            },
        );
        resource.metadata.namespace = Some("prod".to_string());
        resource.metadata.uid = Some("uid-9".to_string());
        resource.metadata.generation = Some(7);
        resource.status = Some(HealthCheckStatus {
            id: Some("hc-7".to_string()),
            ..HealthCheckStatus::default()
        });

        let d = HealthCheckDescriptor::from_resource(&resource);

        assert_eq!(d.caller_reference(), "prod/web/uid-9/7");
        assert!(d.inverted);
        assert!(d.path.is_none());
        assert!(d.endpoint_hostname.is_none());
        assert_eq!(d.search_string.as_deref(), Some("ready"));
        assert!(d.measure_latency);
        assert_eq!(d.provider_health_check_id.as_deref(), Some("hc-7"));
    }

    #[tokio::test]
    async fn test_ensure_creates_and_tags() {
        let route53 = Arc::new(InMemoryRoute53::new());

        let ensured = provisioner(&route53).ensure(&descriptor()).await.unwrap();

        let id = ensured.provider_health_check_id.unwrap();
        let stored = route53.health_check(&id).unwrap();
        assert_eq!(stored.caller_reference, "default/web/uid-1/1");
        assert_eq!(stored.config.check_type, HealthCheckType::Tcp);
        assert_eq!(stored.tags.get("Name").map(String::as_str), Some("default/web"));
    }

    #[tokio::test]
    async fn test_ensure_twice_creates_once() {
        let route53 = Arc::new(InMemoryRoute53::new());
        let hc = provisioner(&route53);

        let first = hc.ensure(&descriptor()).await.unwrap();
        let second = hc.ensure(&descriptor()).await.unwrap();

        assert_eq!(first.provider_health_check_id, second.provider_health_check_id);
        assert_eq!(route53.call_count(OP_CREATE_HEALTH_CHECK), 1);
        assert_eq!(route53.call_count(OP_UPDATE_HEALTH_CHECK), 1);
        assert_eq!(route53.health_checks().len(), 1);
    }

    #[tokio::test]
    async fn test_new_generation_updates_existing_check() {
        let route53 = Arc::new(InMemoryRoute53::new());
        let hc = provisioner(&route53);
        let first = hc.ensure(&descriptor()).await.unwrap();

        let changed = HealthCheckDescriptor {
            generation: 2,
            port: 8080,
            failure_threshold: 5,
            provider_health_check_id: None,
            ..descriptor()
        };
        let second = hc.ensure(&changed).await.unwrap();

        assert_eq!(first.provider_health_check_id, second.provider_health_check_id);
        assert_eq!(route53.call_count(OP_CREATE_HEALTH_CHECK), 1);
        let stored = route53
            .health_check(second.provider_health_check_id.as_deref().unwrap())
            .unwrap();
        assert_eq!(stored.config.port, 8080);
        assert_eq!(stored.config.failure_threshold, 5);
    }

    #[tokio::test]
    async fn test_update_keeps_creation_only_fields() {
        let route53 = Arc::new(InMemoryRoute53::new());
        let hc = provisioner(&route53);
        let first = hc.ensure(&descriptor()).await.unwrap();

        let slower = HealthCheckDescriptor {
            generation: 2,
            fast_interval: false,
            ..descriptor()
        };
        hc.ensure(&slower).await.unwrap();

        let stored = route53
            .health_check(first.provider_health_check_id.as_deref().unwrap())
            .unwrap();
        assert_eq!(stored.config.request_interval, 10);
    }

    #[tokio::test]
    async fn test_cached_id_is_reused() {
        let route53 = Arc::new(InMemoryRoute53::new());
        let id = route53.insert_health_check("imported-elsewhere", descriptor().to_config().unwrap());
        let cached = HealthCheckDescriptor {
            provider_health_check_id: Some(id.clone()),
            ..descriptor()
        };

        let ensured = provisioner(&route53).ensure(&cached).await.unwrap();

        assert_eq!(ensured.provider_health_check_id.as_deref(), Some(id.as_str()));
        assert_eq!(route53.call_count(OP_CREATE_HEALTH_CHECK), 0);
    }

    #[tokio::test]
    async fn test_other_owner_is_not_reused() {
        let route53 = Arc::new(InMemoryRoute53::new());
        route53.insert_health_check("default/web/uid-0/1", descriptor().to_config().unwrap());

        provisioner(&route53).ensure(&descriptor()).await.unwrap();

        assert_eq!(route53.call_count(OP_CREATE_HEALTH_CHECK), 1);
        assert_eq!(route53.health_checks().len(), 2);
    }

    #[tokio::test]
    async fn test_tag_failure_is_error() {
        let route53 = Arc::new(InMemoryRoute53::new());
        route53.fail_next(
            OP_CHANGE_TAGS_FOR_RESOURCE,
            ProviderError::request(OP_CHANGE_TAGS_FOR_RESOURCE, "throttled"),
        );

        let err = provisioner(&route53).ensure(&descriptor()).await.unwrap_err();

        assert!(matches!(err, Error::Provider(_)));
    }

    #[tokio::test]
    async fn test_delete_clears_id() {
        let route53 = Arc::new(InMemoryRoute53::new());
        let hc = provisioner(&route53);
        let ensured = hc.ensure(&descriptor()).await.unwrap();

        let (cleared, freed) = hc.delete(&ensured).await.unwrap();

        assert!(cleared.provider_health_check_id.is_none());
        assert_eq!(freed, ensured.provider_health_check_id);
        assert!(route53.health_checks().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_check_is_not_fatal() {
        let route53 = Arc::new(InMemoryRoute53::new());
        let stale = HealthCheckDescriptor {
            provider_health_check_id: Some("gone".to_string()),
            ..descriptor()
        };

        let (cleared, freed) = provisioner(&route53).delete(&stale).await.unwrap();

        assert!(cleared.provider_health_check_id.is_none());
        assert_eq!(freed.as_deref(), Some("gone"));
    }

    #[tokio::test]
    async fn test_delete_without_any_check_makes_no_call() {
        let route53 = Arc::new(InMemoryRoute53::new());

        let (_, freed) = provisioner(&route53).delete(&descriptor()).await.unwrap();

        assert!(freed.is_none());
        assert_eq!(route53.call_count(OP_DELETE_HEALTH_CHECK), 0);
    }

    #[tokio::test]
    async fn test_delete_finds_check_whose_id_was_lost() {
        let route53 = Arc::new(InMemoryRoute53::new());
        let hc = provisioner(&route53);
        let ensured = hc.ensure(&descriptor()).await.unwrap();

        // The status patch failed, so the resource never learned the id
        let (_, freed) = hc.delete(&descriptor()).await.unwrap();

        assert_eq!(freed, ensured.provider_health_check_id);
        assert!(route53.health_checks().is_empty());
    }

    #[tokio::test]
    async fn test_delete_finds_earlier_generation_by_owner() {
        let route53 = Arc::new(InMemoryRoute53::new());
        let hc = provisioner(&route53);
        hc.ensure(&descriptor()).await.unwrap();
        let newer = HealthCheckDescriptor {
            generation: 3,
            ..descriptor()
        };

        let (_, freed) = hc.delete(&newer).await.unwrap();

        assert!(freed.is_some());
        assert!(route53.health_checks().is_empty());
    }

    #[tokio::test]
    async fn test_delete_leaves_other_owners_checks() {
        let route53 = Arc::new(InMemoryRoute53::new());
        let hc = provisioner(&route53);
        hc.ensure(&descriptor()).await.unwrap();
        let other = HealthCheckDescriptor {
            uid: "uid-2".to_string(),
            ..descriptor()
        };

        let (_, freed) = hc.delete(&other).await.unwrap();

        assert!(freed.is_none());
        assert_eq!(route53.health_checks().len(), 1);
    }
}
