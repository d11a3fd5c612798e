// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Unit tests for context.rs

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::errors::Error;
    use crate::provider::memory::{InMemoryLoadBalancers, InMemoryRoute53};
    use crate::provider::LoadBalancerSummary;
    use serde_json::json;

    fn providers(zone: Option<&str>, elb: Arc<InMemoryLoadBalancers>) -> Providers {
        let config = OperatorConfig {
            default_hosted_zone_id: zone.map(str::to_string),
            ..OperatorConfig::default()
        };
        Providers::new(config, Arc::new(InMemoryRoute53::new()), elb)
    }

    fn nlb_service() -> Service {
        serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": {
                "name": "web",
                "namespace": "default",
                "uid": "uid-1",
                "annotations": {
                    "external-dns.alpha.kubernetes.io/hostname": "app.example.net"
                }
            },
            "spec": { "type": "LoadBalancer" },
            "status": { "loadBalancer": { "ingress": [
                { "hostname": "web-0123456789abcdef.elb.us-east-1.amazonaws.com" }
            ] } }
        }))
        .unwrap()
    }

    #[test]
    fn test_intent_uses_default_zone() {
        let providers = providers(Some("Z1"), Arc::new(InMemoryLoadBalancers::new()));

        let intent = providers.intent(&nlb_service()).unwrap();

        assert_eq!(intent.hosted_zone_id, "Z1");
        assert!(intent.is_alias);
        assert!(intent.alias_target_zone_id.is_none());
    }

    #[test]
    fn test_intent_without_zone_is_configuration_error() {
        let providers = providers(None, Arc::new(InMemoryLoadBalancers::new()));

        assert!(matches!(
            providers.intent(&nlb_service()),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_delete_intent_without_ingress() {
        let providers = providers(Some("Z1"), Arc::new(InMemoryLoadBalancers::new()));
        let mut svc = nlb_service();
        svc.status = None;

        assert!(providers.intent(&svc).is_err());
        let intent = providers.delete_intent(&svc).unwrap();
        assert_eq!(intent.hosted_zone_id, "Z1");
        assert_eq!(intent.set_identifier, "default/web/uid-1");
    }

    #[tokio::test]
    async fn test_resolved_intent_fills_alias_zone() {
        let elb = Arc::new(InMemoryLoadBalancers::new());
        elb.insert(LoadBalancerSummary {
            name: "web".to_string(),
            dns_name: Some("web-0123456789abcdef.elb.us-east-1.amazonaws.com".to_string()),
            canonical_hosted_zone_id: Some("Z26RNL4JYFTOTI".to_string()),
        });
        let providers = providers(Some("Z1"), elb);

        let intent = providers.resolved_intent(&nlb_service()).await.unwrap();

        assert_eq!(intent.alias_target_zone_id.as_deref(), Some("Z26RNL4JYFTOTI"));
    }

    #[tokio::test]
    async fn test_resolved_intent_unknown_load_balancer() {
        let providers = providers(Some("Z1"), Arc::new(InMemoryLoadBalancers::new()));

        let err = providers.resolved_intent(&nlb_service()).await.unwrap_err();

        assert!(matches!(err, Error::Resolution { .. }));
    }

    #[test]
    fn test_synchronizer_uses_configured_prefix() {
        let mut providers = providers(Some("Z1"), Arc::new(InMemoryLoadBalancers::new()));
        providers.config.marker_prefix = "owner-".to_string();

        assert_eq!(
            providers.synchronizer().validator().marker_name("app.example.net"),
            "owner-app.example.net"
        );
    }
}
