// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Unit tests for alias zone resolution.

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::provider::memory::InMemoryLoadBalancers;
    use crate::provider::LoadBalancerSummary;

    const NLB_HOSTNAME: &str = "web-frontend-0123456789abcdef.elb.us-east-1.amazonaws.com";

    fn resolver_with(load_balancers: &Arc<InMemoryLoadBalancers>) -> AliasZoneResolver {
        AliasZoneResolver::new(load_balancers.clone())
    }

    fn nlb(name: &str, zone: Option<&str>) -> LoadBalancerSummary {
        LoadBalancerSummary {
            name: name.to_string(),
            dns_name: Some(NLB_HOSTNAME.to_string()),
            canonical_hosted_zone_id: zone.map(str::to_string),
        }
    }

    fn alias_intent(target: &str) -> RecordIntent {
        RecordIntent {
            hostname: "app.example.net".to_string(),
            record_type: "A".to_string(),
            set_identifier: "blue".to_string(),
            weight: 1,
            ttl: 10,
            health_check_id: None,
            hosted_zone_id: "Z1".to_string(),
            is_alias: true,
            alias_target_zone_id: None,
            target_hostname: Some(target.to_string()),
            target_ip_address: None,
        }
    }

    #[test]
    fn test_load_balancer_name_strips_random_suffix() {
        assert_eq!(
            load_balancer_name(NLB_HOSTNAME),
            Some(Some("web-frontend".to_string()))
        );
        assert_eq!(
            load_balancer_name("web-1.elb.ap-northeast-1.amazonaws.com."),
            Some(Some("web".to_string()))
        );
    }

    #[test]
    fn test_load_balancer_name_ignores_other_hostnames() {
        assert_eq!(load_balancer_name("svc.example.com"), None);
        assert_eq!(load_balancer_name("web-1.us-east-1.elb.amazonaws.com"), None);
        assert_eq!(load_balancer_name("elb.us-east-1.amazonaws.com"), None);
        assert_eq!(load_balancer_name("web-1.elb..amazonaws.com"), None);
    }

    #[test]
    fn test_load_balancer_name_without_suffix() {
        assert_eq!(
            load_balancer_name("web.elb.us-east-1.amazonaws.com"),
            Some(None)
        );
    }

    #[tokio::test]
    async fn test_resolve_returns_canonical_zone() {
        let elb = Arc::new(InMemoryLoadBalancers::new());
        elb.insert(nlb("web-frontend", Some("Z26RNL4JYFTOTI")));

        let zone = resolver_with(&elb).resolve(NLB_HOSTNAME).await.unwrap();

        assert_eq!(zone.as_deref(), Some("Z26RNL4JYFTOTI"));
        assert_eq!(elb.lookups(), vec![vec!["web-frontend".to_string()]]);
    }

    #[tokio::test]
    async fn test_resolve_non_elb_hostname_skips_lookup() {
        let elb = Arc::new(InMemoryLoadBalancers::new());

        let zone = resolver_with(&elb).resolve("svc.example.com").await.unwrap();

        assert!(zone.is_none());
        assert!(elb.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_unknown_load_balancer_fails() {
        let elb = Arc::new(InMemoryLoadBalancers::new());

        let err = resolver_with(&elb).resolve(NLB_HOSTNAME).await.unwrap_err();

        assert!(matches!(err, Error::Resolution { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_resolve_missing_zone_fails() {
        let elb = Arc::new(InMemoryLoadBalancers::new());
        elb.insert(nlb("web-frontend", None));

        let err = resolver_with(&elb).resolve(NLB_HOSTNAME).await.unwrap_err();

        assert!(matches!(err, Error::Resolution { .. }));
    }

    #[tokio::test]
    async fn test_apply_sets_alias_target_zone() {
        let elb = Arc::new(InMemoryLoadBalancers::new());
        elb.insert(nlb("web-frontend", Some("Z26RNL4JYFTOTI")));
        let mut intent = alias_intent(NLB_HOSTNAME);

        resolver_with(&elb).apply(&mut intent).await.unwrap();

        assert_eq!(intent.alias_target_zone_id.as_deref(), Some("Z26RNL4JYFTOTI"));
    }

    #[tokio::test]
    async fn test_apply_ignores_plain_records() {
        let elb = Arc::new(InMemoryLoadBalancers::new());
        let mut intent = alias_intent(NLB_HOSTNAME);
        intent.is_alias = false;

        resolver_with(&elb).apply(&mut intent).await.unwrap();

        assert!(intent.alias_target_zone_id.is_none());
        assert!(elb.lookups().is_empty());
    }
}
