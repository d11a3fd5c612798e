// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! End-to-end record and health check lifecycles against the in-memory providers.
//!
//! Run with: cargo test --test record_lifecycle

mod common;

use common::{harness, service, ZONE};
use external_route53::errors::Error;
use external_route53::healthcheck::resource::build_for_service;
use external_route53::healthcheck::HealthCheckDescriptor;
use external_route53::provider::{domain_equal, LoadBalancerSummary, RecordType};
use external_route53::reconcilers::service::{delete_service_records, sync_service_records};
use serde_json::json;

const HOSTNAME: &str = "shop.example.net";

fn primary_values(route53: &external_route53::provider::memory::InMemoryRoute53) -> Vec<String> {
    route53
        .records(ZONE)
        .into_iter()
        .filter(|r| r.record_type == RecordType::A && domain_equal(&r.name, HOSTNAME))
        .flat_map(|r| r.values)
        .collect()
}

#[tokio::test]
async fn test_publish_move_and_withdraw_service() {
    let h = harness();
    let annotations = json!({
        "external-dns.alpha.kubernetes.io/hostname": HOSTNAME,
        "external-dns.alpha.kubernetes.io/set-identifier": "blue",
        "external-dns.alpha.kubernetes.io/aws-weight": "50"
    });

    let first = service("shop", "uid-blue", annotations.clone(), json!([{ "ip": "10.1.0.1" }]));
    sync_service_records(&h.providers, &first).await.unwrap();
    assert_eq!(primary_values(&h.route53), vec!["10.1.0.1".to_string()]);

    // The load balancer moved; the same set identifier replaces its record in place
    let moved = service("shop", "uid-blue", annotations, json!([{ "ip": "10.1.0.2" }]));
    sync_service_records(&h.providers, &moved).await.unwrap();
    assert_eq!(primary_values(&h.route53), vec!["10.1.0.2".to_string()]);

    let primary = h
        .route53
        .records(ZONE)
        .into_iter()
        .find(|r| r.record_type == RecordType::A)
        .unwrap();
    assert_eq!(primary.weight, Some(50));
    assert_eq!(primary.set_identifier.as_deref(), Some("blue"));

    let deleted = delete_service_records(&h.providers, &moved).await.unwrap();
    assert_eq!(deleted.map(|batch| batch.changes.len()), Some(2));
    assert!(h.route53.records(ZONE).is_empty());

    // Withdrawing again finds nothing to do
    assert!(delete_service_records(&h.providers, &moved)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_second_owner_waits_for_hostname_release() {
    let h = harness();
    let blue = service(
        "shop-blue",
        "uid-blue",
        json!({
            "external-dns.alpha.kubernetes.io/hostname": HOSTNAME,
            "external-dns.alpha.kubernetes.io/set-identifier": "blue"
        }),
        json!([{ "ip": "10.1.0.1" }]),
    );
    let green = service(
        "shop-green",
        "uid-green",
        json!({
            "external-dns.alpha.kubernetes.io/hostname": HOSTNAME,
            "external-dns.alpha.kubernetes.io/set-identifier": "green"
        }),
        json!([{ "ip": "10.2.0.1" }]),
    );

    sync_service_records(&h.providers, &blue).await.unwrap();

    let err = sync_service_records(&h.providers, &green).await.unwrap_err();
    assert!(matches!(
        err,
        Error::OwnershipConflict { ref set_identifier, .. } if set_identifier == "green"
    ));
    assert_eq!(primary_values(&h.route53), vec!["10.1.0.1".to_string()]);

    // Green cannot withdraw blue's records either
    assert!(delete_service_records(&h.providers, &green)
        .await
        .unwrap()
        .is_none());
    assert_eq!(primary_values(&h.route53), vec!["10.1.0.1".to_string()]);

    delete_service_records(&h.providers, &blue).await.unwrap();
    sync_service_records(&h.providers, &green).await.unwrap();
    assert_eq!(primary_values(&h.route53), vec!["10.2.0.1".to_string()]);
}

#[tokio::test]
async fn test_load_balancer_hostname_becomes_alias() {
    let h = harness();
    let dns_name = "shop-4f1c2a9e8b7d6c5a.elb.eu-west-1.amazonaws.com";
    h.load_balancers.insert(LoadBalancerSummary {
        name: "shop".to_string(),
        dns_name: Some(dns_name.to_string()),
        canonical_hosted_zone_id: Some("Z2IFOLAFXWLO4F".to_string()),
    });

    let svc = service(
        "shop",
        "uid-1",
        json!({ "external-dns.alpha.kubernetes.io/hostname": HOSTNAME }),
        json!([{ "hostname": dns_name }]),
    );
    sync_service_records(&h.providers, &svc).await.unwrap();

    let primary = h
        .route53
        .records(ZONE)
        .into_iter()
        .find(|r| r.record_type == RecordType::A)
        .unwrap();
    let alias = primary.alias_target.unwrap();
    assert_eq!(alias.hosted_zone_id, "Z2IFOLAFXWLO4F");
    assert!(domain_equal(&alias.dns_name, dns_name));
    assert!(primary.ttl.is_none());
    assert!(primary.values.is_empty());
}

#[tokio::test]
async fn test_service_health_check_lifecycle() {
    let h = harness();
    let svc = service(
        "shop",
        "uid-1",
        json!({
            "external-dns.alpha.kubernetes.io/hostname": HOSTNAME,
            "external-route53.io/health-check": "true"
        }),
        json!([{ "ip": "10.1.0.1" }]),
    );

    let mut resource = build_for_service(&svc).unwrap().unwrap();
    resource.metadata.uid = Some("hc-uid-1".to_string());
    resource.metadata.generation = Some(1);

    let provisioner = h.providers.provisioner();
    let ensured = provisioner
        .ensure(&HealthCheckDescriptor::from_resource(&resource))
        .await
        .unwrap();
    let id = ensured.provider_health_check_id.clone().unwrap();

    let stored = h.route53.health_check(&id).unwrap();
    assert_eq!(stored.config.ip_address.as_deref(), Some("10.1.0.1"));
    assert_eq!(stored.config.port, 443);
    assert!(stored.caller_reference.ends_with("/hc-uid-1/1"));

    // Ensuring the same generation again reuses the check
    provisioner.ensure(&ensured).await.unwrap();
    assert_eq!(h.route53.health_checks().len(), 1);

    // The Service references the check once the id is annotated
    let linked = service(
        "shop",
        "uid-1",
        json!({
            "external-dns.alpha.kubernetes.io/hostname": HOSTNAME,
            "external-route53.io/health-check": "true",
            "external-dns.alpha.kubernetes.io/aws-health-check-id": id
        }),
        json!([{ "ip": "10.1.0.1" }]),
    );
    sync_service_records(&h.providers, &linked).await.unwrap();
    let primary = h
        .route53
        .records(ZONE)
        .into_iter()
        .find(|r| r.record_type == RecordType::A)
        .unwrap();
    assert_eq!(primary.health_check_id.as_deref(), Some(id.as_str()));

    let (cleared, freed) = provisioner.delete(&ensured).await.unwrap();
    assert_eq!(freed.as_deref(), Some(id.as_str()));
    assert!(cleared.provider_health_check_id.is_none());
    assert!(h.route53.health_checks().is_empty());
}
