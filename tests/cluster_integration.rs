// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Integration tests against a live cluster with the `HealthCheck` CRD installed
//! and the operator running.
//!
//! Run with: cargo test --test cluster_integration -- --ignored

mod common;

use common::{cleanup_test_namespace, create_test_namespace, get_kube_client_or_skip};
use external_route53::crd::{
    HealthCheck, HealthCheckEndpoint, HealthCheckFeatures, HealthCheckProtocol, HealthCheckSpec,
};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Api, DeleteParams, PostParams};
use kube::CustomResourceExt;
use std::time::Duration;

const NAMESPACE: &str = "external-route53-it";

#[tokio::test]
#[ignore = "requires a Kubernetes cluster"]
async fn test_health_check_crd_installed() {
    let Some(client) = get_kube_client_or_skip().await else {
        return;
    };

    let crds: Api<CustomResourceDefinition> = Api::all(client);
    let name = HealthCheck::crd_name();
    let crd = crds
        .get(name)
        .await
        .unwrap_or_else(|e| panic!("CRD {name} is not installed: {e}"));

    assert_eq!(crd.spec.names.kind, "HealthCheck");
}

#[tokio::test]
#[ignore = "requires a Kubernetes cluster and the operator"]
async fn test_health_check_receives_provider_id() {
    let Some(client) = get_kube_client_or_skip().await else {
        return;
    };
    create_test_namespace(&client, NAMESPACE).await.unwrap();

    let api: Api<HealthCheck> = Api::namespaced(client.clone(), NAMESPACE);
    let resource = HealthCheck::new(
        "shop-health",
        HealthCheckSpec {
            enabled: false,
            invert: false,
            protocol: HealthCheckProtocol::Tcp,
            port: 443,
            path: None,
            endpoint: HealthCheckEndpoint {
                address: Some("192.0.2.10".to_string()),
                hostname: None,
            },
            failure_threshold: 3,
            features: HealthCheckFeatures::default(),
        },
    );
    api.create(&PostParams::default(), &resource).await.unwrap();

    let mut id = None;
    for _ in 0..30 {
        let current = api.get("shop-health").await.unwrap();
        id = current.status.and_then(|s| s.id);
        if id.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    api.delete("shop-health", &DeleteParams::default()).await.unwrap();
    cleanup_test_namespace(&client, NAMESPACE).await.unwrap();

    assert!(id.is_some(), "HealthCheck never reported status.id");
}
