// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use external_route53::config::OperatorConfig;
use external_route53::context::Providers;
use external_route53::provider::memory::{InMemoryLoadBalancers, InMemoryRoute53};
use k8s_openapi::api::core::v1::Service;
use kube::{
    api::{Api, DeleteParams, PostParams},
    client::Client,
};
use serde_json::json;
use std::sync::Arc;

pub const ZONE: &str = "Z0EXAMPLE";

/// In-memory providers wired the way the operator wires the AWS ones.
pub struct Harness {
    pub route53: Arc<InMemoryRoute53>,
    pub load_balancers: Arc<InMemoryLoadBalancers>,
    pub providers: Providers,
}

pub fn harness() -> Harness {
    let route53 = Arc::new(InMemoryRoute53::new());
    let load_balancers = Arc::new(InMemoryLoadBalancers::new());
    let config = OperatorConfig {
        default_hosted_zone_id: Some(ZONE.to_string()),
        ..OperatorConfig::default()
    };
    let providers = Providers::new(config, route53.clone(), load_balancers.clone());
    Harness {
        route53,
        load_balancers,
        providers,
    }
}

/// A `LoadBalancer` Service in `default` with the given annotations and ingress.
pub fn service(
    name: &str,
    uid: &str,
    annotations: serde_json::Value,
    ingress: serde_json::Value,
) -> Service {
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": {
            "name": name,
            "namespace": "default",
            "uid": uid,
            "annotations": annotations
        },
        "spec": {
            "type": "LoadBalancer",
            "ports": [{ "name": "https", "port": 443, "protocol": "TCP" }]
        },
        "status": { "loadBalancer": { "ingress": ingress } }
    }))
    .expect("valid Service fixture")
}

/// Get a Kubernetes client or skip the test if not in a cluster
pub async fn get_kube_client_or_skip() -> Option<Client> {
    match Client::try_default().await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test: not running in Kubernetes cluster: {e}");
            None
        }
    }
}

/// Create a test namespace
pub async fn create_test_namespace(
    client: &Client,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let namespaces: Api<k8s_openapi::api::core::v1::Namespace> = Api::all(client.clone());

    let ns = serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "labels": {
                "test": "integration",
                "managed-by": "external-route53-test"
            }
        }
    }))?;

    match namespaces.create(&PostParams::default(), &ns).await {
        Ok(_) => {
            println!("Created test namespace: {name}");
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            println!("Test namespace already exists: {name}");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

/// Cleanup test namespace
pub async fn cleanup_test_namespace(
    client: &Client,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let namespaces: Api<k8s_openapi::api::core::v1::Namespace> = Api::all(client.clone());

    match namespaces.delete(name, &DeleteParams::default()).await {
        Ok(_) => {
            println!("Deleted test namespace: {name}");
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 404 => {
            println!("Test namespace already deleted: {name}");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
