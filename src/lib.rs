// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

#![allow(unexpected_cfgs)]

//! # external-route53 - Route 53 records and health checks for Kubernetes Services
//!
//! external-route53 is a Kubernetes operator that keeps Amazon Route 53 in sync with
//! annotated `Service` objects and `HealthCheck` custom resources.
//!
//! ## Overview
//!
//! - A Service annotated with `external-dns.alpha.kubernetes.io/hostname` gets a
//!   weighted `A` or alias record in Route 53, plus a TXT ownership marker proving
//!   that this controller manages the name for the record's set identifier.
//! - A `HealthCheck` resource becomes a Route 53 health check; its id is reported in
//!   `status.id` and can be attached to records.
//!
//! ## Modules
//!
//! - [`dns`] - Annotation interpretation, alias zone resolution, ownership and record sync
//! - [`healthcheck`] - Route 53 health check provisioning
//! - [`provider`] - Route 53 and Elastic Load Balancing clients (AWS SDK and in-memory)
//! - [`reconcilers`] - Service and `HealthCheck` reconciliation
//! - [`crd`] - The `HealthCheck` custom resource
//! - [`context`] - Shared controller context
//!
//! ## Example
//!
//! ```rust,no_run
//! use external_route53::dns::{interpret, Backing, Endpoint, IngressPoint};
//! use std::collections::BTreeMap;
//!
//! let mut annotations = BTreeMap::new();
//! annotations.insert(
//!     "external-dns.alpha.kubernetes.io/hostname".to_string(),
//!     "app.example.net".to_string(),
//! );
//! let endpoint = Endpoint {
//!     namespace: "default".to_string(),
//!     name: "web".to_string(),
//!     uid: "0b8e5c1e".to_string(),
//!     annotations,
//!     backing: Backing::LoadBalancer(vec![IngressPoint {
//!         ip: Some("10.0.0.5".to_string()),
//!         hostname: None,
//!     }]),
//! };
//!
//! let intent = interpret(&endpoint, Some("Z1")).unwrap();
//! assert_eq!(intent.target_ip_address.as_deref(), Some("10.0.0.5"));
//! ```

pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod dns;
pub mod errors;
pub mod healthcheck;
pub mod labels;
pub mod metrics;
pub mod provider;
pub mod reconcilers;
pub mod status_reasons;
