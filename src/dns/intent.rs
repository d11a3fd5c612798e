// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Annotation interpreter.
//!
//! Turns an endpoint's annotations and load balancer status into a [`RecordIntent`].
//! This is pure: no Kubernetes or AWS calls happen here.

use super::RecordIntent;
use crate::constants::{DEFAULT_RECORD_TTL_SECS, DEFAULT_RECORD_WEIGHT, SUPPORTED_RECORD_TYPE};
use crate::errors::{Error, Result};
use crate::labels::{
    ALIAS_ANNOTATION, HEALTH_CHECK_ID_ANNOTATION, HOSTED_ZONE_ID_ANNOTATION, HOSTNAME_ANNOTATION,
    RECORD_TYPE_ANNOTATION, SET_IDENTIFIER_ANNOTATION, TTL_ANNOTATION, WEIGHT_ANNOTATION,
};
use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;
use std::collections::BTreeMap;

/// One load balancer ingress point.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngressPoint {
    pub ip: Option<String>,
    pub hostname: Option<String>,
}

/// What the endpoint's traffic goes to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Backing {
    /// `ExternalName` Service pointing at a DNS name.
    ExternalName(String),
    /// `LoadBalancer` Service with its reported ingress points (possibly none yet).
    LoadBalancer(Vec<IngressPoint>),
    /// Any other Service type.
    Other,
}

/// Declared attributes of an endpoint, extracted from a Service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub namespace: String,
    pub name: String,
    pub uid: String,
    pub annotations: BTreeMap<String, String>,
    pub backing: Backing,
}

impl Endpoint {
    #[must_use]
    pub fn from_service(service: &Service) -> Self {
        let spec = service.spec.as_ref();
        let backing = match spec.and_then(|s| s.type_.as_deref()) {
            Some("ExternalName") => Backing::ExternalName(
                spec.and_then(|s| s.external_name.clone())
                    .unwrap_or_default(),
            ),
            Some("LoadBalancer") => Backing::LoadBalancer(
                service
                    .status
                    .as_ref()
                    .and_then(|s| s.load_balancer.as_ref())
                    .and_then(|lb| lb.ingress.as_ref())
                    .map(|ingress| {
                        ingress
                            .iter()
                            .map(|point| IngressPoint {
                                ip: point.ip.clone().filter(|ip| !ip.is_empty()),
                                hostname: point.hostname.clone().filter(|h| !h.is_empty()),
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            ),
            _ => Backing::Other,
        };

        Self {
            namespace: service.namespace().unwrap_or_default(),
            name: service.name_any(),
            uid: service.uid().unwrap_or_default(),
            annotations: service.annotations().clone(),
            backing,
        }
    }

    fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(String::as_str)
    }

    /// Set identifier used when none is declared.
    #[must_use]
    pub fn default_set_identifier(&self) -> String {
        format!("{}/{}/{}", self.namespace, self.name, self.uid)
    }
}

/// Boolean parsing with the spellings accepted by external-dns annotations.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn parse_integer(endpoint: &Endpoint, key: &str, default: i64) -> Result<i64> {
    match endpoint.annotation(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<i64>().map_err(|e| {
            Error::configuration(format!("annotation {key}='{raw}' is not an integer: {e}"))
        }),
    }
}

/// Fields naming a record: hostname, hosted zone, record type and set identifier.
struct RecordIdentity {
    hostname: String,
    hosted_zone_id: String,
    record_type: String,
    set_identifier: String,
}

fn record_identity(
    endpoint: &Endpoint,
    default_hosted_zone_id: Option<&str>,
) -> Result<RecordIdentity> {
    let hostname = endpoint
        .annotation(HOSTNAME_ANNOTATION)
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| {
            Error::configuration(format!("annotation {HOSTNAME_ANNOTATION} is missing"))
        })?
        .to_string();

    // An empty annotation falls back to the configured default.
    let hosted_zone_id = endpoint
        .annotation(HOSTED_ZONE_ID_ANNOTATION)
        .map(str::trim)
        .filter(|z| !z.is_empty())
        .or_else(|| {
            default_hosted_zone_id
                .map(str::trim)
                .filter(|z| !z.is_empty())
        })
        .ok_or_else(|| {
            Error::configuration(format!(
                "no hosted zone: set {HOSTED_ZONE_ID_ANNOTATION} or configure a default hosted zone"
            ))
        })?
        .to_string();

    let record_type = endpoint
        .annotation(RECORD_TYPE_ANNOTATION)
        .map_or(SUPPORTED_RECORD_TYPE, str::trim)
        .to_string();
    if record_type != SUPPORTED_RECORD_TYPE {
        return Err(Error::configuration(format!(
            "record type '{record_type}' is not supported, only '{SUPPORTED_RECORD_TYPE}' is"
        )));
    }

    let set_identifier = endpoint
        .annotation(SET_IDENTIFIER_ANNOTATION)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| endpoint.default_set_identifier(), str::to_string);

    Ok(RecordIdentity {
        hostname,
        hosted_zone_id,
        record_type,
        set_identifier,
    })
}

/// Build the intent used to withdraw an endpoint's records.
///
/// Only the record identity is interpreted. Deletes act on the record sets as observed
/// in Route 53, so the target, TTL and weight are irrelevant and an endpoint whose load
/// balancer is already gone can still be withdrawn.
///
/// # Errors
///
/// Returns [`Error::Configuration`] when the hostname or hosted zone is missing or the
/// record type is not `A`.
pub fn interpret_for_delete(
    endpoint: &Endpoint,
    default_hosted_zone_id: Option<&str>,
) -> Result<RecordIntent> {
    let RecordIdentity {
        hostname,
        hosted_zone_id,
        record_type,
        set_identifier,
    } = record_identity(endpoint, default_hosted_zone_id)?;

    Ok(RecordIntent {
        hostname,
        record_type,
        set_identifier,
        weight: DEFAULT_RECORD_WEIGHT,
        ttl: DEFAULT_RECORD_TTL_SECS,
        health_check_id: None,
        hosted_zone_id,
        is_alias: false,
        alias_target_zone_id: None,
        target_hostname: None,
        target_ip_address: None,
    })
}

/// Build a [`RecordIntent`] from an endpoint.
///
/// `default_hosted_zone_id` is used when the endpoint carries no hosted zone annotation.
/// The alias target zone is left unset; it is filled in by the alias zone resolver.
///
/// # Errors
///
/// Returns [`Error::Configuration`] when the hostname or hosted zone is missing, an
/// annotation fails to parse, the record type is not `A`, a load balancer has no ingress
/// point yet, or the alias flag disagrees with the available target.
pub fn interpret(endpoint: &Endpoint, default_hosted_zone_id: Option<&str>) -> Result<RecordIntent> {
    let RecordIdentity {
        hostname,
        hosted_zone_id,
        record_type,
        set_identifier,
    } = record_identity(endpoint, default_hosted_zone_id)?;

    let weight = parse_integer(endpoint, WEIGHT_ANNOTATION, DEFAULT_RECORD_WEIGHT)?;
    let ttl = parse_integer(endpoint, TTL_ANNOTATION, DEFAULT_RECORD_TTL_SECS)?;

    let first_ingress = match &endpoint.backing {
        Backing::LoadBalancer(points) => Some(points.first().ok_or_else(|| {
            Error::configuration(format!(
                "load balancer of {}/{} has no ingress point yet",
                endpoint.namespace, endpoint.name
            ))
        })?),
        Backing::ExternalName(_) | Backing::Other => None,
    };

    let is_alias = match endpoint.annotation(ALIAS_ANNOTATION) {
        Some(raw) => parse_bool(raw).ok_or_else(|| {
            Error::configuration(format!("annotation {ALIAS_ANNOTATION}='{raw}' is not a boolean"))
        })?,
        None => match &endpoint.backing {
            Backing::ExternalName(_) => true,
            Backing::LoadBalancer(_) => first_ingress.is_some_and(|point| point.ip.is_none()),
            Backing::Other => false,
        },
    };

    let (target_hostname, target_ip_address) = match (&endpoint.backing, first_ingress) {
        (Backing::ExternalName(name), _) => (Some(name.clone()).filter(|n| !n.is_empty()), None),
        (Backing::LoadBalancer(_), Some(point)) => match &point.ip {
            Some(ip) => (None, Some(ip.clone())),
            None => (point.hostname.clone(), None),
        },
        _ => (None, None),
    };

    let health_check_id = endpoint
        .annotation(HEALTH_CHECK_ID_ANNOTATION)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    let intent = RecordIntent {
        hostname,
        record_type,
        set_identifier,
        weight,
        ttl,
        health_check_id,
        hosted_zone_id,
        is_alias,
        alias_target_zone_id: None,
        target_hostname,
        target_ip_address,
    };
    intent.check_target()?;
    Ok(intent)
}

#[cfg(test)]
#[path = "intent_tests.rs"]
mod intent_tests;
