// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! In-memory Route 53 and load balancer implementations.
//!
//! These keep enough of the provider's behavior to exercise the reconciliation
//! engine without AWS: canonical listing order, atomic change batches, exact-match
//! deletes, caller-reference uniqueness for health checks, and per-operation call
//! accounting. Failures can be injected for a single call with [`InMemoryRoute53::fail_next`].

use super::{
    canonical_name_key, domain_equal, ChangeAction, ChangeBatch, HealthCheckConfig,
    HealthCheckSummary, HealthCheckUpdate, LoadBalancerApi, LoadBalancerSummary,
    ProviderError, RecordSet, RecordSetQuery, RecordType, Route53Api,
    OP_CHANGE_RESOURCE_RECORD_SETS, OP_CHANGE_TAGS_FOR_RESOURCE, OP_CREATE_HEALTH_CHECK,
    OP_DELETE_HEALTH_CHECK, OP_LIST_HEALTH_CHECKS,
    OP_LIST_RESOURCE_RECORD_SETS, OP_UPDATE_HEALTH_CHECK,
};
use crate::constants::RECORD_LIST_PAGE_SIZE;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A health check held by [`InMemoryRoute53`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredHealthCheck {
    pub id: String,
    pub caller_reference: String,
    pub config: HealthCheckConfig,
    pub tags: BTreeMap<String, String>,
}

#[derive(Default)]
struct Route53State {
    zones: BTreeMap<String, Vec<RecordSet>>,
    health_checks: Vec<StoredHealthCheck>,
    next_health_check: u64,
    calls: BTreeMap<&'static str, usize>,
    batches: Vec<(String, ChangeBatch)>,
    injected: BTreeMap<&'static str, ProviderError>,
}

impl Route53State {
    fn enter(&mut self, operation: &'static str) -> Result<(), ProviderError> {
        *self.calls.entry(operation).or_default() += 1;
        match self.injected.remove(operation) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// In-memory stand-in for Route 53.
#[derive(Default)]
pub struct InMemoryRoute53 {
    state: Mutex<Route53State>,
}

impl InMemoryRoute53 {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Route53State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a record set without going through a change batch.
    pub fn insert_record(&self, hosted_zone_id: &str, mut record: RecordSet) {
        record.name = absolute(&record.name);
        self.lock()
            .zones
            .entry(hosted_zone_id.to_string())
            .or_default()
            .push(record);
    }

    /// Seed a health check and return its id.
    pub fn insert_health_check(&self, caller_reference: &str, config: HealthCheckConfig) -> String {
        let mut state = self.lock();
        state.next_health_check += 1;
        let id = health_check_id(state.next_health_check);
        state.health_checks.push(StoredHealthCheck {
            id: id.clone(),
            caller_reference: caller_reference.to_string(),
            config,
            tags: BTreeMap::new(),
        });
        id
    }

    /// Record sets currently stored in a zone, in canonical order.
    #[must_use]
    pub fn records(&self, hosted_zone_id: &str) -> Vec<RecordSet> {
        let mut records = self
            .lock()
            .zones
            .get(hosted_zone_id)
            .cloned()
            .unwrap_or_default();
        records.sort_by_key(sort_key);
        records
    }

    #[must_use]
    pub fn health_checks(&self) -> Vec<StoredHealthCheck> {
        self.lock().health_checks.clone()
    }

    #[must_use]
    pub fn health_check(&self, id: &str) -> Option<StoredHealthCheck> {
        self.lock().health_checks.iter().find(|hc| hc.id == id).cloned()
    }

    /// Number of calls made to a provider operation (e.g. [`OP_CREATE_HEALTH_CHECK`]).
    #[must_use]
    pub fn call_count(&self, operation: &str) -> usize {
        self.lock().calls.get(operation).copied().unwrap_or_default()
    }

    /// Change batches accepted so far, with their hosted zone.
    #[must_use]
    pub fn submitted_batches(&self) -> Vec<(String, ChangeBatch)> {
        self.lock().batches.clone()
    }

    /// Make the next call to `operation` fail with `error`.
    pub fn fail_next(&self, operation: &'static str, error: ProviderError) {
        self.lock().injected.insert(operation, error);
    }
}

fn absolute(name: &str) -> String {
    format!("{}.", name.trim_end_matches('.'))
}

fn health_check_id(sequence: u64) -> String {
    format!("00000000-0000-4000-8000-{sequence:012x}")
}

fn sort_key(record: &RecordSet) -> (Vec<String>, String, String) {
    (
        canonical_name_key(&record.name),
        record.record_type.as_str().to_string(),
        record.set_identifier.clone().unwrap_or_default(),
    )
}

fn same_identity(a: &RecordSet, b: &RecordSet) -> bool {
    domain_equal(&a.name, &b.name)
        && a.record_type == b.record_type
        && a.set_identifier == b.set_identifier
}

fn describe(record: &RecordSet) -> String {
    format!(
        "[name='{}', type='{}', set-identifier='{}']",
        absolute(&record.name),
        record.record_type,
        record.set_identifier.as_deref().unwrap_or_default()
    )
}

#[async_trait]
impl Route53Api for InMemoryRoute53 {
    async fn list_resource_record_sets(
        &self,
        query: &RecordSetQuery,
    ) -> Result<Vec<RecordSet>, ProviderError> {
        let mut state = self.lock();
        state.enter(OP_LIST_RESOURCE_RECORD_SETS)?;

        let start = (
            canonical_name_key(&query.start_name),
            query
                .start_type
                .as_ref()
                .map(|t| t.as_str().to_string())
                .unwrap_or_default(),
            query.start_identifier.clone().unwrap_or_default(),
        );

        let mut records = state
            .zones
            .get(&query.hosted_zone_id)
            .cloned()
            .unwrap_or_default();
        records.sort_by_key(sort_key);

        let page = usize::try_from(RECORD_LIST_PAGE_SIZE).unwrap_or(usize::MAX);
        Ok(records
            .into_iter()
            .filter(|record| sort_key(record) >= start)
            .take(page)
            .collect())
    }

    async fn change_resource_record_sets(
        &self,
        hosted_zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<(), ProviderError> {
        let mut state = self.lock();
        state.enter(OP_CHANGE_RESOURCE_RECORD_SETS)?;

        // Work on a copy so a failing change leaves the zone untouched.
        let mut zone = state
            .zones
            .get(hosted_zone_id)
            .cloned()
            .unwrap_or_default();

        for change in &batch.changes {
            let mut record = change.record_set.clone();
            record.name = absolute(&record.name);
            let existing = zone.iter().position(|r| same_identity(r, &record));

            match (change.action, existing) {
                (ChangeAction::Upsert, Some(index)) => zone[index] = record,
                (ChangeAction::Upsert, None) => zone.push(record),
                (ChangeAction::Delete, Some(index)) if zone[index] == record => {
                    zone.remove(index);
                }
                (ChangeAction::Delete, Some(_)) => {
                    return Err(ProviderError::request(
                        OP_CHANGE_RESOURCE_RECORD_SETS,
                        format!(
                            "Tried to delete resource record set {} but the values provided do not match the current values",
                            describe(&record)
                        ),
                    ));
                }
                (ChangeAction::Delete, None) => {
                    return Err(ProviderError::not_found(
                        OP_CHANGE_RESOURCE_RECORD_SETS,
                        format!(
                            "Tried to delete resource record set {} but it was not found",
                            describe(&record)
                        ),
                    ));
                }
            }
        }

        state.zones.insert(hosted_zone_id.to_string(), zone);
        state
            .batches
            .push((hosted_zone_id.to_string(), batch.clone()));
        Ok(())
    }

    async fn list_health_checks(&self) -> Result<Vec<HealthCheckSummary>, ProviderError> {
        let mut state = self.lock();
        state.enter(OP_LIST_HEALTH_CHECKS)?;
        Ok(state
            .health_checks
            .iter()
            .map(|hc| HealthCheckSummary {
                id: hc.id.clone(),
                caller_reference: hc.caller_reference.clone(),
            })
            .collect())
    }

    async fn create_health_check(
        &self,
        caller_reference: &str,
        config: &HealthCheckConfig,
    ) -> Result<String, ProviderError> {
        let mut state = self.lock();
        state.enter(OP_CREATE_HEALTH_CHECK)?;

        if state
            .health_checks
            .iter()
            .any(|hc| hc.caller_reference == caller_reference)
        {
            return Err(ProviderError::request(
                OP_CREATE_HEALTH_CHECK,
                format!("HealthCheckAlreadyExists: caller reference '{caller_reference}' is already in use"),
            ));
        }

        state.next_health_check += 1;
        let id = health_check_id(state.next_health_check);
        state.health_checks.push(StoredHealthCheck {
            id: id.clone(),
            caller_reference: caller_reference.to_string(),
            config: config.clone(),
            tags: BTreeMap::new(),
        });
        Ok(id)
    }

    async fn update_health_check(
        &self,
        health_check_id: &str,
        update: &HealthCheckUpdate,
    ) -> Result<String, ProviderError> {
        let mut state = self.lock();
        state.enter(OP_UPDATE_HEALTH_CHECK)?;

        let stored = state
            .health_checks
            .iter_mut()
            .find(|hc| hc.id == health_check_id)
            .ok_or_else(|| {
                ProviderError::not_found(
                    OP_UPDATE_HEALTH_CHECK,
                    format!("No health check exists with the specified ID {health_check_id}"),
                )
            })?;

        let config = &mut stored.config;
        config.ip_address.clone_from(&update.ip_address);
        config
            .fully_qualified_domain_name
            .clone_from(&update.fully_qualified_domain_name);
        config.port = update.port;
        config.resource_path.clone_from(&update.resource_path);
        config.search_string.clone_from(&update.search_string);
        config.enable_sni = update.enable_sni;
        config.failure_threshold = update.failure_threshold;
        config.inverted = update.inverted;
        config.disabled = update.disabled;

        Ok(stored.id.clone())
    }

    async fn delete_health_check(&self, health_check_id: &str) -> Result<(), ProviderError> {
        let mut state = self.lock();
        state.enter(OP_DELETE_HEALTH_CHECK)?;

        let before = state.health_checks.len();
        state.health_checks.retain(|hc| hc.id != health_check_id);
        if state.health_checks.len() == before {
            return Err(ProviderError::not_found(
                OP_DELETE_HEALTH_CHECK,
                format!("No health check exists with the specified ID {health_check_id}"),
            ));
        }
        Ok(())
    }

    async fn tag_health_check(
        &self,
        health_check_id: &str,
        tags: &[(String, String)],
    ) -> Result<(), ProviderError> {
        let mut state = self.lock();
        state.enter(OP_CHANGE_TAGS_FOR_RESOURCE)?;

        let stored = state
            .health_checks
            .iter_mut()
            .find(|hc| hc.id == health_check_id)
            .ok_or_else(|| {
                ProviderError::not_found(
                    OP_CHANGE_TAGS_FOR_RESOURCE,
                    format!("No health check exists with the specified ID {health_check_id}"),
                )
            })?;
        stored.tags.extend(tags.iter().cloned());
        Ok(())
    }
}

/// In-memory stand-in for the Elastic Load Balancing v2 API.
#[derive(Default)]
pub struct InMemoryLoadBalancers {
    load_balancers: Mutex<Vec<LoadBalancerSummary>>,
    lookups: Mutex<Vec<Vec<String>>>,
}

impl InMemoryLoadBalancers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, load_balancer: LoadBalancerSummary) {
        self.load_balancers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(load_balancer);
    }

    /// Names requested by each `DescribeLoadBalancers` call.
    #[must_use]
    pub fn lookups(&self) -> Vec<Vec<String>> {
        self.lookups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LoadBalancerApi for InMemoryLoadBalancers {
    async fn describe_load_balancers(
        &self,
        names: &[String],
    ) -> Result<Vec<LoadBalancerSummary>, ProviderError> {
        self.lookups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(names.to_vec());

        Ok(self
            .load_balancers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|lb| names.contains(&lb.name))
            .cloned()
            .collect())
    }
}

/// Convenience constructor for a weighted `A` record set.
#[must_use]
pub fn a_record(name: &str, set_identifier: &str, address: &str) -> RecordSet {
    RecordSet {
        name: name.to_string(),
        record_type: RecordType::A,
        set_identifier: Some(set_identifier.to_string()),
        weight: Some(1),
        ttl: Some(60),
        values: vec![address.to_string()],
        alias_target: None,
        health_check_id: None,
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
