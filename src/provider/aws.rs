// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! AWS SDK backed implementations of [`Route53Api`] and [`LoadBalancerApi`].

use super::{
    AliasTarget, ChangeAction, ChangeBatch, HealthCheckConfig, HealthCheckSummary,
    HealthCheckType, HealthCheckUpdate, LoadBalancerApi, LoadBalancerSummary, ProviderError,
    RecordSet, RecordSetQuery, RecordType, Route53Api, OP_CHANGE_RESOURCE_RECORD_SETS,
    OP_CHANGE_TAGS_FOR_RESOURCE, OP_CREATE_HEALTH_CHECK, OP_DELETE_HEALTH_CHECK,
    OP_DESCRIBE_LOAD_BALANCERS, OP_LIST_HEALTH_CHECKS, OP_LIST_RESOURCE_RECORD_SETS,
    OP_UPDATE_HEALTH_CHECK,
};
use crate::constants::RECORD_LIST_PAGE_SIZE;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_elasticloadbalancingv2 as elbv2;
use aws_sdk_route53::error::DisplayErrorContext;
use aws_sdk_route53::types as r53;
use tracing::debug;

/// Substring Route 53 uses when a DELETE targets a missing record set.
const RECORD_NOT_FOUND_MESSAGE: &str = "but it was not found";

fn request_error<E>(operation: &'static str, err: E) -> ProviderError
where
    E: std::error::Error,
{
    ProviderError::request(operation, DisplayErrorContext(&err).to_string())
}

fn build_error(operation: &'static str, err: &aws_sdk_route53::error::BuildError) -> ProviderError {
    ProviderError::request(operation, format!("invalid request: {err}"))
}

/// Route 53 client.
#[derive(Clone, Debug)]
pub struct AwsRoute53 {
    client: aws_sdk_route53::Client,
}

impl AwsRoute53 {
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_route53::Client::new(config),
        }
    }

    #[must_use]
    pub fn from_client(client: aws_sdk_route53::Client) -> Self {
        Self { client }
    }
}

fn record_set_from_sdk(record: &r53::ResourceRecordSet) -> RecordSet {
    RecordSet {
        name: record.name().to_string(),
        record_type: RecordType::from(record.r#type().as_str()),
        set_identifier: record.set_identifier().map(str::to_string),
        weight: record.weight(),
        ttl: record.ttl(),
        values: record
            .resource_records()
            .iter()
            .map(|rr| rr.value().to_string())
            .collect(),
        alias_target: record.alias_target().map(|alias| AliasTarget {
            hosted_zone_id: alias.hosted_zone_id().to_string(),
            dns_name: alias.dns_name().to_string(),
            evaluate_target_health: alias.evaluate_target_health(),
        }),
        health_check_id: record.health_check_id().map(str::to_string),
    }
}

fn record_set_to_sdk(record: &RecordSet) -> Result<r53::ResourceRecordSet, ProviderError> {
    let op = OP_CHANGE_RESOURCE_RECORD_SETS;

    let resource_records = if record.values.is_empty() {
        None
    } else {
        Some(
            record
                .values
                .iter()
                .map(|value| {
                    r53::ResourceRecord::builder()
                        .value(value)
                        .build()
                        .map_err(|e| build_error(op, &e))
                })
                .collect::<Result<Vec<_>, _>>()?,
        )
    };

    let alias_target = record
        .alias_target
        .as_ref()
        .map(|alias| {
            r53::AliasTarget::builder()
                .hosted_zone_id(&alias.hosted_zone_id)
                .dns_name(&alias.dns_name)
                .evaluate_target_health(alias.evaluate_target_health)
                .build()
                .map_err(|e| build_error(op, &e))
        })
        .transpose()?;

    r53::ResourceRecordSet::builder()
        .name(&record.name)
        .r#type(r53::RrType::from(record.record_type.as_str()))
        .set_set_identifier(record.set_identifier.clone())
        .set_weight(record.weight)
        .set_ttl(record.ttl)
        .set_resource_records(resource_records)
        .set_alias_target(alias_target)
        .set_health_check_id(record.health_check_id.clone())
        .build()
        .map_err(|e| build_error(op, &e))
}

fn change_batch_to_sdk(batch: &ChangeBatch) -> Result<r53::ChangeBatch, ProviderError> {
    let op = OP_CHANGE_RESOURCE_RECORD_SETS;
    let changes = batch
        .changes
        .iter()
        .map(|change| {
            let action = match change.action {
                ChangeAction::Upsert => r53::ChangeAction::Upsert,
                ChangeAction::Delete => r53::ChangeAction::Delete,
            };
            r53::Change::builder()
                .action(action)
                .resource_record_set(record_set_to_sdk(&change.record_set)?)
                .build()
                .map_err(|e| build_error(op, &e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    r53::ChangeBatch::builder()
        .set_comment(batch.comment.clone())
        .set_changes(Some(changes))
        .build()
        .map_err(|e| build_error(op, &e))
}

fn health_check_type_to_sdk(check_type: HealthCheckType) -> r53::HealthCheckType {
    match check_type {
        HealthCheckType::Http => r53::HealthCheckType::Http,
        HealthCheckType::Https => r53::HealthCheckType::Https,
        HealthCheckType::HttpStrMatch => r53::HealthCheckType::HttpStrMatch,
        HealthCheckType::HttpsStrMatch => r53::HealthCheckType::HttpsStrMatch,
        HealthCheckType::Tcp => r53::HealthCheckType::Tcp,
    }
}

fn health_check_config_to_sdk(
    config: &HealthCheckConfig,
) -> Result<r53::HealthCheckConfig, ProviderError> {
    r53::HealthCheckConfig::builder()
        .r#type(health_check_type_to_sdk(config.check_type))
        .set_ip_address(config.ip_address.clone())
        .set_fully_qualified_domain_name(config.fully_qualified_domain_name.clone())
        .port(config.port)
        .set_resource_path(config.resource_path.clone())
        .set_search_string(config.search_string.clone())
        .set_enable_sni(config.enable_sni)
        .failure_threshold(config.failure_threshold)
        .inverted(config.inverted)
        .disabled(config.disabled)
        .request_interval(config.request_interval)
        .measure_latency(config.measure_latency)
        .build()
        .map_err(|e| build_error(OP_CREATE_HEALTH_CHECK, &e))
}

#[async_trait]
impl Route53Api for AwsRoute53 {
    async fn list_resource_record_sets(
        &self,
        query: &RecordSetQuery,
    ) -> Result<Vec<RecordSet>, ProviderError> {
        let output = self
            .client
            .list_resource_record_sets()
            .hosted_zone_id(&query.hosted_zone_id)
            .start_record_name(&query.start_name)
            .set_start_record_type(
                query
                    .start_type
                    .as_ref()
                    .map(|t| r53::RrType::from(t.as_str())),
            )
            .set_start_record_identifier(query.start_identifier.clone())
            .max_items(RECORD_LIST_PAGE_SIZE)
            .send()
            .await
            .map_err(|e| request_error(OP_LIST_RESOURCE_RECORD_SETS, e))?;

        Ok(output
            .resource_record_sets()
            .iter()
            .map(record_set_from_sdk)
            .collect())
    }

    async fn change_resource_record_sets(
        &self,
        hosted_zone_id: &str,
        batch: &ChangeBatch,
    ) -> Result<(), ProviderError> {
        let change_batch = change_batch_to_sdk(batch)?;

        match self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(hosted_zone_id)
            .change_batch(change_batch)
            .send()
            .await
        {
            Ok(_) => {
                debug!(
                    hosted_zone_id,
                    changes = batch.changes.len(),
                    "Submitted change batch"
                );
                Ok(())
            }
            Err(err) => {
                let message = DisplayErrorContext(&err).to_string();
                if message.contains(RECORD_NOT_FOUND_MESSAGE) {
                    Err(ProviderError::not_found(
                        OP_CHANGE_RESOURCE_RECORD_SETS,
                        message,
                    ))
                } else {
                    Err(ProviderError::request(
                        OP_CHANGE_RESOURCE_RECORD_SETS,
                        message,
                    ))
                }
            }
        }
    }

    async fn list_health_checks(&self) -> Result<Vec<HealthCheckSummary>, ProviderError> {
        let mut summaries = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .client
                .list_health_checks()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| request_error(OP_LIST_HEALTH_CHECKS, e))?;

            summaries.extend(output.health_checks().iter().map(|hc| HealthCheckSummary {
                id: hc.id().to_string(),
                caller_reference: hc.caller_reference().to_string(),
            }));

            match output.next_marker() {
                Some(next) if output.is_truncated() && !next.is_empty() => {
                    marker = Some(next.to_string());
                }
                _ => break,
            }
        }

        Ok(summaries)
    }

    async fn create_health_check(
        &self,
        caller_reference: &str,
        config: &HealthCheckConfig,
    ) -> Result<String, ProviderError> {
        let output = self
            .client
            .create_health_check()
            .caller_reference(caller_reference)
            .health_check_config(health_check_config_to_sdk(config)?)
            .send()
            .await
            .map_err(|e| request_error(OP_CREATE_HEALTH_CHECK, e))?;

        output
            .health_check()
            .map(|hc| hc.id().to_string())
            .ok_or_else(|| {
                ProviderError::request(OP_CREATE_HEALTH_CHECK, "response carried no health check")
            })
    }

    async fn update_health_check(
        &self,
        health_check_id: &str,
        update: &HealthCheckUpdate,
    ) -> Result<String, ProviderError> {
        let result = self
            .client
            .update_health_check()
            .health_check_id(health_check_id)
            .set_ip_address(update.ip_address.clone())
            .set_fully_qualified_domain_name(update.fully_qualified_domain_name.clone())
            .port(update.port)
            .set_resource_path(update.resource_path.clone())
            .set_search_string(update.search_string.clone())
            .set_enable_sni(update.enable_sni)
            .failure_threshold(update.failure_threshold)
            .inverted(update.inverted)
            .disabled(update.disabled)
            .send()
            .await;

        match result {
            Ok(output) => output
                .health_check()
                .map(|hc| hc.id().to_string())
                .ok_or_else(|| {
                    ProviderError::request(
                        OP_UPDATE_HEALTH_CHECK,
                        "response carried no health check",
                    )
                }),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_no_such_health_check()) =>
            {
                Err(ProviderError::not_found(
                    OP_UPDATE_HEALTH_CHECK,
                    DisplayErrorContext(&err).to_string(),
                ))
            }
            Err(err) => Err(request_error(OP_UPDATE_HEALTH_CHECK, err)),
        }
    }

    async fn delete_health_check(&self, health_check_id: &str) -> Result<(), ProviderError> {
        match self
            .client
            .delete_health_check()
            .health_check_id(health_check_id)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_no_such_health_check()) =>
            {
                Err(ProviderError::not_found(
                    OP_DELETE_HEALTH_CHECK,
                    DisplayErrorContext(&err).to_string(),
                ))
            }
            Err(err) => Err(request_error(OP_DELETE_HEALTH_CHECK, err)),
        }
    }

    async fn tag_health_check(
        &self,
        health_check_id: &str,
        tags: &[(String, String)],
    ) -> Result<(), ProviderError> {
        let tags = tags
            .iter()
            .map(|(key, value)| r53::Tag::builder().key(key).value(value).build())
            .collect::<Vec<_>>();

        self.client
            .change_tags_for_resource()
            .resource_type(r53::TagResourceType::Healthcheck)
            .resource_id(health_check_id)
            .set_add_tags(Some(tags))
            .send()
            .await
            .map_err(|e| request_error(OP_CHANGE_TAGS_FOR_RESOURCE, e))?;
        Ok(())
    }
}

/// Elastic Load Balancing v2 client.
#[derive(Clone, Debug)]
pub struct AwsLoadBalancers {
    client: elbv2::Client,
}

impl AwsLoadBalancers {
    /// Build a client, optionally pinned to a region other than the shared config's.
    #[must_use]
    pub fn new(config: &SdkConfig, region: Option<String>) -> Self {
        let client = match region {
            Some(region) => {
                let conf = elbv2::config::Builder::from(config)
                    .region(elbv2::config::Region::new(region))
                    .build();
                elbv2::Client::from_conf(conf)
            }
            None => elbv2::Client::new(config),
        };
        Self { client }
    }

    #[must_use]
    pub fn from_client(client: elbv2::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LoadBalancerApi for AwsLoadBalancers {
    async fn describe_load_balancers(
        &self,
        names: &[String],
    ) -> Result<Vec<LoadBalancerSummary>, ProviderError> {
        match self
            .client
            .describe_load_balancers()
            .set_names(Some(names.to_vec()))
            .send()
            .await
        {
            Ok(output) => Ok(output
                .load_balancers()
                .iter()
                .map(|lb| LoadBalancerSummary {
                    name: lb.load_balancer_name().unwrap_or_default().to_string(),
                    dns_name: lb.dns_name().map(str::to_string),
                    canonical_hosted_zone_id: lb.canonical_hosted_zone_id().map(str::to_string),
                })
                .collect()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_load_balancer_not_found_exception()) =>
            {
                Ok(Vec::new())
            }
            Err(err) => Err(ProviderError::request(
                OP_DESCRIBE_LOAD_BALANCERS,
                elbv2::error::DisplayErrorContext(&err).to_string(),
            )),
        }
    }
}

#[cfg(test)]
#[path = "aws_tests.rs"]
mod aws_tests;
