// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

use anyhow::Result;
use aws_config::BehaviorVersion;
use clap::Parser;
use external_route53::{
    config::OperatorConfig,
    constants::{
        DEFAULT_MARKER_PREFIX, KIND_HEALTH_CHECK, KIND_SERVICE, METRICS_SERVER_BIND_ADDRESS,
        METRICS_SERVER_PATH, METRICS_SERVER_PORT, SUCCESS_REQUEUE_DURATION_SECS,
        TOKIO_WORKER_THREADS,
    },
    context::{Context, Providers},
    crd::HealthCheck,
    metrics,
    provider::aws::{AwsLoadBalancers, AwsRoute53},
    reconcilers::{
        failure_category, failure_reason, reconcile_health_check, reconcile_service, requeue_after,
    },
};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Service;
use kube::{
    runtime::{controller::Action, watcher::Config, Controller},
    Api, Client, ResourceExt,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] anyhow::Error);

/// Route 53 record and health check operator for Kubernetes Services.
#[derive(Debug, Parser)]
#[command(name = "external-route53", version, about)]
struct Cli {
    /// Hosted zone used for Services without a hosted zone annotation
    #[arg(long, env = "HOSTED_ZONE_ID")]
    hosted_zone_id: Option<String>,

    /// Prefix of the TXT ownership marker records
    #[arg(long, env = "TXT_PREFIX", default_value = DEFAULT_MARKER_PREFIX)]
    marker_prefix: String,

    /// Region of the Elastic Load Balancing API
    #[arg(long, env = "ELB_REGION")]
    elb_region: Option<String>,

    /// Seconds between periodic reconciliations of a synced Service
    #[arg(long, env = "REQUEUE_SECS", default_value_t = SUCCESS_REQUEUE_DURATION_SECS)]
    requeue_secs: u64,

    #[arg(long, env = "METRICS_PORT", default_value_t = METRICS_SERVER_PORT)]
    metrics_port: u16,
}

impl Cli {
    fn into_config(self) -> OperatorConfig {
        OperatorConfig {
            default_hosted_zone_id: self.hosted_zone_id.filter(|zone| !zone.is_empty()),
            marker_prefix: self.marker_prefix,
            elb_region: self.elb_region.filter(|region| !region.is_empty()),
            requeue_interval: Duration::from_secs(self.requeue_secs),
            metrics_port: self.metrics_port,
        }
    }
}

fn main() -> Result<()> {
    let config = Cli::parse().into_config();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("external-route53")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

fn init_tracing() {
    // RUST_LOG selects levels, RUST_LOG_FORMAT=json switches to structured output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(config: OperatorConfig) -> Result<()> {
    init_tracing();

    info!("Starting external-route53 controller");
    match config.default_hosted_zone_id.as_deref() {
        Some(zone) => info!(hosted_zone_id = %zone, "Using default hosted zone"),
        None => warn!("No default hosted zone; Services must set one by annotation"),
    }

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;

    debug!("Loading AWS configuration");
    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let providers = Providers::new(
        config.clone(),
        Arc::new(AwsRoute53::new(&sdk_config)),
        Arc::new(AwsLoadBalancers::new(&sdk_config, config.elb_region.clone())),
    );
    let ctx = Arc::new(Context::new(client.clone(), providers));

    info!("Starting all controllers");

    // Controllers should never exit; if one does, the process exits with it
    tokio::select! {
        result = run_service_controller(client.clone(), ctx.clone()) => {
            error!("CRITICAL: Service controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Service controller exited unexpectedly without error")
        }
        result = run_health_check_controller(client.clone(), ctx.clone()) => {
            error!("CRITICAL: HealthCheck controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("HealthCheck controller exited unexpectedly without error")
        }
        result = run_metrics_server(config.metrics_port) => {
            error!("CRITICAL: metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Metrics server exited unexpectedly without error")
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, stopping controllers");
            Ok(())
        }
    }
}

/// Run the Service controller
async fn run_service_controller(client: Client, ctx: Arc<Context>) -> Result<()> {
    info!("Starting Service controller");

    let services = Api::<Service>::all(client.clone());
    let health_checks = Api::<HealthCheck>::all(client);

    // A HealthCheck reporting its id wakes the Service that owns it
    Controller::new(services, Config::default())
        .owns(health_checks, Config::default())
        .run(reconcile_service_wrapper, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Run the `HealthCheck` controller
async fn run_health_check_controller(client: Client, ctx: Arc<Context>) -> Result<()> {
    info!("Starting HealthCheck controller");

    let api = Api::<HealthCheck>::all(client);

    Controller::new(api, Config::default())
        .run(reconcile_health_check_wrapper, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Serve the Prometheus registry over HTTP
async fn run_metrics_server(port: u16) -> Result<()> {
    let app = axum::Router::new().route(
        METRICS_SERVER_PATH,
        axum::routing::get(|| async {
            match metrics::gather_metrics() {
                Ok(body) => (axum::http::StatusCode::OK, body),
                Err(e) => (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    format!("failed to encode metrics: {e}"),
                ),
            }
        }),
    );

    let bind_address = format!("{METRICS_SERVER_BIND_ADDRESS}:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Metrics server listening on http://{bind_address}{METRICS_SERVER_PATH}");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Reconcile wrapper for `Service`
async fn reconcile_service_wrapper(
    service: Arc<Service>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();

    match reconcile_service(ctx, (*service).clone()).await {
        Ok(action) => {
            debug!("Successfully reconciled Service: {}", service.name_any());
            metrics::record_reconciliation_success(KIND_SERVICE, start.elapsed());
            Ok(action)
        }
        Err(e) => {
            error!(
                "Failed to reconcile Service {}/{}: {:#}",
                service.namespace().unwrap_or_default(),
                service.name_any(),
                e
            );
            metrics::record_reconciliation_error(KIND_SERVICE, start.elapsed());
            metrics::record_error(KIND_SERVICE, failure_category(&e));
            Err(e.into())
        }
    }
}

/// Reconcile wrapper for `HealthCheck`
async fn reconcile_health_check_wrapper(
    health_check: Arc<HealthCheck>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();

    match reconcile_health_check(ctx, (*health_check).clone()).await {
        Ok(action) => {
            debug!(
                "Successfully reconciled HealthCheck: {}",
                health_check.name_any()
            );
            metrics::record_reconciliation_success(KIND_HEALTH_CHECK, start.elapsed());
            Ok(action)
        }
        Err(e) => {
            error!(
                "Failed to reconcile HealthCheck {}/{}: {:#}",
                health_check.namespace().unwrap_or_default(),
                health_check.name_any(),
                e
            );
            metrics::record_reconciliation_error(KIND_HEALTH_CHECK, start.elapsed());
            metrics::record_error(KIND_HEALTH_CHECK, failure_category(&e));
            Err(e.into())
        }
    }
}

/// Error policy shared by both controllers
fn error_policy<K>(resource: Arc<K>, err: &ReconcileError, _ctx: Arc<Context>) -> Action
where
    K: kube::Resource<DynamicType = ()>,
{
    let kind = K::kind(&());
    metrics::record_reconciliation_requeue(&kind, failure_reason(&err.0));

    match requeue_after(&err.0) {
        Some(delay) => {
            debug!(
                "Requeueing {} {} in {}s",
                kind,
                resource.name_any(),
                delay.as_secs()
            );
            Action::requeue(delay)
        }
        None => {
            warn!(
                "{} {} is misconfigured, waiting for it to change",
                kind,
                resource.name_any()
            );
            Action::await_change()
        }
    }
}
