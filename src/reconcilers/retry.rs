// Copyright (c) 2025 The external-route53 Authors
// SPDX-License-Identifier: MIT

//! Retry logic with exponential backoff.
//!
//! Two uses:
//! - retrying transient Kubernetes API errors (429, 5xx) while failing fast on
//!   permanent ones
//! - waiting, with a bounded budget, for a `HealthCheck` to report its Route 53 id

use anyhow::{anyhow, Result};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Maximum total time to spend retrying (5 minutes)
const MAX_ELAPSED_TIME_SECS: u64 = 300;

/// Initial retry interval (100ms)
const INITIAL_INTERVAL_MILLIS: u64 = 100;

/// Maximum interval between retries (30 seconds)
const MAX_INTERVAL_SECS: u64 = 30;

/// Backoff multiplier (exponential growth factor)
const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Randomization factor to prevent thundering herd (±10%)
const RANDOMIZATION_FACTOR: f64 = 0.1;

/// First poll delay while waiting for a health check id (500ms)
const HEALTH_CHECK_INITIAL_INTERVAL_MILLIS: u64 = 500;

/// Longest delay between health check id polls (10 seconds)
const HEALTH_CHECK_MAX_INTERVAL_SECS: u64 = 10;

/// Budget for a single wait on a health check id (2 minutes)
const HEALTH_CHECK_MAX_ELAPSED_TIME_SECS: u64 = 120;

/// Simple exponential backoff implementation.
///
/// Provides exponential backoff with randomization (jitter) to prevent thundering herd.
pub struct ExponentialBackoff {
    /// Current interval duration
    pub current_interval: Duration,
    /// Initial interval duration
    pub initial_interval: Duration,
    /// Maximum interval duration
    pub max_interval: Duration,
    /// Maximum total elapsed time
    pub max_elapsed_time: Option<Duration>,
    /// Backoff multiplier (typically 2.0 for doubling)
    pub multiplier: f64,
    /// Randomization factor (e.g., 0.1 for ±10%)
    pub randomization_factor: f64,
    start_time: Instant,
}

impl ExponentialBackoff {
    fn new(
        initial_interval: Duration,
        max_interval: Duration,
        max_elapsed_time: Option<Duration>,
        multiplier: f64,
        randomization_factor: f64,
    ) -> Self {
        Self {
            current_interval: initial_interval,
            initial_interval,
            max_interval,
            max_elapsed_time,
            multiplier,
            randomization_factor,
            start_time: Instant::now(),
        }
    }

    /// Get the next backoff interval, or None if max elapsed time exceeded.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if let Some(max_elapsed) = self.max_elapsed_time {
            if self.start_time.elapsed() >= max_elapsed {
                return None;
            }
        }

        let interval = self.current_interval;
        let jittered = self.apply_jitter(interval);

        let next = interval.as_secs_f64() * self.multiplier;
        self.current_interval = Duration::from_secs_f64(next).min(self.max_interval);

        Some(jittered)
    }

    fn apply_jitter(&self, interval: Duration) -> Duration {
        if self.randomization_factor == 0.0 {
            return interval;
        }

        let secs = interval.as_secs_f64();
        let delta = secs * self.randomization_factor;
        let jittered = rand::random_range((secs - delta)..=(secs + delta));

        Duration::from_secs_f64(jittered.max(0.0))
    }
}

/// Backoff for Kubernetes API retries.
///
/// 100ms doubling to a 30s cap, ±10% jitter, 5 minutes in total.
#[must_use]
pub fn default_backoff() -> ExponentialBackoff {
    ExponentialBackoff::new(
        Duration::from_millis(INITIAL_INTERVAL_MILLIS),
        Duration::from_secs(MAX_INTERVAL_SECS),
        Some(Duration::from_secs(MAX_ELAPSED_TIME_SECS)),
        BACKOFF_MULTIPLIER,
        RANDOMIZATION_FACTOR,
    )
}

/// Backoff for polling a `HealthCheck` until it reports a Route 53 id.
///
/// 500ms doubling to a 10s cap, ±10% jitter, 2 minutes in total. When the budget
/// runs out the reconcile fails and the controller requeues it.
#[must_use]
pub fn health_check_backoff() -> ExponentialBackoff {
    ExponentialBackoff::new(
        Duration::from_millis(HEALTH_CHECK_INITIAL_INTERVAL_MILLIS),
        Duration::from_secs(HEALTH_CHECK_MAX_INTERVAL_SECS),
        Some(Duration::from_secs(HEALTH_CHECK_MAX_ELAPSED_TIME_SECS)),
        BACKOFF_MULTIPLIER,
        RANDOMIZATION_FACTOR,
    )
}

/// Retry a Kubernetes API call with exponential backoff.
///
/// Retries HTTP 429, 5xx and connection errors; any other error is returned at once.
///
/// # Errors
///
/// Returns the first non-retryable error, or an error once the backoff is exhausted.
pub async fn retry_api_call<T, F, Fut>(mut operation: F, operation_name: &str) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, kube::Error>>,
{
    let mut backoff = default_backoff();
    let start_time = Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt,
                        elapsed = ?start_time.elapsed(),
                        "Kubernetes API call succeeded after retries"
                    );
                }
                return Ok(value);
            }
            Err(e) if !is_retryable_error(&e) => {
                error!(
                    operation = operation_name,
                    error = %e,
                    "Non-retryable Kubernetes API error, failing immediately"
                );
                return Err(e.into());
            }
            Err(e) => {
                if let Some(duration) = backoff.next_backoff() {
                    warn!(
                        operation = operation_name,
                        attempt,
                        retry_after = ?duration,
                        error = %e,
                        "Retryable Kubernetes API error, will retry"
                    );
                    tokio::time::sleep(duration).await;
                } else {
                    error!(
                        operation = operation_name,
                        attempt,
                        elapsed = ?start_time.elapsed(),
                        error = %e,
                        "Backoff exhausted, giving up"
                    );
                    return Err(anyhow!("Backoff exhausted after {attempt} attempts: {e}"));
                }
            }
        }
    }
}

/// Poll `check` until it yields a value, sleeping per `backoff` between polls.
///
/// # Errors
///
/// Returns the error from `check`, or an error once the backoff is exhausted.
pub async fn wait_for<T, F, Fut>(
    mut backoff: ExponentialBackoff,
    mut check: F,
    description: &str,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    let start_time = Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;
        if let Some(value) = check().await? {
            debug!(waiting_for = description, attempt, elapsed = ?start_time.elapsed(), "Wait finished");
            return Ok(value);
        }

        let Some(duration) = backoff.next_backoff() else {
            return Err(anyhow!(
                "timed out waiting for {description} after {attempt} attempts ({:?})",
                start_time.elapsed()
            ));
        };
        debug!(waiting_for = description, attempt, retry_after = ?duration, "Still waiting");
        tokio::time::sleep(duration).await;
    }
}

/// Determine if a Kubernetes error is retryable.
///
/// HTTP 429, 5xx and service (connection) errors are transient; everything else is not.
fn is_retryable_error(err: &kube::Error) -> bool {
    match err {
        kube::Error::Api(api_err) => {
            api_err.code == 429 || (api_err.code >= 500 && api_err.code < 600)
        }
        kube::Error::Service(_) => true,
        _ => false,
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
