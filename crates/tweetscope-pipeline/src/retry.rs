//! Retry with exponential back-off and jitter for model endpoint calls.
//!
//! Hosted inference endpoints answer `503` while a model is loading and `429`
//! when rate limited; both clear up on their own, so they are retried along
//! with network failures. Anything else is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::{ClusteringError, LabelError};

const MAX_DELAY_MS: u64 = 30_000;

/// How many extra attempts to make and how long to wait before the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 0,
        }
    }
}

/// Errors that can tell whether a later attempt might succeed.
pub(crate) trait Transient {
    fn is_transient(&self) -> bool;
}

fn transient_http(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.status().is_some_and(transient_status_code)
}

fn transient_status_code(status: reqwest::StatusCode) -> bool {
    status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
}

fn transient_status(status: u16) -> bool {
    reqwest::StatusCode::from_u16(status).is_ok_and(transient_status_code)
}

impl Transient for LabelError {
    fn is_transient(&self) -> bool {
        match self {
            LabelError::Http(e) => transient_http(e),
            LabelError::Status { status, .. } => transient_status(*status),
            LabelError::Timeout(_)
            | LabelError::MalformedResponse(_)
            | LabelError::UnknownLabel(_)
            | LabelError::NotNormalized => false,
        }
    }
}

impl Transient for ClusteringError {
    fn is_transient(&self) -> bool {
        match self {
            ClusteringError::Http(e) => transient_http(e),
            ClusteringError::Status { status, .. } => transient_status(*status),
            ClusteringError::CorpusTooSmall { .. }
            | ClusteringError::Timeout(_)
            | ClusteringError::MalformedResponse(_)
            | ClusteringError::Artifact { .. }
            | ClusteringError::NotNormalized { .. } => false,
        }
    }
}

/// Runs `operation` with up to `policy.max_retries` additional attempts on transient errors.
///
/// The delay doubles each attempt from `backoff_base_ms`, with ±25 % jitter,
/// capped at 30 s.
pub(crate) async fn retry_with_backoff<T, E, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    E: Transient + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_transient() || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = policy
                    .backoff_base_ms
                    .saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms,
                    error = %err,
                    "transient model endpoint error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
