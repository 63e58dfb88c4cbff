//! Retry logic.
//!
//! # Responsibilities
//! - Determine if a failure is retryable (connection failures only)
//! - Compute the linear backoff before each retry
//! - Enforce the per-request retry budget (`max_retries`)

use std::time::Duration;

use crate::client::types::ProxyError;
use crate::config::{RequestConfig, RetryConfig};
use crate::resilience::backoff::calculate_backoff;

/// Whether a failed attempt may be retried.
///
/// Only a proxy that could not be reached is retried. Error envelopes,
/// cancellations, readiness timeouts and other RPC failures are terminal.
pub fn is_retryable(error: &ProxyError) -> bool {
    matches!(error, ProxyError::Connection(_))
}

/// Retry budget and backoff shape for one manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub step_ms: u64,
    pub cap_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, step_ms: u64, cap_ms: u64) -> Self {
        Self {
            max_retries,
            step_ms,
            cap_ms,
        }
    }

    pub fn from_config(client: &RequestConfig, retry: &RetryConfig) -> Self {
        Self::new(client.max_retries, retry.backoff_step_ms, retry.backoff_cap_ms)
    }

    /// Decide what follows the failure of an attempt.
    ///
    /// `retries` is the number of retries already taken. Returns the delay to
    /// wait before the next attempt, or `None` when the error must surface.
    pub fn next_delay(&self, retries: u32, error: &ProxyError) -> Option<Duration> {
        if !is_retryable(error) {
            return None;
        }
        let retry = retries.saturating_add(1);
        if retry > self.max_retries {
            return None;
        }
        Some(calculate_backoff(retry, self.step_ms, self.cap_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RequestConfig::default(), &RetryConfig::default())
    }
}
