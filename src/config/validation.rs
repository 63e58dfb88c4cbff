//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, backoff step within cap)
//! - Validate the proxy endpoint and metrics address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ClientConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("client.semaphore must be at least 1")]
    ZeroConcurrency,

    #[error("client.client_timeout_ms must be at least 1")]
    ZeroClientTimeout,

    #[error("retry.backoff_step_ms ({step}) exceeds retry.backoff_cap_ms ({cap})")]
    BackoffStepAboveCap { step: u64, cap: u64 },

    #[error("proxy.endpoint '{endpoint}' is invalid: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("channel.{field} must be at least 1")]
    ZeroMessageSize { field: &'static str },

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a parsed configuration, collecting every violation.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.client.semaphore == 0 {
        errors.push(ValidationError::ZeroConcurrency);
    }

    if config.client.client_timeout_ms == 0 {
        errors.push(ValidationError::ZeroClientTimeout);
    }

    if config.retry.backoff_step_ms > config.retry.backoff_cap_ms {
        errors.push(ValidationError::BackoffStepAboveCap {
            step: config.retry.backoff_step_ms,
            cap: config.retry.backoff_cap_ms,
        });
    }

    if let Err(reason) = check_endpoint(&config.proxy.endpoint) {
        errors.push(ValidationError::InvalidEndpoint {
            endpoint: config.proxy.endpoint.clone(),
            reason,
        });
    }

    if config.channel.max_receive_message_bytes == 0 {
        errors.push(ValidationError::ZeroMessageSize {
            field: "max_receive_message_bytes",
        });
    }
    if config.channel.max_send_message_bytes == 0 {
        errors.push(ValidationError::ZeroMessageSize {
            field: "max_send_message_bytes",
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_endpoint(endpoint: &str) -> Result<(), String> {
    let url = url::Url::parse(endpoint).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ClientConfig::default();
        config.client.semaphore = 0;
        config.retry.backoff_step_ms = 20_000;
        config.proxy.endpoint = "grpc://proxy:8082".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::ZeroConcurrency));
        assert!(errors.contains(&ValidationError::BackoffStepAboveCap {
            step: 20_000,
            cap: 10_000
        }));
        assert!(errors[2].to_string().contains("unsupported scheme 'grpc'"));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = ClientConfig::default();
        config.observability.metrics_address = "nowhere".to_string();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidMetricsAddress("nowhere".to_string())]
        );
    }
}
