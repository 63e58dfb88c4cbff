//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the forward proxy client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Where the forward proxy listens.
    pub proxy: ProxyEndpointConfig,

    /// Request admission and connection settings.
    pub client: RequestConfig,

    /// Backoff applied between retries.
    pub retry: RetryConfig,

    /// Channel options handed to the transport.
    pub channel: ChannelConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Forward proxy endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyEndpointConfig {
    /// gRPC endpoint (e.g., "http://127.0.0.1:8082").
    pub endpoint: String,
}

impl Default for ProxyEndpointConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8082".to_string(),
        }
    }
}

/// Request admission and connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Maximum concurrent in-flight requests.
    pub semaphore: usize,

    /// Retries allowed per request after a connection failure (0 = none).
    pub max_retries: u32,

    /// How long the first connection may take to become ready, in milliseconds.
    pub client_timeout_ms: u64,
}

impl RequestConfig {
    pub fn client_timeout(&self) -> Duration {
        Duration::from_millis(self.client_timeout_ms)
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            semaphore: 1000,
            max_retries: 0,
            client_timeout_ms: 5000,
        }
    }
}

/// Linear backoff configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay added per retry in milliseconds.
    pub backoff_step_ms: u64,

    /// Upper bound of a single delay in milliseconds.
    pub backoff_cap_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff_step_ms: 250,
            backoff_cap_ms: 10_000,
        }
    }
}

/// Channel configuration passed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Largest response message accepted, in bytes.
    pub max_receive_message_bytes: usize,

    /// Largest request message sent, in bytes.
    pub max_send_message_bytes: usize,

    /// Ceiling for the reconnect backoff during the readiness wait.
    pub max_reconnect_backoff_ms: u64,

    /// Compress request messages with gzip.
    pub gzip: bool,

    /// HTTP/2 keepalive ping interval in seconds (0 disables).
    pub keepalive_interval_secs: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_receive_message_bytes: usize::MAX,
            max_send_message_bytes: usize::MAX,
            max_reconnect_backoff_ms: 1000,
            gzip: false,
            keepalive_interval_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error, off).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.client.semaphore, 1000);
        assert_eq!(config.client.max_retries, 0);
        assert_eq!(config.client.client_timeout(), Duration::from_secs(5));
        assert_eq!(config.retry.backoff_step_ms, 250);
        assert_eq!(config.retry.backoff_cap_ms, 10_000);
        assert_eq!(config.channel.max_reconnect_backoff_ms, 1000);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [client]
            max_retries = 3

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.client.max_retries, 3);
        assert_eq!(config.client.semaphore, 1000);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.proxy.endpoint, "http://127.0.0.1:8082");
    }
}
