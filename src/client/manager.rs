//! Forward proxy manager: the public request API.
//!
//! # Request Flow
//! ```text
//! fetch(url)
//!     → request(url)                     (span with request id, metrics)
//!         loop:
//!             → AdmissionGate::acquire   (slot held for this attempt only)
//!             → ConnectionHolder::ensure_connected
//!             → dispatch                 (one RPC, raced against cancellation)
//!             → slot released
//!             → RetryPolicy::next_delay  (connection failures only) → backoff sleep
//!     → FetchResponse::from_proxied      (status must be 200)
//! ```

use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::client::admission::AdmissionGate;
use crate::client::connection::ConnectionHolder;
use crate::client::dispatch::dispatch;
use crate::client::response::FetchResponse;
use crate::client::types::{ProxiedResponse, ProxyError, ProxyResult, RequestOptions};
use crate::config::ClientConfig;
use crate::observability::{metrics, EventBus, ProxyEvent};
use crate::resilience::RetryPolicy;
use crate::transport::{ConnectivityState, GrpcTransport, ProxyTransport};

/// Client for a single forward proxy, shared by any number of concurrent requests.
pub struct ForwardProxyManager<T: ProxyTransport = GrpcTransport> {
    connection: ConnectionHolder<T>,
    gate: AdmissionGate,
    policy: RetryPolicy,
    events: EventBus,
}

impl ForwardProxyManager<GrpcTransport> {
    /// Create a manager talking gRPC to `config.proxy.endpoint`.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(GrpcTransport, config)
    }
}

impl<T: ProxyTransport> ForwardProxyManager<T> {
    /// Create a manager over a custom transport.
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        let events = EventBus::new();
        let connection = ConnectionHolder::new(
            transport,
            config.proxy.endpoint.clone(),
            config.channel.clone(),
            config.client.client_timeout(),
            events.clone(),
        );

        tracing::debug!(
            endpoint = %config.proxy.endpoint,
            semaphore = config.client.semaphore,
            max_retries = config.client.max_retries,
            client_timeout_ms = config.client.client_timeout_ms,
            "Forward proxy manager created"
        );

        Self {
            connection,
            gate: AdmissionGate::new(config.client.semaphore),
            policy: RetryPolicy::from_config(&config.client, &config.retry),
            events,
        }
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<ProxyEvent> {
        self.events.subscribe()
    }

    /// Establish the shared connection without sending a request.
    pub async fn connect(&self) -> ProxyResult<T::Channel> {
        self.connection.ensure_connected().await
    }

    /// Send `url` through the proxy, returning whatever status the upstream answered.
    pub async fn request(&self, url: &str, options: RequestOptions) -> ProxyResult<ProxiedResponse> {
        let span = tracing::info_span!("proxy_request", request_id = %Uuid::new_v4(), url = %url);
        let start = Instant::now();

        let result = self.request_with_retries(url, &options).instrument(span).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.label(),
        };
        metrics::record_request(outcome, start);
        result
    }

    /// Like [`request`](Self::request), but any status other than 200 is an error.
    pub async fn fetch(&self, url: &str, options: RequestOptions) -> ProxyResult<FetchResponse> {
        let response = self.request(url, options).await?;
        FetchResponse::from_proxied(url, response)
    }

    pub async fn fetch_text(&self, url: &str, options: RequestOptions) -> ProxyResult<String> {
        Ok(self.fetch(url, options).await?.text())
    }

    pub async fn fetch_json<D: DeserializeOwned>(&self, url: &str, options: RequestOptions) -> ProxyResult<D> {
        self.fetch(url, options).await?.json()
    }

    pub async fn fetch_bytes(&self, url: &str, options: RequestOptions) -> ProxyResult<Bytes> {
        Ok(self.fetch(url, options).await?.into_bytes())
    }

    /// Connectivity state of the shared channel, once connected.
    pub fn connectivity_state(&self) -> Option<ConnectivityState> {
        self.connection.connectivity_state()
    }

    pub fn available_slots(&self) -> usize {
        self.gate.available()
    }

    pub fn in_flight(&self) -> usize {
        self.gate.in_flight()
    }

    pub fn endpoint(&self) -> &str {
        self.connection.endpoint()
    }

    async fn request_with_retries(&self, url: &str, options: &RequestOptions) -> ProxyResult<ProxiedResponse> {
        let mut retries = 0u32;

        loop {
            let error = match self.attempt(url, options).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            let Some(delay) = self.policy.next_delay(retries, &error) else {
                return Err(error);
            };
            retries += 1;

            self.events.emit(ProxyEvent::Retry(url.to_string()));
            metrics::record_retry();
            tracing::error!(
                retry = retries,
                max_retries = self.policy.max_retries,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Failed to download, retrying"
            );

            self.sleep(delay, options.cancel.as_ref()).await?;
        }
    }

    /// One dispatch attempt; the admission slot is released when this returns.
    async fn attempt(&self, url: &str, options: &RequestOptions) -> ProxyResult<ProxiedResponse> {
        let cancel = options.cancel.as_ref();

        let _slot = cancellable(cancel, self.gate.acquire()).await?;

        self.events.emit(ProxyEvent::Download(url.to_string()));
        tracing::debug!(in_flight = self.gate.in_flight(), "Downloading");

        let channel = cancellable(cancel, self.connection.ensure_connected()).await??;
        dispatch(&channel, url, options).await
    }

    async fn sleep(&self, delay: Duration, cancel: Option<&CancellationToken>) -> ProxyResult<()> {
        cancellable(cancel, tokio::time::sleep(delay)).await
    }
}

/// Run `fut` unless `cancel` fires first.
async fn cancellable<F: Future>(cancel: Option<&CancellationToken>, fut: F) -> ProxyResult<F::Output> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(ProxyError::Cancelled),
            output = fut => Ok(output),
        },
        None => Ok(fut.await),
    }
}

impl<T: ProxyTransport> std::fmt::Debug for ForwardProxyManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForwardProxyManager")
            .field("endpoint", &self.endpoint())
            .field("capacity", &self.gate.capacity())
            .field("in_flight", &self.gate.in_flight())
            .field("policy", &self.policy)
            .finish()
    }
}
