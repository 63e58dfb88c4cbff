//! gRPC transport built on `tonic`.
//!
//! # Responsibilities
//! - Open a plaintext HTTP/2 channel to the proxy
//! - Perform the readiness handshake, reconnecting with capped backoff until the deadline
//! - Issue `SendRequest` calls with the configured message-size limits
//! - Publish connectivity transitions on a watch channel
//!
//! # Limitations
//! - Published state only moves with channel activity: the readiness handshake
//!   and `send_request` outcomes. `tonic` reconnects in the background after the
//!   first handshake without reporting it, so an idle channel keeps its last
//!   observed state until the next call.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, OnceCell};
use tokio::time::{self, Instant};
use tonic::codec::{CompressionEncoding, ProstCodec};
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::Code;

use crate::transport::proto::{ProxyRequest, ProxyResponse, SEND_REQUEST_PATH};
use crate::transport::types::{ChannelOptions, ConnectivityState, TransportError, TransportErrorKind};
use crate::transport::{ProxyChannel, ProxyTransport};

const INITIAL_RECONNECT_BACKOFF: Duration = Duration::from_millis(100);

/// Transport that opens `tonic` channels.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrpcTransport;

impl ProxyTransport for GrpcTransport {
    type Channel = GrpcChannel;

    fn open(&self, endpoint: &str, options: &ChannelOptions) -> Result<GrpcChannel, TransportError> {
        let mut builder = Endpoint::from_shared(endpoint.to_string())
            .map_err(|e| TransportError::new(TransportErrorKind::InvalidEndpoint, e.to_string()))?
            .tcp_nodelay(true);

        if options.keepalive_interval_secs > 0 {
            builder = builder
                .http2_keep_alive_interval(Duration::from_secs(options.keepalive_interval_secs))
                .keep_alive_while_idle(true);
        }

        let (state, _) = watch::channel(ConnectivityState::Idle);

        Ok(GrpcChannel {
            inner: Arc::new(Inner {
                endpoint: builder,
                options: options.clone(),
                channel: OnceCell::new(),
                state,
            }),
        })
    }
}

/// A `tonic` channel plus its observed connectivity state.
#[derive(Clone)]
pub struct GrpcChannel {
    inner: Arc<Inner>,
}

struct Inner {
    endpoint: Endpoint,
    options: ChannelOptions,
    /// Set once the first handshake succeeds; `tonic` reconnects it afterwards.
    channel: OnceCell<Channel>,
    state: watch::Sender<ConnectivityState>,
}

impl Inner {
    fn set_state(&self, next: ConnectivityState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    async fn connect_until_ready(&self) -> Channel {
        let max_backoff = Duration::from_millis(self.options.max_reconnect_backoff_ms);
        let mut backoff = INITIAL_RECONNECT_BACKOFF.min(max_backoff);

        loop {
            self.set_state(ConnectivityState::Connecting);
            match self.endpoint.connect().await {
                Ok(channel) => {
                    self.set_state(ConnectivityState::Ready);
                    return channel;
                }
                Err(e) => {
                    tracing::debug!(
                        error = %e,
                        backoff_ms = backoff.as_millis() as u64,
                        "Proxy channel connect failed"
                    );
                    self.set_state(ConnectivityState::TransientFailure);
                    time::sleep(backoff).await;
                    backoff = (backoff * 2).min(max_backoff);
                }
            }
        }
    }
}

#[async_trait]
impl ProxyChannel for GrpcChannel {
    fn connectivity_state(&self) -> ConnectivityState {
        *self.inner.state.borrow()
    }

    async fn watch_state(&self, current: ConnectivityState) -> ConnectivityState {
        let mut rx = self.inner.state.subscribe();
        loop {
            let state = *rx.borrow_and_update();
            if state != current {
                return state;
            }
            if rx.changed().await.is_err() {
                return ConnectivityState::Shutdown;
            }
        }
    }

    async fn wait_for_ready(&self, deadline: Instant) -> Result<(), TransportError> {
        let started = Instant::now();
        let handshake = self
            .inner
            .channel
            .get_or_init(|| self.inner.connect_until_ready());

        match time::timeout_at(deadline, handshake).await {
            Ok(_) => Ok(()),
            Err(_) => Err(TransportError::deadline_exceeded(
                deadline.saturating_duration_since(started),
            )),
        }
    }

    async fn send_request(&self, request: ProxyRequest) -> Result<ProxyResponse, TransportError> {
        let channel = self
            .inner
            .channel
            .get()
            .cloned()
            .ok_or_else(|| TransportError::unavailable("channel has not connected yet"))?;

        let options = &self.inner.options;
        let mut grpc = tonic::client::Grpc::new(channel)
            .max_decoding_message_size(options.max_receive_message_bytes)
            .max_encoding_message_size(options.max_send_message_bytes)
            .accept_compressed(CompressionEncoding::Gzip);
        if options.gzip {
            grpc = grpc.send_compressed(CompressionEncoding::Gzip);
        }

        if let Err(e) = grpc.ready().await {
            self.inner.set_state(ConnectivityState::TransientFailure);
            return Err(TransportError::unavailable(format!("service was not ready: {}", e)));
        }

        let codec = ProstCodec::<ProxyRequest, ProxyResponse>::default();
        let path = PathAndQuery::from_static(SEND_REQUEST_PATH);

        match grpc.unary(tonic::Request::new(request), path, codec).await {
            Ok(response) => {
                self.inner.set_state(ConnectivityState::Ready);
                Ok(response.into_inner())
            }
            Err(status) => {
                let error = status_to_error(&status);
                if error.is_connection_failure() {
                    self.inner.set_state(ConnectivityState::TransientFailure);
                }
                Err(error)
            }
        }
    }
}

impl std::fmt::Debug for GrpcChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrpcChannel")
            .field("endpoint", self.inner.endpoint.uri())
            .field("state", &self.connectivity_state())
            .finish()
    }
}

fn status_to_error(status: &tonic::Status) -> TransportError {
    let kind = match status.code() {
        Code::Unavailable => TransportErrorKind::Unavailable,
        Code::DeadlineExceeded => TransportErrorKind::DeadlineExceeded,
        Code::Cancelled => TransportErrorKind::Cancelled,
        code => TransportErrorKind::Rpc(i32::from(code)),
    };
    TransportError::new(kind, status.message())
}
