//! Transport subsystem: the RPC channel the client talks through.
//!
//! # Data Flow
//! ```text
//! ProxyTransport::open(endpoint, options)   (no I/O, lazy channel)
//!     → ProxyChannel::wait_for_ready(deadline)   (handshake, reconnect with capped backoff)
//!     → ProxyChannel::send_request(ProxyRequest) (one unary call)
//!     ← ProxyResponse envelope | TransportError
//! ```
//!
//! # Design Decisions
//! - Reconnection after the first handshake belongs to the transport, not the client
//! - Cancelling a call is dropping its future
//! - Connectivity state is observable for diagnostics only

pub mod grpc;
pub mod proto;
pub mod types;

use async_trait::async_trait;
use tokio::time::Instant;

pub use grpc::{GrpcChannel, GrpcTransport};
pub use proto::{ProxyRequest, ProxyResponse};
pub use types::{ChannelOptions, ConnectivityState, TransportError, TransportErrorKind};

/// Factory for proxy channels.
pub trait ProxyTransport: Send + Sync + 'static {
    type Channel: ProxyChannel;

    /// Create a channel to `endpoint`. Must not perform I/O.
    fn open(&self, endpoint: &str, options: &ChannelOptions) -> Result<Self::Channel, TransportError>;
}

/// A single logical channel to the forward proxy.
#[async_trait]
pub trait ProxyChannel: Clone + Send + Sync + 'static {
    /// Current connectivity state.
    fn connectivity_state(&self) -> ConnectivityState;

    /// Resolve once the state differs from `current`, returning the new state.
    async fn watch_state(&self, current: ConnectivityState) -> ConnectivityState;

    /// Wait until the channel is `Ready` or `deadline` passes.
    async fn wait_for_ready(&self, deadline: Instant) -> Result<(), TransportError>;

    /// Issue one `SendRequest` call and wait for its response.
    async fn send_request(&self, request: ProxyRequest) -> Result<ProxyResponse, TransportError>;
}
