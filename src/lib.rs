//! Client for a gRPC forward proxy.
//!
//! One [`ForwardProxyManager`] owns one lazily established channel to the
//! proxy, bounds in-flight requests with an admission gate, retries
//! connection failures with linear backoff and lets each request be
//! cancelled on its own.

pub mod client;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod transport;

pub use client::{
    FetchResponse, ForwardProxyManager, ProxiedResponse, ProxyError, ProxyResult, RemoteErrorKind,
    RequestOptions,
};
pub use config::ClientConfig;
pub use observability::ProxyEvent;
pub use tokio_util::sync::CancellationToken;
