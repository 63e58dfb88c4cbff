//! Channel-level types shared by every transport implementation.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub use crate::config::schema::ChannelConfig as ChannelOptions;

/// Connectivity state of a proxy channel, as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectivityState {
    /// Channel created, no connection attempted yet.
    Idle,
    /// A connection attempt is in progress.
    Connecting,
    /// The channel can carry calls.
    Ready,
    /// The last connection attempt failed; the transport will try again.
    TransientFailure,
    /// The channel is closed for good.
    Shutdown,
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectivityState::Idle => "IDLE",
            ConnectivityState::Connecting => "CONNECTING",
            ConnectivityState::Ready => "READY",
            ConnectivityState::TransientFailure => "TRANSIENT_FAILURE",
            ConnectivityState::Shutdown => "SHUTDOWN",
        };
        f.write_str(name)
    }
}

/// Coarse classification of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The proxy could not be reached (connection refused, reset, not yet connected).
    Unavailable,
    /// A deadline elapsed before the operation completed.
    DeadlineExceeded,
    /// The call was cancelled by either side.
    Cancelled,
    /// The endpoint URI was rejected before any I/O.
    InvalidEndpoint,
    /// Any other RPC status, carrying its numeric code.
    Rpc(i32),
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Unavailable => f.write_str("unavailable"),
            TransportErrorKind::DeadlineExceeded => f.write_str("deadline exceeded"),
            TransportErrorKind::Cancelled => f.write_str("cancelled"),
            TransportErrorKind::InvalidEndpoint => f.write_str("invalid endpoint"),
            TransportErrorKind::Rpc(code) => write!(f, "rpc status {}", code),
        }
    }
}

/// Error returned by a transport operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Unavailable, message)
    }

    pub fn deadline_exceeded(after: Duration) -> Self {
        Self::new(
            TransportErrorKind::DeadlineExceeded,
            format!("channel not ready after {} ms", after.as_millis()),
        )
    }

    /// True when the failure means the proxy itself could not be reached.
    pub fn is_connection_failure(&self) -> bool {
        self.kind == TransportErrorKind::Unavailable
    }
}
