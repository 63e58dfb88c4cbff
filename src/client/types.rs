//! Request options, outcomes and error definitions.

use bytes::Bytes;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::transport::proto::proxy_response_error::ErrorType;
use crate::transport::TransportError;

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Scheduling hint forwarded to the proxy.
    pub priority: Option<i64>,
    /// Upstream status codes the proxy should retry on before answering.
    pub retry_on_codes: Vec<u16>,
    /// Cancels this request only; the shared connection is unaffected.
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn retry_on_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retry_on_codes = codes.into_iter().collect();
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }
}

/// Response relayed by the proxy for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxiedResponse {
    pub body: Bytes,
    pub status_code: u16,
    pub headers: HashMap<String, String>,
}

/// Failure kind declared by the proxy in an error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    ProxyError,
    InvalidUrl,
    RemoteHostTimedOut,
    RemoteHostUnreachable,
    /// A value this client does not know about.
    Unknown(i32),
}

impl RemoteErrorKind {
    pub fn from_wire(value: i32) -> Self {
        match ErrorType::try_from(value) {
            Ok(ErrorType::ProxyError) => RemoteErrorKind::ProxyError,
            Ok(ErrorType::InvalidUrl) => RemoteErrorKind::InvalidUrl,
            Ok(ErrorType::RemoteHostTimedOut) => RemoteErrorKind::RemoteHostTimedOut,
            Ok(ErrorType::RemoteHostUnreachable) => RemoteErrorKind::RemoteHostUnreachable,
            Err(_) => RemoteErrorKind::Unknown(value),
        }
    }
}

impl fmt::Display for RemoteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteErrorKind::ProxyError => f.write_str(ErrorType::ProxyError.as_str_name()),
            RemoteErrorKind::InvalidUrl => f.write_str(ErrorType::InvalidUrl.as_str_name()),
            RemoteErrorKind::RemoteHostTimedOut => {
                f.write_str(ErrorType::RemoteHostTimedOut.as_str_name())
            }
            RemoteErrorKind::RemoteHostUnreachable => {
                f.write_str(ErrorType::RemoteHostUnreachable.as_str_name())
            }
            RemoteErrorKind::Unknown(value) => write!(f, "UNKNOWN({})", value),
        }
    }
}

/// Errors surfaced by the proxy client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProxyError {
    /// The first connection did not become ready in time.
    #[error("proxy at {endpoint} not ready within {timeout_ms} ms")]
    ConnectTimeout { endpoint: String, timeout_ms: u64 },

    /// The proxy could not be reached; eligible for retry.
    #[error("connection to proxy failed: {0}")]
    Connection(String),

    /// The proxy answered with an error envelope.
    #[error("request failed: {kind}")]
    Remote { kind: RemoteErrorKind },

    /// The proxy answered with neither a success nor an error envelope.
    #[error("no response")]
    NoResponse,

    /// The request's cancellation token fired.
    #[error("request aborted")]
    Cancelled,

    /// The upstream answered with a status other than 200.
    #[error("failed to download {url}, status code {status}")]
    Status { url: String, status: u16 },

    /// Any other transport failure.
    #[error("transport error: {0}")]
    Transport(TransportError),

    /// The body could not be decoded as requested.
    #[error("failed to decode response body: {0}")]
    Decode(String),
}

impl From<TransportError> for ProxyError {
    fn from(error: TransportError) -> Self {
        if error.is_connection_failure() {
            ProxyError::Connection(error.message)
        } else {
            ProxyError::Transport(error)
        }
    }
}

impl ProxyError {
    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ProxyError::ConnectTimeout { .. } => "connect_timeout",
            ProxyError::Connection(_) => "connection",
            ProxyError::Remote { .. } => "remote",
            ProxyError::NoResponse => "no_response",
            ProxyError::Cancelled => "cancelled",
            ProxyError::Status { .. } => "status",
            ProxyError::Transport(_) => "transport",
            ProxyError::Decode(_) => "decode",
        }
    }
}

/// Result type for proxy client operations.
pub type ProxyResult<T> = Result<T, ProxyError>;
