//! Wire messages of the `proxy.Proxy` gRPC service.
//!
//! ```text
//! service Proxy { rpc SendRequest(ProxyRequest) returns (ProxyResponse); }
//! ```
//!
//! The messages are derived by hand with `prost` so the crate builds without
//! `protoc`. Field tags must stay in sync with the proxy server.

use std::collections::HashMap;

/// Fully-qualified path of the unary `SendRequest` method.
pub const SEND_REQUEST_PATH: &str = "/proxy.Proxy/SendRequest";

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProxyRequest {
    #[prost(string, tag = "1")]
    pub url: String,
    #[prost(int64, optional, tag = "2")]
    pub priority: Option<i64>,
    #[prost(int32, repeated, tag = "3")]
    pub retry_on_codes: Vec<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProxyResponse {
    #[prost(oneof = "proxy_response::Response", tags = "1, 2")]
    pub response: Option<proxy_response::Response>,
}

pub mod proxy_response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Response {
        #[prost(message, tag = "1")]
        Success(super::ProxyResponseSuccess),
        #[prost(message, tag = "2")]
        Error(super::ProxyResponseError),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProxyResponseSuccess {
    #[prost(bytes = "bytes", tag = "1")]
    pub body: ::prost::bytes::Bytes,
    #[prost(int32, tag = "2")]
    pub status: i32,
    #[prost(map = "string, string", tag = "3")]
    pub headers: HashMap<String, String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProxyResponseError {
    #[prost(enumeration = "proxy_response_error::ErrorType", tag = "1")]
    pub error_type: i32,
}

pub mod proxy_response_error {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum ErrorType {
        ProxyError = 0,
        InvalidUrl = 1,
        RemoteHostTimedOut = 2,
        RemoteHostUnreachable = 3,
    }

    impl ErrorType {
        /// Name of the variant as declared in the service definition.
        pub fn as_str_name(&self) -> &'static str {
            match self {
                ErrorType::ProxyError => "PROXY_ERROR",
                ErrorType::InvalidUrl => "INVALID_URL",
                ErrorType::RemoteHostTimedOut => "REMOTE_HOST_TIMED_OUT",
                ErrorType::RemoteHostUnreachable => "REMOTE_HOST_UNREACHABLE",
            }
        }
    }
}

impl ProxyResponse {
    /// Build a success envelope.
    pub fn success(status: i32, body: impl Into<::prost::bytes::Bytes>) -> Self {
        Self {
            response: Some(proxy_response::Response::Success(ProxyResponseSuccess {
                body: body.into(),
                status,
                headers: HashMap::new(),
            })),
        }
    }

    /// Build an error envelope.
    pub fn error(error_type: proxy_response_error::ErrorType) -> Self {
        Self {
            response: Some(proxy_response::Response::Error(ProxyResponseError {
                error_type: error_type as i32,
            })),
        }
    }
}
