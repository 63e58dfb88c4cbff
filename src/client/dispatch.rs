//! Single proxied request.
//!
//! # Responsibilities
//! - Build the wire request from URL and options
//! - Race the call against the request's cancellation token
//! - Translate the response envelope into an outcome or a typed error

use crate::client::types::{ProxiedResponse, ProxyError, ProxyResult, RemoteErrorKind, RequestOptions};
use crate::transport::proto::proxy_response::Response;
use crate::transport::{ProxyChannel, ProxyRequest, ProxyResponse};

/// Issue one request over `channel` and wait for its outcome.
///
/// When the cancellation token fires first, the call future is dropped,
/// which cancels the RPC, and `ProxyError::Cancelled` is returned.
pub async fn dispatch<C: ProxyChannel>(
    channel: &C,
    url: &str,
    options: &RequestOptions,
) -> ProxyResult<ProxiedResponse> {
    if options.is_cancelled() {
        return Err(ProxyError::Cancelled);
    }
    let request = build_request(url, options);

    let result = match &options.cancel {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!(url = %url, "Request aborted");
                    return Err(ProxyError::Cancelled);
                }
                result = channel.send_request(request) => result,
            }
        }
        None => channel.send_request(request).await,
    };

    translate(result?)
}

pub(crate) fn build_request(url: &str, options: &RequestOptions) -> ProxyRequest {
    ProxyRequest {
        url: url.to_string(),
        priority: options.priority,
        retry_on_codes: options.retry_on_codes.iter().map(|&code| i32::from(code)).collect(),
    }
}

/// Map a response envelope to an outcome.
pub(crate) fn translate(response: ProxyResponse) -> ProxyResult<ProxiedResponse> {
    match response.response {
        Some(Response::Success(success)) => {
            let status_code = u16::try_from(success.status).map_err(|_| ProxyError::NoResponse)?;
            Ok(ProxiedResponse {
                body: success.body,
                status_code,
                headers: success.headers,
            })
        }
        Some(Response::Error(error)) => Err(ProxyError::Remote {
            kind: RemoteErrorKind::from_wire(error.error_type),
        }),
        None => Err(ProxyError::NoResponse),
    }
}
