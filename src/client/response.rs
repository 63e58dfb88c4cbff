//! Body accessors for successful fetches.

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::client::types::{ProxiedResponse, ProxyError, ProxyResult};

/// A fetch that came back with status 200.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    body: Bytes,
}

impl FetchResponse {
    /// Accept `response` only when the upstream answered 200.
    pub fn from_proxied(url: &str, response: ProxiedResponse) -> ProxyResult<Self> {
        if response.status_code != 200 {
            return Err(ProxyError::Status {
                url: url.to_string(),
                status: response.status_code,
            });
        }
        Ok(Self {
            body: response.body,
        })
    }

    /// Body decoded as UTF-8; invalid sequences become U+FFFD.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> ProxyResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| ProxyError::Decode(e.to_string()))
    }

    pub fn bytes(&self) -> Bytes {
        self.body.clone()
    }

    pub fn into_bytes(self) -> Bytes {
        self.body
    }
}
