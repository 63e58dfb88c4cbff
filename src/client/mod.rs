//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! ForwardProxyManager::request
//!     → admission.rs  (bound in-flight requests)
//!     → connection.rs (one shared, lazily established channel)
//!     → dispatch.rs   (one RPC, envelope → outcome, cancellation)
//!     → resilience    (retry connection failures with linear backoff)
//!     → response.rs   (200 check and body decoding for fetch)
//! ```
//!
//! # Design Decisions
//! - One channel per manager; requests never open their own
//! - Admission slots are RAII guards, so every exit path releases them
//! - Cancelling one request never touches the channel or other requests

pub mod admission;
pub mod connection;
pub mod dispatch;
pub mod manager;
pub mod response;
pub mod types;

pub use admission::{AdmissionGate, AdmissionSlot};
pub use connection::ConnectionHolder;
pub use manager::ForwardProxyManager;
pub use response::FetchResponse;
pub use types::{ProxiedResponse, ProxyError, ProxyResult, RemoteErrorKind, RequestOptions};
