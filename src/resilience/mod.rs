//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt fails:
//!     → retries.rs (is the failure a connection failure? budget left?)
//!     → backoff.rs (linear delay, clamped)
//!     → caller sleeps, then attempts again
//! ```
//!
//! # Design Decisions
//! - Only connection failures are retried; the proxy's own answers are final
//! - Linear backoff: delay grows by a fixed step up to a ceiling
//! - Budget is per request, counted in retries (not attempts)

pub mod backoff;
pub mod retries;

pub use backoff::calculate_backoff;
pub use retries::{is_retryable, RetryPolicy};
