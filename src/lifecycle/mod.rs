//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT → cancel the request token → in-flight fetches fail with Cancelled
//! ```

pub mod signals;

pub use signals::cancel_on_ctrl_c;
