//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Client produces:
//!     → events.rs (lifecycle notifications for observers)
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//! ```
//!
//! # Design Decisions
//! - Side channels only: nothing here influences control flow
//! - Each request runs in a span carrying its request id

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{EventBus, ProxyEvent};
