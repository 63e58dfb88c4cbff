//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for Ctrl+C (SIGINT)
//! - Cancel in-flight requests through their shared token
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Cancelling requests leaves the proxy connection untouched

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancel `token` when Ctrl+C is received.
pub fn cancel_on_ctrl_c(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => {
                        tracing::warn!("Interrupt received, cancelling in-flight requests");
                        token.cancel();
                    }
                    Err(e) => tracing::error!(error = %e, "Failed to install Ctrl+C handler"),
                }
            }
            _ = token.cancelled() => {}
        }
    })
}
