//! Lifecycle events for observers.
//!
//! Events are fire-and-forget: the client never waits on observers and
//! behaves the same whether or not anyone is subscribed.

use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 256;

/// Lifecycle notification emitted by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyEvent {
    /// A connection attempt to the proxy started.
    Connecting,
    /// The proxy channel became ready.
    Connected,
    /// A dispatch attempt for the URL started (fired again on every retry).
    Download(String),
    /// A retry for the URL is scheduled; fired before the backoff delay.
    Retry(String),
}

/// Broadcast bus carrying [`ProxyEvent`]s to any number of subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ProxyEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    /// Subscribe to events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ProxyEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: ProxyEvent) {
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
