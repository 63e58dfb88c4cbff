//! Shared connection to the forward proxy.
//!
//! # Responsibilities
//! - Open the proxy channel lazily, on first use
//! - Make concurrent callers converge on one connection attempt
//! - Wait for readiness with a deadline
//! - Log connectivity transitions for the lifetime of the channel
//!
//! # Design Decisions
//! - The attempt is a memoized `Shared` future: one handshake, many waiters
//! - The handshake runs in its own task, so a waiter that gives up (cancelled
//!   request, dropped future) never stalls it for the callers that follow
//! - A successful attempt is kept forever; the transport reconnects on its own
//! - A failed attempt is handed to everyone already waiting on it, then forgotten,
//!   so the next caller starts a fresh attempt instead of inheriting a stale failure

use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::client::types::{ProxyError, ProxyResult};
use crate::observability::{EventBus, ProxyEvent};
use crate::transport::{
    ChannelOptions, ConnectivityState, ProxyChannel, ProxyTransport, TransportError, TransportErrorKind,
};

type Attempt<C> = Shared<BoxFuture<'static, ProxyResult<C>>>;

/// Owner of the single proxy channel.
pub struct ConnectionHolder<T: ProxyTransport> {
    connector: Arc<Connector<T>>,
    attempt: Mutex<Option<Attempt<T::Channel>>>,
    shutdown: CancellationToken,
}

struct Connector<T> {
    transport: T,
    endpoint: String,
    options: ChannelOptions,
    ready_timeout: Duration,
    events: EventBus,
}

impl<T: ProxyTransport> ConnectionHolder<T> {
    pub fn new(
        transport: T,
        endpoint: impl Into<String>,
        options: ChannelOptions,
        ready_timeout: Duration,
        events: EventBus,
    ) -> Self {
        Self {
            connector: Arc::new(Connector {
                transport,
                endpoint: endpoint.into(),
                options,
                ready_timeout,
                events,
            }),
            attempt: Mutex::new(None),
            shutdown: CancellationToken::new(),
        }
    }

    /// Return the ready channel, connecting first if needed.
    pub async fn ensure_connected(&self) -> ProxyResult<T::Channel> {
        let attempt = {
            let mut slot = self.attempt.lock().expect("connection slot mutex poisoned");
            slot.get_or_insert_with(|| self.start_attempt()).clone()
        };

        let outcome = attempt.clone().await;

        if outcome.is_err() {
            let mut slot = self.attempt.lock().expect("connection slot mutex poisoned");
            if slot.as_ref().is_some_and(|current| current.ptr_eq(&attempt)) {
                *slot = None;
            }
        }

        outcome
    }

    /// Connectivity state of the established channel, if any.
    pub fn connectivity_state(&self) -> Option<ConnectivityState> {
        let slot = self.attempt.lock().expect("connection slot mutex poisoned");
        match slot.as_ref().and_then(|attempt| attempt.peek()) {
            Some(Ok(channel)) => Some(channel.connectivity_state()),
            _ => None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.connector.endpoint
    }

    /// Spawn the handshake so it keeps running when every waiter goes away.
    fn start_attempt(&self) -> Attempt<T::Channel> {
        let connector = self.connector.clone();
        let stop = self.shutdown.child_token();

        let handshake = tokio::spawn(async move {
            tokio::select! {
                _ = stop.cancelled() => Err(ProxyError::Transport(TransportError::new(
                    TransportErrorKind::Cancelled,
                    "connection holder dropped",
                ))),
                result = connector.connect(stop.child_token()) => result,
            }
        });

        async move {
            handshake.await.unwrap_or_else(|e| {
                Err(ProxyError::Transport(TransportError::new(
                    TransportErrorKind::Cancelled,
                    format!("connection task failed: {}", e),
                )))
            })
        }
        .boxed()
        .shared()
    }
}

impl<T: ProxyTransport> Drop for ConnectionHolder<T> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl<T: ProxyTransport> Connector<T> {
    async fn connect(&self, watch_stop: CancellationToken) -> ProxyResult<T::Channel> {
        self.events.emit(ProxyEvent::Connecting);
        tracing::info!(endpoint = %self.endpoint, "Connecting to proxy");

        let channel = self.transport.open(&self.endpoint, &self.options)?;
        spawn_state_watch(channel.clone(), watch_stop.clone());

        let deadline = Instant::now() + self.ready_timeout;
        let ready = match time::timeout_at(deadline, channel.wait_for_ready(deadline)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::deadline_exceeded(self.ready_timeout)),
        };

        if let Err(e) = ready {
            watch_stop.cancel();
            tracing::error!(endpoint = %self.endpoint, error = %e, "Proxy connection failed");
            return Err(self.readiness_error(e));
        }

        self.events.emit(ProxyEvent::Connected);
        tracing::info!(endpoint = %self.endpoint, "Connected to proxy server");
        Ok(channel)
    }

    fn readiness_error(&self, error: TransportError) -> ProxyError {
        match error.kind {
            TransportErrorKind::DeadlineExceeded => ProxyError::ConnectTimeout {
                endpoint: self.endpoint.clone(),
                timeout_ms: self.ready_timeout.as_millis() as u64,
            },
            _ => ProxyError::from(error),
        }
    }
}

/// Log every connectivity transition until stopped or shut down.
fn spawn_state_watch<C: ProxyChannel>(channel: C, stop: CancellationToken) {
    tokio::spawn(async move {
        let mut state = channel.connectivity_state();
        tracing::debug!(state = %state, "Proxy channel state");

        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                next = channel.watch_state(state) => {
                    state = next;
                    tracing::debug!(state = %state, "Proxy channel state");
                    if state == ConnectivityState::Shutdown {
                        break;
                    }
                }
            }
        }
    });
}
