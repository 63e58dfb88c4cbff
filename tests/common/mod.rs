//! Shared mock transport for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch, Semaphore};
use tokio::time::Instant;

use forward_proxy_client::config::ClientConfig;
use forward_proxy_client::transport::proto::proxy_response_error::ErrorType;
use forward_proxy_client::transport::{
    ChannelOptions, ConnectivityState, ProxyChannel, ProxyRequest, ProxyResponse, ProxyTransport,
    TransportError,
};
use forward_proxy_client::ProxyEvent;

/// What the mock proxy answers to one call.
#[derive(Debug, Clone)]
pub enum Reply {
    Success(i32, &'static str),
    Envelope(ErrorType),
    Empty,
    Error(TransportError),
    /// Never answers.
    Hang,
    /// Answers with 200 once the test releases a permit via [`MockTransport::release`].
    Held(&'static str),
}

/// How the readiness wait of one opened channel behaves.
#[derive(Debug, Clone)]
pub enum Readiness {
    Immediate,
    After(Duration),
    Never,
    Fail(TransportError),
}

pub struct MockState {
    pub opens: AtomicUsize,
    pub calls: AtomicUsize,
    pub active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub dropped_calls: AtomicUsize,
    pub requests: Mutex<Vec<ProxyRequest>>,
    replies: Mutex<VecDeque<Reply>>,
    fallback: Mutex<Option<Reply>>,
    readiness: Mutex<VecDeque<Readiness>>,
    release: Arc<Semaphore>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            opens: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            dropped_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            readiness: Mutex::new(VecDeque::new()),
            release: Arc::new(Semaphore::new(0)),
        }
    }
}

/// Scriptable in-memory transport.
#[derive(Clone, Default)]
pub struct MockTransport {
    pub state: Arc<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue replies consumed one per call, in order.
    pub fn replies(self, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.state.replies.lock().unwrap().extend(replies);
        self
    }

    /// Reply used once the queue is empty.
    pub fn fallback(self, reply: Reply) -> Self {
        *self.state.fallback.lock().unwrap() = Some(reply);
        self
    }

    /// Queue readiness behaviours consumed one per opened channel.
    pub fn readiness(self, readiness: impl IntoIterator<Item = Readiness>) -> Self {
        self.state.readiness.lock().unwrap().extend(readiness);
        self
    }

    /// Let `n` held calls complete.
    pub fn release(&self, n: usize) {
        self.state.release.add_permits(n);
    }

    pub fn opens(&self) -> usize {
        self.state.opens.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.state.max_active.load(Ordering::SeqCst)
    }

    pub fn dropped_calls(&self) -> usize {
        self.state.dropped_calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Reply {
        if let Some(reply) = self.state.replies.lock().unwrap().pop_front() {
            return reply;
        }
        self.state
            .fallback
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(Reply::Success(200, ""))
    }
}

impl ProxyTransport for MockTransport {
    type Channel = MockChannel;

    fn open(&self, _endpoint: &str, _options: &ChannelOptions) -> Result<MockChannel, TransportError> {
        self.state.opens.fetch_add(1, Ordering::SeqCst);
        let readiness = self
            .state
            .readiness
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Readiness::Immediate);
        let (state, _) = watch::channel(ConnectivityState::Idle);

        Ok(MockChannel {
            transport: self.clone(),
            readiness,
            state: Arc::new(state),
        })
    }
}

#[derive(Clone)]
pub struct MockChannel {
    transport: MockTransport,
    readiness: Readiness,
    state: Arc<watch::Sender<ConnectivityState>>,
}

impl std::fmt::Debug for MockChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockChannel")
            .field("readiness", &self.readiness)
            .finish_non_exhaustive()
    }
}

/// Tracks one call; counts it as dropped unless it completed.
struct CallGuard {
    state: Arc<MockState>,
    completed: bool,
}

impl CallGuard {
    fn new(state: Arc<MockState>) -> Self {
        let active = state.active.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_active.fetch_max(active, Ordering::SeqCst);
        Self {
            state,
            completed: false,
        }
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        self.state.active.fetch_sub(1, Ordering::SeqCst);
        if !self.completed {
            self.state.dropped_calls.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl ProxyChannel for MockChannel {
    fn connectivity_state(&self) -> ConnectivityState {
        *self.state.borrow()
    }

    async fn watch_state(&self, current: ConnectivityState) -> ConnectivityState {
        let mut rx = self.state.subscribe();
        loop {
            let state = *rx.borrow_and_update();
            if state != current {
                return state;
            }
            if rx.changed().await.is_err() {
                return ConnectivityState::Shutdown;
            }
        }
    }

    async fn wait_for_ready(&self, _deadline: Instant) -> Result<(), TransportError> {
        self.state.send_replace(ConnectivityState::Connecting);
        match &self.readiness {
            Readiness::Immediate => {}
            Readiness::After(delay) => tokio::time::sleep(*delay).await,
            Readiness::Never => std::future::pending::<()>().await,
            Readiness::Fail(error) => {
                self.state.send_replace(ConnectivityState::TransientFailure);
                return Err(error.clone());
            }
        }
        self.state.send_replace(ConnectivityState::Ready);
        Ok(())
    }

    async fn send_request(&self, request: ProxyRequest) -> Result<ProxyResponse, TransportError> {
        let shared = self.transport.state.clone();
        shared.calls.fetch_add(1, Ordering::SeqCst);
        shared.requests.lock().unwrap().push(request);
        let mut guard = CallGuard::new(shared.clone());

        let result = match self.transport.next_reply() {
            Reply::Success(status, body) => Ok(ProxyResponse::success(status, body)),
            Reply::Envelope(kind) => Ok(ProxyResponse::error(kind)),
            Reply::Empty => Ok(ProxyResponse::default()),
            Reply::Error(error) => Err(error),
            Reply::Hang => std::future::pending().await,
            Reply::Held(body) => {
                let permit = shared.release.acquire().await.expect("release semaphore closed");
                permit.forget();
                Ok(ProxyResponse::success(200, body))
            }
        };

        guard.completed = true;
        result
    }
}

/// Config with a fast readiness deadline for tests.
pub fn test_config() -> ClientConfig {
    let mut config = ClientConfig::default();
    config.proxy.endpoint = "http://proxy.test:8082".to_string();
    config.client.client_timeout_ms = 200;
    config
}

pub fn unavailable() -> Reply {
    Reply::Error(TransportError::unavailable("failed to connect to all addresses"))
}

/// Drain every event already sent to `rx`.
pub fn drain_events(rx: &mut broadcast::Receiver<ProxyEvent>) -> Vec<ProxyEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn count(events: &[ProxyEvent], matcher: impl Fn(&ProxyEvent) -> bool) -> usize {
    events.iter().filter(|event| matcher(event)).count()
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(std::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Await `fut`, failing the test after two seconds.
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(2), fut)
        .await
        .expect("future did not complete in time")
}
