//! Mock transport for testing.
//!
//! Allows queueing responses per path, capturing posted forms, forcing
//! failures, and holding a response back until a test releases it. With
//! nothing queued it behaves like a tiny in-memory share service, which is
//! what the CLI's `--mock` mode relies on.

use super::{ShareTransport, TransportError, TransportResponse};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

const SHARE_PREFIX: &str = "/share";

/// A form captured by [`MockTransport::post_form`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedForm {
    /// Request path.
    pub path: String,
    /// Form field name.
    pub field: String,
    /// Form field value.
    pub value: String,
}

/// Holds back the next response on one path until released or dropped.
#[derive(Debug)]
pub struct MockGate {
    sender: oneshot::Sender<()>,
}

impl MockGate {
    /// Let the held response through.
    pub fn release(self) {
        let _ = self.sender.send(());
    }
}

/// Mock transport for testing.
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    posted: Vec<PostedForm>,
    requested: Vec<String>,
    responses: HashMap<String, VecDeque<TransportResponse>>,
    gates: HashMap<String, VecDeque<oneshot::Receiver<()>>>,
    shares: HashMap<String, String>,
    fail_next_post: Option<String>,
    fail_next_get: Option<String>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a response for the next request to `path`.
    pub fn queue_response(&self, path: &str, status: u16, body: &str) {
        self.lock()
            .responses
            .entry(path.to_string())
            .or_default()
            .push_back(TransportResponse::new(status, body));
    }

    /// Hold the next response on `path` until the returned gate is released.
    pub fn gate(&self, path: &str) -> MockGate {
        let (sender, receiver) = oneshot::channel();
        self.lock()
            .gates
            .entry(path.to_string())
            .or_default()
            .push_back(receiver);
        MockGate { sender }
    }

    /// Store a body under a handle in the built-in share service.
    pub fn insert_share(&self, handle: &str, body: &str) {
        self.lock()
            .shares
            .insert(handle.to_string(), body.to_string());
    }

    /// All forms that were posted.
    pub fn posted_forms(&self) -> Vec<PostedForm> {
        self.lock().posted.clone()
    }

    /// The last form that was posted.
    pub fn last_posted(&self) -> Option<PostedForm> {
        self.lock().posted.last().cloned()
    }

    /// Paths of all GET requests, in order.
    pub fn requested_paths(&self) -> Vec<String> {
        self.lock().requested.clone()
    }

    /// Cause the next post_form() to fail with the given error.
    pub fn fail_next_post(&self, error: &str) {
        self.lock().fail_next_post = Some(error.to_string());
    }

    /// Cause the next get() to fail with the given error.
    pub fn fail_next_get(&self, error: &str) {
        self.lock().fail_next_get = Some(error.to_string());
    }

    /// Clear all state (captures, queues, gates, stored shares).
    pub fn reset(&self) {
        *self.lock() = MockTransportInner::default();
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl MockTransportInner {
    fn next_response(&mut self, path: &str) -> Option<TransportResponse> {
        self.responses.get_mut(path).and_then(VecDeque::pop_front)
    }

    fn next_gate(&mut self, path: &str) -> Option<oneshot::Receiver<()>> {
        self.gates.get_mut(path).and_then(VecDeque::pop_front)
    }

    fn store_share(&mut self, value: &str) -> TransportResponse {
        let handle = format!("{:08x}", self.shares.len() + 1);
        self.shares.insert(handle.clone(), value.to_string());
        TransportResponse::new(200, handle)
    }

    fn load_share(&self, path: &str) -> TransportResponse {
        let stored = path
            .strip_prefix(SHARE_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|handle| self.shares.get(handle));
        match stored {
            Some(body) => TransportResponse::new(200, body.clone()),
            None => TransportResponse::new(404, "not found"),
        }
    }
}

async fn wait(gate: Option<oneshot::Receiver<()>>) {
    if let Some(gate) = gate {
        // A dropped gate releases too.
        let _ = gate.await;
    }
}

#[async_trait]
impl ShareTransport for MockTransport {
    async fn post_form(
        &self,
        path: &str,
        field: &str,
        value: &str,
    ) -> Result<TransportResponse, TransportError> {
        let (response, gate) = {
            let mut inner = self.lock();

            // Check for forced failure
            if let Some(error) = inner.fail_next_post.take() {
                return Err(TransportError::ConnectionFailed(error));
            }

            inner.posted.push(PostedForm {
                path: path.to_string(),
                field: field.to_string(),
                value: value.to_string(),
            });

            let response = match inner.next_response(path) {
                Some(response) => response,
                None if path == SHARE_PREFIX => inner.store_share(value),
                None => TransportResponse::new(404, "not found"),
            };
            (response, inner.next_gate(path))
        };

        wait(gate).await;
        Ok(response)
    }

    async fn get(&self, path: &str) -> Result<TransportResponse, TransportError> {
        let (response, gate) = {
            let mut inner = self.lock();

            // Check for forced failure
            if let Some(error) = inner.fail_next_get.take() {
                return Err(TransportError::ConnectionFailed(error));
            }

            inner.requested.push(path.to_string());
            let response = match inner.next_response(path) {
                Some(response) => response,
                None => inner.load_share(path),
            };
            (response, inner.next_gate(path))
        };

        wait(gate).await;
        Ok(response)
    }
}
