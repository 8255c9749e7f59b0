//! Testing utilities.
//!
//! [`StubTransport`] answers from an in-memory URL → document table and
//! counts every request, so cache and query behaviour can be checked without
//! a network. Unknown URLs fail like an exhausted 404.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use crate::transport::Transport;
use crate::types::{FetchFailure, TransportError};

#[derive(Default)]
struct StubState {
    documents: HashMap<String, Value>,
    requests: HashMap<String, usize>,
    log: Vec<String>,
}

/// In-memory transport with request counting. Clones share state.
#[derive(Clone, Default)]
pub struct StubTransport {
    state: Arc<Mutex<StubState>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `document` for `url`.
    pub fn insert(&self, url: impl Into<String>, document: Value) {
        self.lock().documents.insert(url.into(), document);
    }

    /// Requests made for `url` so far.
    pub fn requests(&self, url: &str) -> usize {
        self.lock().requests.get(url).copied().unwrap_or(0)
    }

    /// Requests made across all URLs.
    pub fn total_requests(&self) -> usize {
        self.lock().log.len()
    }

    /// Every requested URL, in order.
    pub fn request_log(&self) -> Vec<String> {
        self.lock().log.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StubState> {
        // Poisoning is ignored; counts stay readable after a failed assertion.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn fetch(&self, url: &str) -> Result<Value, TransportError> {
        let mut state = self.lock();
        *state.requests.entry(url.to_string()).or_default() += 1;
        state.log.push(url.to_string());

        state
            .documents
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError {
                url: url.to_string(),
                attempts: 1,
                source: FetchFailure::Status {
                    status: 404,
                    body: "Not Found".to_string(),
                },
            })
    }
}
