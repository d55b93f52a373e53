//! Shared state for the stub server.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::fixtures::{Endpoint, StubFixtures};

/// One request received by a stage endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub endpoint: Endpoint,
    pub body: Value,
}

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct StubState {
    pub fixtures: Arc<StubFixtures>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubState {
    pub fn new(fixtures: StubFixtures) -> Self {
        Self {
            fixtures: Arc::new(fixtures),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn record(&self, endpoint: Endpoint, body: Value) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest { endpoint, body });
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
