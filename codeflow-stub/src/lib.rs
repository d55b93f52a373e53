//! Deterministic stand-in for the code review service.
//!
//! Serves canned responses for the four stage endpoints and records every
//! request it receives. It contains no analysis logic.

pub mod fixtures;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::warn;

pub use crate::fixtures::{Endpoint, EndpointFixture, StubFixtures, load_fixtures};
pub use crate::routes::router;
pub use crate::state::{RecordedRequest, StubState};

/// A stub server running on a background task. Dropping it stops the server.
pub struct StubHandle {
    pub addr: SocketAddr,
    pub state: StubState,
    task: JoinHandle<()>,
}

impl StubHandle {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests()
    }
}

impl Drop for StubHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Serve `fixtures` on an ephemeral localhost port.
pub async fn spawn(fixtures: StubFixtures) -> Result<StubHandle> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind stub listener")?;
    let addr = listener.local_addr().context("stub listener address")?;
    let state = StubState::new(fixtures);
    let app = router(state.clone());
    let task = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            warn!(error = %err, "stub server stopped");
        }
    });
    Ok(StubHandle { addr, state, task })
}
