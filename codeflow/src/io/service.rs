//! Review service abstraction.
//!
//! The [`ReviewService`] trait decouples the session from the HTTP backend.
//! Tests use scripted services that return predetermined outcomes and count
//! calls without touching the network.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::core::error::StageError;
use crate::core::payload::StageRequest;
use crate::core::types::{Stage, StageResult};
use crate::io::config::{EndpointPaths, ServiceConfig};
use crate::io::wire::classify;

/// One request per call; implementations must not retry.
#[async_trait(?Send)]
pub trait ReviewService {
    async fn invoke(&self, stage: Stage, request: &StageRequest)
    -> Result<StageResult, StageError>;
}

/// Review service reached over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpReviewService {
    client: Client,
    base_url: String,
    paths: EndpointPaths,
}

impl HttpReviewService {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            paths: config.paths.clone(),
        })
    }

    /// Full URL for a stage endpoint.
    pub fn endpoint(&self, stage: Stage) -> String {
        format!("{}{}", self.base_url, self.paths.for_stage(stage))
    }
}

#[async_trait(?Send)]
impl ReviewService for HttpReviewService {
    #[instrument(skip_all, fields(%stage, code_bytes = request.code.len()))]
    async fn invoke(
        &self,
        stage: Stage,
        request: &StageRequest,
    ) -> Result<StageResult, StageError> {
        let url = self.endpoint(stage);
        info!(%url, "sending stage request");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| transport_error(&url, &err))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| transport_error(&url, &err))?;
        debug!(status = status.as_u16(), body_bytes = body.len(), "received stage response");

        classify(stage, status.as_u16(), &body)
    }
}

fn transport_error(url: &str, err: &reqwest::Error) -> StageError {
    warn!(%url, error = %err, "stage request failed");
    let reason = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "could not connect".to_string()
    } else {
        err.to_string()
    };
    StageError::Transport(format!("{url}: {reason}"))
}
