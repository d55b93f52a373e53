//! HTTP route handlers for the stage endpoints.

use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::fixtures::{Endpoint, default_body};
use crate::state::StubState;

/// Build the stub router: four stage endpoints, `/health`, permissive CORS.
pub fn router(state: StubState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route(Endpoint::Analyze.path(), post(analyze))
        .route(Endpoint::Fix.path(), post(fix))
        .route(Endpoint::GenerateTests.path(), post(generate_tests))
        .route(Endpoint::Verify.path(), post(verify))
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// POST /api/analyze
async fn analyze(State(state): State<StubState>, Json(request): Json<Value>) -> Response {
    respond(&state, Endpoint::Analyze, request).await
}

/// POST /api/fix
async fn fix(State(state): State<StubState>, Json(request): Json<Value>) -> Response {
    respond(&state, Endpoint::Fix, request).await
}

/// POST /api/generate-tests
async fn generate_tests(State(state): State<StubState>, Json(request): Json<Value>) -> Response {
    respond(&state, Endpoint::GenerateTests, request).await
}

/// POST /api/verify - no empty-code check, like the real service.
async fn verify(State(state): State<StubState>, Json(request): Json<Value>) -> Response {
    respond(&state, Endpoint::Verify, request).await
}

async fn respond(state: &StubState, endpoint: Endpoint, request: Value) -> Response {
    info!(path = endpoint.path(), "stage request");
    state.record(endpoint, request.clone());

    if endpoint != Endpoint::Verify && code_is_blank(&request) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Code is empty. Paste some code first."})),
        )
            .into_response();
    }

    if state.fixtures.delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(state.fixtures.delay_ms)).await;
    }

    let fixture = state.fixtures.for_endpoint(endpoint);
    let body = fixture
        .body
        .clone()
        .unwrap_or_else(|| default_body(endpoint, &request));
    let status = StatusCode::from_u16(fixture.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    debug!(path = endpoint.path(), status = status.as_u16(), "stage response");
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn code_is_blank(request: &Value) -> bool {
    request
        .get("code")
        .and_then(Value::as_str)
        .is_none_or(|code| code.trim().is_empty())
}
