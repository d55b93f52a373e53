//! Response classification for review service bodies.
//!
//! The service answers every stage with a JSON object. A truthy `error` field
//! marks a domain error whatever the HTTP status; anything unparseable, or a
//! non-2xx status without such a field, is a transport error.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::core::error::StageError;
use crate::core::types::{Bug, Stage, StageResult, TestCase, TestSuite, VerificationResult};

#[derive(Debug, Deserialize)]
struct AnalyzeBody {
    #[serde(default)]
    bugs: Option<Vec<Bug>>,
}

#[derive(Debug, Deserialize)]
struct FixBody {
    #[serde(default)]
    fixed_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TestsBody {
    #[serde(default)]
    test_cases: Option<Vec<TestCase>>,
    #[serde(default)]
    test_code: Option<String>,
}

/// Classify an HTTP response for `stage` into a result or a stage error.
pub fn classify(stage: Stage, status: u16, body: &str) -> Result<StageResult, StageError> {
    let success = (200..300).contains(&status);
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) if success => {
            return Err(StageError::Transport(format!(
                "malformed {stage} response: {err}"
            )));
        }
        Err(_) => return Err(http_status_error(status)),
    };

    if let Some(message) = error_message(&value) {
        debug!(%stage, status, "service reported a domain error");
        return Err(StageError::Domain(message));
    }
    if !success {
        return Err(http_status_error(status));
    }
    if !value.is_object() {
        return Err(StageError::Transport(format!(
            "{stage} response is not a JSON object"
        )));
    }

    let result = match stage {
        Stage::Analyze => {
            let body: AnalyzeBody = parse_body(stage, value)?;
            StageResult::Analyzed(body.bugs.unwrap_or_default())
        }
        Stage::Fix => {
            let body: FixBody = parse_body(stage, value)?;
            StageResult::Fixed(body.fixed_code.unwrap_or_default())
        }
        Stage::Test => {
            let body: TestsBody = parse_body(stage, value)?;
            StageResult::TestsGenerated(TestSuite {
                cases: body.test_cases.unwrap_or_default(),
                code: body.test_code.unwrap_or_default(),
            })
        }
        Stage::Verify => StageResult::Verified(parse_body::<VerificationResult>(stage, value)?),
    };
    Ok(result)
}

fn parse_body<T: DeserializeOwned>(stage: Stage, value: Value) -> Result<T, StageError> {
    serde_json::from_value(value)
        .map_err(|err| StageError::Transport(format!("malformed {stage} response: {err}")))
}

fn http_status_error(status: u16) -> StageError {
    StageError::Transport(format!("service returned HTTP {status}"))
}

/// The `error` field, if present and truthy (non-null, non-false, non-empty).
fn error_message(value: &Value) -> Option<String> {
    match value.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(message) if message.trim().is_empty() => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}
