//! Request bodies sent to the review service.

use serde::Serialize;

use crate::core::store::PipelineState;
use crate::core::types::{Bug, Stage};

/// JSON body for one stage call. `bugs` is only present for Fix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageRequest {
    pub code: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bugs: Option<Vec<Bug>>,
}

/// Snapshot the parts of `state` that `stage` sends.
///
/// Verify operates on the fixed code; every other stage sends the trimmed
/// snippet. Fix carries the exact current bug set.
pub fn build_request(stage: Stage, state: &PipelineState) -> StageRequest {
    let source = state.source();
    let code = match stage {
        Stage::Verify => state.fixed_code().unwrap_or_default().to_string(),
        Stage::Analyze | Stage::Fix | Stage::Test => source.trimmed().to_string(),
    };
    let bugs = match stage {
        Stage::Fix => Some(state.bugs().unwrap_or_default().to_vec()),
        Stage::Analyze | Stage::Test | Stage::Verify => None,
    };
    StageRequest {
        code,
        language: source.language.clone(),
        bugs,
    }
}
