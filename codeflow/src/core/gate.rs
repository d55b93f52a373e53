//! Stage prerequisites.
//!
//! A rejected stage never reaches the network and never moves the stage
//! indicator.

use thiserror::Error;

use crate::core::store::PipelineState;
use crate::core::types::Stage;

/// Why a stage may not run yet. The message is shown to the user as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateRejection {
    #[error("no code provided")]
    NoCode,
    #[error("analyze first")]
    AnalyzeFirst,
    #[error("fix code first")]
    FixFirst,
}

/// Check whether `stage` has everything it needs in `state`.
pub fn can_run(stage: Stage, state: &PipelineState) -> Result<(), GateRejection> {
    match stage {
        Stage::Analyze | Stage::Test => {
            if state.source().is_empty() {
                return Err(GateRejection::NoCode);
            }
        }
        Stage::Fix => {
            if state.source().is_empty() {
                return Err(GateRejection::NoCode);
            }
            if !state.has_bugs() {
                return Err(GateRejection::AnalyzeFirst);
            }
        }
        Stage::Verify => {
            if !state.has_fixed_code() {
                return Err(GateRejection::FixFirst);
            }
        }
    }
    Ok(())
}
