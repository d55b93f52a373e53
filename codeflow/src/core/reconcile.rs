//! Merge stage outcomes into pipeline state.

use crate::core::error::StageError;
use crate::core::store::PipelineState;
use crate::core::types::StageResult;

/// What a successful outcome changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Bug set replaced; `total == 0` means the code is clean.
    Analyzed { total: usize },
    Fixed,
    TestsGenerated { total: usize },
    Verified { clean: bool },
}

/// Apply `outcome` to `state`.
///
/// Errors pass through and leave `state` untouched. Successes replace the
/// stage's artifact wholesale. `source_revision` is the snippet revision the
/// request was built from; it dates the bug set.
pub fn apply(
    state: &mut PipelineState,
    outcome: Result<StageResult, StageError>,
    source_revision: u64,
) -> Result<Applied, StageError> {
    let applied = match outcome? {
        StageResult::Analyzed(bugs) => {
            let total = bugs.len();
            state.replace_bugs(bugs, source_revision);
            Applied::Analyzed { total }
        }
        StageResult::Fixed(code) => {
            state.replace_fixed_code(code);
            Applied::Fixed
        }
        StageResult::TestsGenerated(suite) => {
            let total = suite.cases.len();
            state.replace_tests(suite);
            Applied::TestsGenerated { total }
        }
        StageResult::Verified(result) => {
            let clean = result.is_clean;
            state.replace_verification(result);
            Applied::Verified { clean }
        }
    };
    Ok(applied)
}
