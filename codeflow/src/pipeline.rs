//! Unattended review for `codeflow review`: run every stage in order.

use tracing::info;

use crate::core::error::StageError;
use crate::core::reconcile::Applied;
use crate::core::types::Stage;
use crate::io::service::ReviewService;
use crate::io::view::ViewSink;
use crate::session::{Session, Settled};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewOptions {
    /// Skip Generate Tests and go straight from Fix to Verify.
    pub skip_tests: bool,
}

/// Reason why `run_review` stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewStop {
    /// Analyze found no bugs; nothing else ran.
    Clean,
    /// Verify reported the fixed code clean.
    Verified,
    /// Verify reported remaining issues.
    IssuesRemain,
    /// A stage was rejected or its call failed.
    Failed { stage: Stage, error: StageError },
}

/// Summary of a review invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOutcome {
    pub stages_run: Vec<Stage>,
    pub stop: ReviewStop,
}

/// Run Analyze, Fix, Generate Tests and Verify against the session's snippet,
/// waiting for each stage before starting the next.
///
/// Stops at the first stage that is rejected or fails.
pub async fn run_review<V: ViewSink, S: ReviewService + ?Sized>(
    session: &mut Session<V>,
    service: &S,
    options: ReviewOptions,
) -> ReviewOutcome {
    let mut stages_run = Vec::new();
    for stage in Stage::ALL {
        if stage == Stage::Test && options.skip_tests {
            info!("skipping test generation");
            continue;
        }

        let applied = match run_stage(session, service, stage).await {
            Ok(applied) => applied,
            Err(error) => {
                return ReviewOutcome {
                    stages_run,
                    stop: ReviewStop::Failed { stage, error },
                };
            }
        };
        stages_run.push(stage);

        match applied {
            Applied::Analyzed { total: 0 } => {
                return ReviewOutcome {
                    stages_run,
                    stop: ReviewStop::Clean,
                };
            }
            Applied::Verified { clean } => {
                let stop = if clean {
                    ReviewStop::Verified
                } else {
                    ReviewStop::IssuesRemain
                };
                return ReviewOutcome { stages_run, stop };
            }
            Applied::Analyzed { .. } | Applied::Fixed | Applied::TestsGenerated { .. } => {}
        }
    }

    // Verify is last in `Stage::ALL` and settles above.
    ReviewOutcome {
        stages_run,
        stop: ReviewStop::IssuesRemain,
    }
}

async fn run_stage<V: ViewSink, S: ReviewService + ?Sized>(
    session: &mut Session<V>,
    service: &S,
    stage: Stage,
) -> Result<Applied, StageError> {
    match session.run(stage, service).await? {
        Settled::Applied(applied) => Ok(applied),
        Settled::Failed(err) => Err(err),
        Settled::Discarded => Err(StageError::Transport(format!(
            "{stage} response was discarded"
        ))),
    }
}
