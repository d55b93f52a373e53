//! Stage strip: done / active / pending per stage.

use serde::Serialize;

use crate::core::types::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Done,
    Active,
    Pending,
}

/// One entry of the stage strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageBadge {
    pub stage: Stage,
    pub label: &'static str,
    pub status: StageStatus,
}

/// Statuses for every stage given the current one.
///
/// Earlier stages are `Done`, the current stage is `Active`, later ones `Pending`.
pub fn render(current: Stage) -> [StageBadge; 4] {
    Stage::ALL.map(|stage| StageBadge {
        stage,
        label: stage.label(),
        status: match stage.index().cmp(&current.index()) {
            std::cmp::Ordering::Less => StageStatus::Done,
            std::cmp::Ordering::Equal => StageStatus::Active,
            std::cmp::Ordering::Greater => StageStatus::Pending,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses(current: Stage) -> Vec<StageStatus> {
        render(current).iter().map(|badge| badge.status).collect()
    }

    #[test]
    fn first_stage_is_active_rest_pending() {
        assert_eq!(
            statuses(Stage::Analyze),
            vec![
                StageStatus::Active,
                StageStatus::Pending,
                StageStatus::Pending,
                StageStatus::Pending
            ]
        );
    }

    #[test]
    fn earlier_stages_are_done() {
        assert_eq!(
            statuses(Stage::Test),
            vec![
                StageStatus::Done,
                StageStatus::Done,
                StageStatus::Active,
                StageStatus::Pending
            ]
        );
        assert_eq!(statuses(Stage::Verify)[3], StageStatus::Active);
    }

    #[test]
    fn badges_follow_pipeline_order() {
        let stages: Vec<Stage> = render(Stage::Fix).iter().map(|badge| badge.stage).collect();
        assert_eq!(stages, Stage::ALL.to_vec());
    }
}
