//! Pure view model of a session.
//!
//! [`Snapshot::capture`] is the only thing a view adapter needs: it derives
//! everything displayable from the pipeline state without side effects.

use serde::Serialize;

use crate::core::indicator::{self, StageBadge};
use crate::core::store::PipelineState;
use crate::core::types::{
    Bug, QualityBand, RemainingIssue, SeverityCounts, Stage, VerificationResult,
};

/// Presentation of the Analyze results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnalysisView {
    /// Analyze has not succeeded in this session.
    NotAnalyzed,
    /// Analyze succeeded and found nothing.
    Clean,
    Issues {
        bugs: Vec<Bug>,
        counts: SeverityCounts,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCaseView {
    pub name: String,
    pub category: String,
    pub label: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestsView {
    pub cases: Vec<TestCaseView>,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationView {
    pub is_clean: bool,
    pub summary: String,
    pub remaining_issues: Vec<RemainingIssue>,
    pub score: Option<u8>,
    pub band: Option<QualityBand>,
}

impl From<&VerificationResult> for VerificationView {
    fn from(result: &VerificationResult) -> Self {
        let score = result.score();
        Self {
            is_clean: result.is_clean,
            summary: result.summary.clone(),
            remaining_issues: if result.is_clean {
                Vec::new()
            } else {
                result.remaining_issues.clone()
            },
            score,
            band: score.map(QualityBand::from_score),
        }
    }
}

/// Everything the view layer displays, derived from state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub stages: [StageBadge; 4],
    pub language: String,
    pub line_count: usize,
    pub analysis: AnalysisView,
    pub analysis_stale: bool,
    /// Whether Fix actions are offered (bugs were found).
    pub show_fix_actions: bool,
    pub fixed_code: Option<String>,
    pub tests: Option<TestsView>,
    pub verification: Option<VerificationView>,
    /// Stages with a request outstanding, in issue order.
    pub busy: Vec<Stage>,
}

impl Snapshot {
    pub fn capture(state: &PipelineState, busy: &[Stage]) -> Self {
        let analysis = match state.bugs() {
            None => AnalysisView::NotAnalyzed,
            Some([]) => AnalysisView::Clean,
            Some(bugs) => AnalysisView::Issues {
                bugs: bugs.to_vec(),
                counts: SeverityCounts::tally(bugs),
            },
        };
        let code = &state.source().code;
        Self {
            stages: indicator::render(state.current_stage()),
            language: state.source().language.clone(),
            line_count: if code.is_empty() { 0 } else { code.lines().count() },
            show_fix_actions: matches!(analysis, AnalysisView::Issues { .. }),
            analysis,
            analysis_stale: state.analysis_stale(),
            fixed_code: state.fixed_code().map(str::to_string),
            tests: state.tests().map(|suite| TestsView {
                cases: suite
                    .cases
                    .iter()
                    .map(|case| TestCaseView {
                        name: case.name.clone(),
                        category: case.category.as_str().to_string(),
                        label: case.category.label().to_string(),
                        description: case.description.clone(),
                    })
                    .collect(),
                code: suite.code.clone(),
            }),
            verification: state.verification().map(VerificationView::from),
            busy: busy.to_vec(),
        }
    }

    /// True when both snapshots show the same artifacts (ignores strip and busy state).
    pub fn same_artifacts(&self, other: &Snapshot) -> bool {
        self.analysis == other.analysis
            && self.analysis_stale == other.analysis_stale
            && self.fixed_code == other.fixed_code
            && self.tests == other.tests
            && self.verification == other.verification
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::indicator::StageStatus;
    use crate::core::reconcile::apply;
    use crate::core::types::{StageResult, TestCase, TestSuite};
    use serde_json::json;

    fn analyzed(bugs: serde_json::Value) -> PipelineState {
        let mut state = PipelineState::new("python");
        state.set_code("x=1\ny=2");
        let bugs: Vec<Bug> = serde_json::from_value(bugs).expect("bugs");
        apply(&mut state, Ok(StageResult::Analyzed(bugs)), 1).expect("apply");
        state
    }

    #[test]
    fn initial_snapshot_is_not_analyzed() {
        let snapshot = Snapshot::capture(&PipelineState::new("python"), &[]);
        assert_eq!(snapshot.analysis, AnalysisView::NotAnalyzed);
        assert!(!snapshot.show_fix_actions);
        assert_eq!(snapshot.stages[0].status, StageStatus::Active);
        assert_eq!(snapshot.line_count, 0);
    }

    #[test]
    fn clean_analysis_hides_fix_actions() {
        let snapshot = Snapshot::capture(&analyzed(json!([])), &[]);
        assert_eq!(snapshot.analysis, AnalysisView::Clean);
        assert_ne!(snapshot.analysis, AnalysisView::NotAnalyzed);
        assert!(!snapshot.show_fix_actions);
    }

    #[test]
    fn issues_carry_severity_counts() {
        let snapshot = Snapshot::capture(
            &analyzed(json!([
                {"severity": "critical"},
                {"severity": "high"},
                {"severity": "high"}
            ])),
            &[],
        );
        match snapshot.analysis {
            AnalysisView::Issues { bugs, counts } => {
                assert_eq!(bugs.len(), 3);
                assert_eq!(
                    counts,
                    SeverityCounts {
                        critical: 1,
                        high: 2,
                        medium: 0,
                        low: 0
                    }
                );
            }
            other => panic!("expected issues, got {other:?}"),
        }
        assert!(snapshot.show_fix_actions);
        assert_eq!(snapshot.line_count, 2);
    }

    #[test]
    fn clean_verification_hides_remaining_issues() {
        let mut state = analyzed(json!([{"severity": "low"}]));
        apply(&mut state, Ok(StageResult::Fixed("x = 1".to_string())), 1).expect("fix");
        let result: VerificationResult = serde_json::from_value(json!({
            "is_clean": true,
            "summary": "Looks good",
            "remaining_issues": [{"title": "leftover", "description": "ignored"}],
            "quality_score": 92
        }))
        .expect("verification");
        apply(&mut state, Ok(StageResult::Verified(result)), 1).expect("verify");

        let view = Snapshot::capture(&state, &[])
            .verification
            .expect("verification view");
        assert!(view.is_clean);
        assert!(view.remaining_issues.is_empty());
        assert_eq!(view.score, Some(92));
        assert_eq!(view.band, Some(QualityBand::Good));
    }

    #[test]
    fn tests_view_labels_unknown_categories_with_raw_tag() {
        let mut state = analyzed(json!([]));
        let suite = TestSuite {
            cases: vec![TestCase {
                name: "load".to_string(),
                category: "performance".to_string().into(),
                description: "many rows".to_string(),
                expected: None,
            }],
            code: "def test_load(): ...".to_string(),
        };
        apply(&mut state, Ok(StageResult::TestsGenerated(suite)), 1).expect("tests");

        let tests = Snapshot::capture(&state, &[]).tests.expect("tests view");
        assert_eq!(tests.cases[0].label, "performance");
        assert_eq!(tests.cases[0].category, "performance");
    }

    #[test]
    fn busy_stages_do_not_count_as_artifact_changes() {
        let state = analyzed(json!([]));
        let idle = Snapshot::capture(&state, &[]);
        let busy = Snapshot::capture(&state, &[Stage::Test]);
        assert!(idle.same_artifacts(&busy));
        assert_ne!(idle, busy);
    }
}
