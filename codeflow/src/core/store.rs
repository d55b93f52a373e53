//! Session-owned pipeline state: the user's snippet plus every stage artifact.
//!
//! Artifacts are only written through the `pub(crate)` mutators used by the
//! reconciler, and each write replaces the previous artifact wholesale.

use serde::Serialize;

use crate::core::types::{Bug, Stage, TestSuite, VerificationResult};

/// Code under review and its declared language tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceSnippet {
    pub code: String,
    pub language: String,
}

impl SourceSnippet {
    /// Code with surrounding whitespace removed; this is what gets gated and sent.
    pub fn trimmed(&self) -> &str {
        self.code.trim()
    }

    pub fn is_empty(&self) -> bool {
        self.trimmed().is_empty()
    }
}

/// Single source of truth for one review session.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState {
    source: SourceSnippet,
    /// Bumped on every snippet edit; used to tell whether the bug set is stale.
    source_revision: u64,
    current_stage: Stage,
    /// `None` until Analyze succeeds; `Some(vec![])` means the code is clean.
    bugs: Option<Vec<Bug>>,
    analyzed_revision: u64,
    fixed_code: Option<String>,
    tests: Option<TestSuite>,
    verification: Option<VerificationResult>,
}

impl PipelineState {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            source: SourceSnippet {
                code: String::new(),
                language: language.into(),
            },
            source_revision: 0,
            current_stage: Stage::Analyze,
            bugs: None,
            analyzed_revision: 0,
            fixed_code: None,
            tests: None,
            verification: None,
        }
    }

    pub fn source(&self) -> &SourceSnippet {
        &self.source
    }

    pub fn source_revision(&self) -> u64 {
        self.source_revision
    }

    pub fn current_stage(&self) -> Stage {
        self.current_stage
    }

    /// Latest bug set, or `None` if Analyze has not succeeded yet.
    pub fn bugs(&self) -> Option<&[Bug]> {
        self.bugs.as_deref()
    }

    pub fn has_bugs(&self) -> bool {
        self.bugs.as_ref().is_some_and(|bugs| !bugs.is_empty())
    }

    /// True when the snippet was edited after the bug set was produced.
    pub fn analysis_stale(&self) -> bool {
        self.bugs.is_some() && self.analyzed_revision != self.source_revision
    }

    pub fn fixed_code(&self) -> Option<&str> {
        self.fixed_code.as_deref()
    }

    pub fn has_fixed_code(&self) -> bool {
        self.fixed_code
            .as_deref()
            .is_some_and(|code| !code.trim().is_empty())
    }

    pub fn tests(&self) -> Option<&TestSuite> {
        self.tests.as_ref()
    }

    pub fn verification(&self) -> Option<&VerificationResult> {
        self.verification.as_ref()
    }

    /// Replace the snippet text (user edit).
    pub fn set_code(&mut self, code: impl Into<String>) {
        self.source.code = code.into();
        self.source_revision += 1;
    }

    /// Select a different language tag. Does not count as a code edit.
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.source.language = language.into();
    }

    /// Copy the fixed code into the snippet. Returns `false` when there is none.
    pub fn adopt_fixed_code(&mut self) -> bool {
        match self.fixed_code.clone() {
            Some(code) if !code.trim().is_empty() => {
                self.set_code(code);
                true
            }
            _ => false,
        }
    }

    /// Return to the initial session state, keeping the selected language.
    pub fn reset(&mut self) {
        *self = PipelineState::new(std::mem::take(&mut self.source.language));
    }

    pub(crate) fn enter_stage(&mut self, stage: Stage) {
        self.current_stage = stage;
    }

    pub(crate) fn replace_bugs(&mut self, bugs: Vec<Bug>, revision: u64) {
        self.bugs = Some(bugs);
        self.analyzed_revision = revision;
    }

    pub(crate) fn replace_fixed_code(&mut self, code: String) {
        self.fixed_code = Some(code);
        self.verification = None;
    }

    pub(crate) fn replace_tests(&mut self, tests: TestSuite) {
        self.tests = Some(tests);
    }

    pub(crate) fn replace_verification(&mut self, verification: VerificationResult) {
        self.verification = Some(verification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_is_gated_on_trimmed_text() {
        let mut state = PipelineState::new("python");
        state.set_code("  \n\t ");
        assert!(state.source().is_empty());
        state.set_code("  x = 1\n");
        assert_eq!(state.source().trimmed(), "x = 1");
    }

    #[test]
    fn editing_after_analyze_marks_bugs_stale() {
        let mut state = PipelineState::new("python");
        state.set_code("x=1");
        state.replace_bugs(Vec::new(), state.source_revision());
        assert!(!state.analysis_stale());

        state.set_code("x=2");
        assert!(state.analysis_stale());
    }

    #[test]
    fn language_change_is_not_an_edit() {
        let mut state = PipelineState::new("python");
        state.set_code("x=1");
        state.replace_bugs(Vec::new(), state.source_revision());
        state.set_language("javascript");
        assert!(!state.analysis_stale());
    }

    #[test]
    fn replacing_fixed_code_drops_verification() {
        let mut state = PipelineState::new("python");
        state.replace_fixed_code("a".to_string());
        state.replace_verification(VerificationResult::default());
        state.replace_fixed_code("b".to_string());
        assert!(state.verification().is_none());
        assert_eq!(state.fixed_code(), Some("b"));
    }

    #[test]
    fn adopt_fixed_code_requires_fixed_code() {
        let mut state = PipelineState::new("python");
        assert!(!state.adopt_fixed_code());

        state.replace_fixed_code("x = 1".to_string());
        assert!(state.adopt_fixed_code());
        assert_eq!(state.source().code, "x = 1");
    }

    #[test]
    fn reset_keeps_language_and_drops_everything_else() {
        let mut state = PipelineState::new("rust");
        state.set_code("fn main() {}");
        state.enter_stage(Stage::Verify);
        state.replace_bugs(Vec::new(), 1);
        state.replace_fixed_code("fn main() {}".to_string());
        state.replace_tests(TestSuite::default());
        state.replace_verification(VerificationResult::default());

        state.reset();
        assert_eq!(state, PipelineState::new("rust"));
    }
}
