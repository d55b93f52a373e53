//! Test-only doubles for the review service and the view sink.

use std::cell::RefCell;
use std::collections::VecDeque;

use async_trait::async_trait;
use serde_json::json;

use crate::core::error::StageError;
use crate::core::notice::Notice;
use crate::core::payload::StageRequest;
use crate::core::types::{Bug, Stage, StageResult};
use crate::core::view::Snapshot;
use crate::io::service::ReviewService;
use crate::io::view::ViewSink;

/// Create a bug with the given severity tag and title.
pub fn bug(severity: &str, title: &str) -> Bug {
    serde_json::from_value(json!({
        "severity": severity,
        "title": title,
        "description": format!("{title} description"),
    }))
    .expect("bug fixture")
}

/// Create a bug with code excerpts and a line number.
pub fn bug_at(severity: &str, title: &str, line: u32, original: &str, fixed: &str) -> Bug {
    Bug {
        line: Some(line),
        original_code: original.to_string(),
        fixed_code: fixed.to_string(),
        ..bug(severity, title)
    }
}

/// Review service that replays queued outcomes per stage and records every call.
///
/// A stage with nothing queued answers with a transport error.
#[derive(Debug, Default)]
pub struct ScriptedService {
    scripts: RefCell<[VecDeque<Result<StageResult, StageError>>; 4]>,
    calls: RefCell<Vec<(Stage, StageRequest)>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `outcome` for the next call of `stage`.
    pub fn with(self, stage: Stage, outcome: Result<StageResult, StageError>) -> Self {
        self.push(stage, outcome);
        self
    }

    pub fn push(&self, stage: Stage, outcome: Result<StageResult, StageError>) {
        self.scripts.borrow_mut()[stage.index()].push_back(outcome);
    }

    pub fn calls(&self) -> Vec<(Stage, StageRequest)> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self, stage: Stage) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|(called, _)| *called == stage)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.borrow().len()
    }
}

#[async_trait(?Send)]
impl ReviewService for ScriptedService {
    async fn invoke(
        &self,
        stage: Stage,
        request: &StageRequest,
    ) -> Result<StageResult, StageError> {
        self.calls.borrow_mut().push((stage, request.clone()));
        self.scripts.borrow_mut()[stage.index()]
            .pop_front()
            .unwrap_or_else(|| Err(StageError::Transport(format!("no scripted {stage} outcome"))))
    }
}

/// View sink that keeps everything it is given.
#[derive(Debug, Default)]
pub struct RecordingView {
    pub snapshots: Vec<Snapshot>,
    pub notices: Vec<Notice>,
    /// Number of explicit full-view requests.
    pub shown: usize,
}

impl RecordingView {
    pub fn last_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }
}

impl ViewSink for RecordingView {
    fn render(&mut self, snapshot: &Snapshot) {
        self.snapshots.push(snapshot.clone());
    }

    fn notify(&mut self, notice: &Notice) {
        self.notices.push(notice.clone());
    }

    fn show(&mut self, snapshot: &Snapshot) {
        self.shown += 1;
        self.render(snapshot);
    }
}
