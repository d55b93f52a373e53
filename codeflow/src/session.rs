//! A review session: pipeline state, in-flight bookkeeping and the view.
//!
//! Stage calls are split in three so that several can be outstanding at once
//! on a single thread:
//!
//! 1. [`Session::begin`] checks the gate, moves the stage indicator and
//!    snapshots the request body.
//! 2. [`PendingCall::send`] performs the network round-trip without borrowing
//!    the session.
//! 3. [`Session::finish`] reconciles the outcome in arrival order.
//!
//! [`Session::run`] chains the three for callers that wait on each stage.

use tracing::{debug, info, warn};

use crate::core::error::StageError;
use crate::core::gate::{GateRejection, can_run};
use crate::core::notice::Notice;
use crate::core::payload::{StageRequest, build_request};
use crate::core::reconcile::{Applied, apply};
use crate::core::store::PipelineState;
use crate::core::types::{Stage, StageResult};
use crate::core::view::Snapshot;
use crate::io::config::StalePolicy;
use crate::io::service::ReviewService;
use crate::io::view::ViewSink;

/// Identity of one attempted stage call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub stage: Stage,
    /// Session-wide issue order.
    pub seq: u64,
    /// Clear count when the call was issued.
    pub epoch: u64,
    /// Snippet revision the request was built from.
    pub source_revision: u64,
}

/// A stage call whose gate passed and whose body is fixed.
#[derive(Debug, Clone)]
pub struct PendingCall {
    pub ticket: Ticket,
    pub request: StageRequest,
}

impl PendingCall {
    /// Issue the request. Exactly one call to the service per pending call.
    pub async fn send<S: ReviewService + ?Sized>(
        self,
        service: &S,
    ) -> (Ticket, Result<StageResult, StageError>) {
        let outcome = service.invoke(self.ticket.stage, &self.request).await;
        (self.ticket, outcome)
    }
}

/// How a finished call was reconciled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled {
    Applied(Applied),
    Failed(StageError),
    /// Dropped under [`StalePolicy::Discard`].
    Discarded,
}

pub struct Session<V: ViewSink> {
    state: PipelineState,
    policy: StalePolicy,
    view: V,
    epoch: u64,
    next_seq: u64,
    /// Highest applied ticket seq per stage.
    applied_seq: [Option<u64>; 4],
    in_flight: Vec<Ticket>,
}

impl<V: ViewSink> Session<V> {
    pub fn new(language: impl Into<String>, policy: StalePolicy, view: V) -> Self {
        Self {
            state: PipelineState::new(normalize_language(language.into())),
            policy,
            view,
            epoch: 0,
            next_seq: 0,
            applied_seq: [None; 4],
            in_flight: Vec::new(),
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn into_view(self) -> V {
        self.view
    }

    /// Stages with a request outstanding, in issue order.
    pub fn busy(&self) -> Vec<Stage> {
        self.in_flight.iter().map(|ticket| ticket.stage).collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.state, &self.busy())
    }

    /// Push the complete view.
    pub fn show(&mut self) {
        let snapshot = self.snapshot();
        self.view.show(&snapshot);
    }

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.state.set_code(code);
        debug!(revision = self.state.source_revision(), "snippet replaced");
        self.refresh();
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.state.set_language(normalize_language(language.into()));
        self.refresh();
    }

    /// Replace the snippet with the fixed code, if there is any.
    pub fn use_fixed_code(&mut self) -> bool {
        if !self.state.adopt_fixed_code() {
            self.view.notify(&Notice::rejected(GateRejection::FixFirst));
            return false;
        }
        self.view.notify(&Notice::fixed_code_loaded());
        self.refresh();
        true
    }

    /// Reset the pipeline. Outstanding requests are not cancelled.
    pub fn clear(&mut self) {
        self.state.reset();
        self.epoch += 1;
        info!(epoch = self.epoch, in_flight = self.in_flight.len(), "session cleared");
        self.view.notify(&Notice::cleared());
        self.refresh();
    }

    /// Gate `stage` and, if it may run, mark it in flight.
    ///
    /// On rejection nothing changes except a notice.
    pub fn begin(&mut self, stage: Stage) -> Result<PendingCall, GateRejection> {
        if let Err(rejection) = can_run(stage, &self.state) {
            debug!(%stage, %rejection, "stage rejected by gate");
            self.view.notify(&Notice::rejected(rejection));
            return Err(rejection);
        }

        let ticket = Ticket {
            stage,
            seq: self.next_seq,
            epoch: self.epoch,
            source_revision: self.state.source_revision(),
        };
        self.next_seq += 1;
        let request = build_request(stage, &self.state);
        self.state.enter_stage(stage);
        self.in_flight.push(ticket);
        info!(%stage, seq = ticket.seq, "stage started");
        self.refresh();
        Ok(PendingCall { ticket, request })
    }

    /// Reconcile the outcome of a call started with [`Session::begin`].
    pub fn finish(
        &mut self,
        ticket: Ticket,
        outcome: Result<StageResult, StageError>,
    ) -> Settled {
        if let Some(pos) = self.in_flight.iter().position(|t| *t == ticket) {
            self.in_flight.remove(pos);
        }

        if outcome.is_ok() && self.is_stale(&ticket) {
            warn!(stage = %ticket.stage, seq = ticket.seq, "discarding outdated response");
            self.view.notify(&Notice::discarded(ticket.stage));
            self.refresh();
            return Settled::Discarded;
        }

        let applied = apply(&mut self.state, outcome, ticket.source_revision);
        match &applied {
            Ok(result) => {
                let slot = &mut self.applied_seq[ticket.stage.index()];
                *slot = Some(slot.map_or(ticket.seq, |seq| seq.max(ticket.seq)));
                info!(stage = %ticket.stage, seq = ticket.seq, ?result, "stage applied");
            }
            Err(err) => {
                warn!(stage = %ticket.stage, seq = ticket.seq, error = %err, "stage failed");
            }
        }
        self.view.notify(&Notice::settled(ticket.stage, &applied));
        self.refresh();
        match applied {
            Ok(result) => Settled::Applied(result),
            Err(err) => Settled::Failed(err),
        }
    }

    /// Gate, send and reconcile `stage`, waiting for the response.
    pub async fn run<S: ReviewService + ?Sized>(
        &mut self,
        stage: Stage,
        service: &S,
    ) -> Result<Settled, GateRejection> {
        let pending = self.begin(stage)?;
        let (ticket, outcome) = pending.send(service).await;
        Ok(self.finish(ticket, outcome))
    }

    fn is_stale(&self, ticket: &Ticket) -> bool {
        match self.policy {
            StalePolicy::Apply => false,
            StalePolicy::Discard => {
                ticket.epoch != self.epoch
                    || self.applied_seq[ticket.stage.index()].is_some_and(|seq| seq > ticket.seq)
            }
        }
    }

    fn refresh(&mut self) {
        let snapshot = self.snapshot();
        self.view.render(&snapshot);
    }
}

/// Language tags are free-form but compared lower-cased.
fn normalize_language(language: String) -> String {
    language.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notice::Icon;
    use crate::core::types::{TestSuite, VerificationResult};
    use crate::core::view::AnalysisView;
    use crate::test_support::{RecordingView, ScriptedService, bug};

    fn session(policy: StalePolicy) -> Session<RecordingView> {
        Session::new("python", policy, RecordingView::default())
    }

    fn fixed(code: &str) -> Result<StageResult, StageError> {
        Ok(StageResult::Fixed(code.to_string()))
    }

    /// Gate rejections never reach the service and never move the indicator.
    #[tokio::test]
    async fn rejected_stages_send_nothing() {
        let service = ScriptedService::new();
        let mut session = session(StalePolicy::Apply);
        let initial = session.state().clone();

        for stage in Stage::ALL {
            let result = session.run(stage, &service).await;
            assert!(result.is_err(), "{stage} should be gated");
        }

        assert_eq!(service.total_calls(), 0);
        assert_eq!(session.state(), &initial);
        assert_eq!(
            session.view().last_notice().map(|n| n.message.as_str()),
            Some("fix code first")
        );
    }

    #[tokio::test]
    async fn empty_snippet_is_rejected_with_reason() {
        let service = ScriptedService::new();
        let mut session = session(StalePolicy::Apply);
        session.set_code("   ");

        let err = session
            .run(Stage::Analyze, &service)
            .await
            .expect_err("gated");
        assert_eq!(err, GateRejection::NoCode);
        assert_eq!(service.call_count(Stage::Analyze), 0);
    }

    /// The indicator moves when a call is attempted, even if it then fails.
    #[tokio::test]
    async fn indicator_advances_on_attempt_not_success() {
        let service = ScriptedService::new()
            .with(Stage::Test, Err(StageError::Transport("refused".to_string())));
        let mut session = session(StalePolicy::Apply);
        session.set_code("x=1");

        let settled = session.run(Stage::Test, &service).await.expect("not gated");
        assert!(matches!(settled, Settled::Failed(StageError::Transport(_))));
        assert_eq!(session.state().current_stage(), Stage::Test);
        assert!(session.state().tests().is_none());
        assert_eq!(
            session.view().last_notice(),
            Some(&Notice::new("Test generation failed.", Icon::Error))
        );
    }

    #[tokio::test]
    async fn begin_marks_stage_busy_until_finished() {
        let mut session = session(StalePolicy::Apply);
        session.set_code("x=1");

        let pending = session.begin(Stage::Analyze).expect("gate");
        assert_eq!(session.busy(), vec![Stage::Analyze]);
        assert_eq!(
            session.view().snapshots.last().map(|s| s.busy.clone()),
            Some(vec![Stage::Analyze])
        );

        session.finish(pending.ticket, Ok(StageResult::Analyzed(Vec::new())));
        assert!(session.busy().is_empty());
        assert_eq!(session.snapshot().analysis, AnalysisView::Clean);
    }

    /// Default policy: responses are reconciled in arrival order.
    #[tokio::test]
    async fn apply_policy_lets_last_arrival_win() {
        let mut session = session(StalePolicy::Apply);
        session.set_code("x=1");
        settle(
            &mut session,
            Stage::Analyze,
            Ok(StageResult::Analyzed(vec![bug("low", "spacing")])),
        );

        let older = session_begin(&mut session, Stage::Fix);
        let newer = session_begin(&mut session, Stage::Fix);
        session.finish(newer, fixed("newer"));
        let settled = session.finish(older, fixed("older"));

        assert_eq!(settled, Settled::Applied(Applied::Fixed));
        assert_eq!(session.state().fixed_code(), Some("older"));
    }

    /// Opt-in policy: an older response cannot overwrite a newer applied one.
    #[tokio::test]
    async fn discard_policy_keeps_newest_issued() {
        let mut session = session(StalePolicy::Discard);
        session.set_code("x=1");
        settle(
            &mut session,
            Stage::Analyze,
            Ok(StageResult::Analyzed(vec![bug("low", "spacing")])),
        );

        let older = session_begin(&mut session, Stage::Fix);
        let newer = session_begin(&mut session, Stage::Fix);
        session.finish(newer, fixed("newer"));
        let settled = session.finish(older, fixed("older"));

        assert_eq!(settled, Settled::Discarded);
        assert_eq!(session.state().fixed_code(), Some("newer"));
        assert!(session.busy().is_empty());
    }

    #[tokio::test]
    async fn discard_policy_drops_responses_from_before_clear() {
        let mut session = session(StalePolicy::Discard);
        session.set_code("x=1");
        let pending = session_begin(&mut session, Stage::Analyze);
        session.clear();

        let settled = session.finish(pending, Ok(StageResult::Analyzed(vec![bug("high", "t")])));
        assert_eq!(settled, Settled::Discarded);
        assert_eq!(session.state(), &PipelineState::new("python"));
    }

    #[tokio::test]
    async fn apply_policy_reconciles_responses_after_clear() {
        let mut session = session(StalePolicy::Apply);
        session.set_code("x=1");
        let pending = session_begin(&mut session, Stage::Analyze);
        session.clear();

        session.finish(pending, Ok(StageResult::Analyzed(vec![bug("high", "t")])));
        assert!(session.state().has_bugs());
    }

    /// Editing while Analyze is outstanding still reconciles the response.
    #[tokio::test]
    async fn edit_mid_flight_is_not_cancellation() {
        let mut session = session(StalePolicy::Discard);
        session.set_code("x=1");
        let pending = session_begin(&mut session, Stage::Analyze);
        session.set_code("x=2");

        let settled = session.finish(pending, Ok(StageResult::Analyzed(vec![bug("low", "t")])));
        assert_eq!(settled, Settled::Applied(Applied::Analyzed { total: 1 }));
        assert!(session.state().analysis_stale());
        assert!(session.snapshot().analysis_stale);
    }

    #[tokio::test]
    async fn clear_after_full_pipeline_restores_initial_state() {
        let service = ScriptedService::new()
            .with(
                Stage::Analyze,
                Ok(StageResult::Analyzed(vec![bug("medium", "t")])),
            )
            .with(Stage::Fix, fixed("x = 1"))
            .with(Stage::Test, Ok(StageResult::TestsGenerated(TestSuite::default())))
            .with(
                Stage::Verify,
                Ok(StageResult::Verified(VerificationResult::default())),
            );
        let mut session = session(StalePolicy::Apply);
        let initial_state = session.state().clone();
        let initial_view = session.snapshot();

        session.set_code("x=1");
        for stage in Stage::ALL {
            let settled = session.run(stage, &service).await.expect("gate");
            assert!(matches!(settled, Settled::Applied(_)), "{stage}: {settled:?}");
        }
        session.clear();

        assert_eq!(session.state(), &initial_state);
        assert_eq!(session.snapshot(), initial_view);
        assert_eq!(session.view().last_notice(), Some(&Notice::cleared()));
    }

    #[tokio::test]
    async fn use_fixed_code_replaces_snippet() {
        let mut session = session(StalePolicy::Apply);
        assert!(!session.use_fixed_code());

        session.set_code("x=1");
        settle(
            &mut session,
            Stage::Analyze,
            Ok(StageResult::Analyzed(vec![bug("low", "t")])),
        );
        settle(&mut session, Stage::Fix, fixed("x = 1"));

        assert!(session.use_fixed_code());
        assert_eq!(session.state().source().code, "x = 1");
        assert!(session.state().analysis_stale());
    }

    #[test]
    fn language_tags_are_lower_cased() {
        let mut session = session(StalePolicy::Apply);
        session.set_language(" Rust ");
        assert_eq!(session.state().source().language, "rust");
    }

    fn session_begin(session: &mut Session<RecordingView>, stage: Stage) -> Ticket {
        session.begin(stage).expect("gate passes").ticket
    }

    fn settle(
        session: &mut Session<RecordingView>,
        stage: Stage,
        outcome: Result<StageResult, StageError>,
    ) -> Settled {
        let ticket = session_begin(session, stage);
        session.finish(ticket, outcome)
    }
}
