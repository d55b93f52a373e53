//! View boundary: where snapshots and notices go.

use std::io::Write;

use tracing::warn;

use crate::core::notice::Notice;
use crate::core::view::Snapshot;
use crate::io::report::ReportEngine;

/// Receives state snapshots and transient notices from a session.
pub trait ViewSink {
    /// Called after every state transition.
    fn render(&mut self, snapshot: &Snapshot);

    fn notify(&mut self, notice: &Notice);

    /// Explicit request for the complete view.
    fn show(&mut self, snapshot: &Snapshot) {
        self.render(snapshot);
    }
}

/// Terminal adapter: prints the full report when artifacts change and a
/// one-line stage strip otherwise.
pub struct TerminalView<W: Write> {
    out: W,
    engine: ReportEngine,
    /// When false, only notices and explicit `show` calls are printed.
    live: bool,
    last: Option<Snapshot>,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W, live: bool) -> Self {
        Self {
            out,
            engine: ReportEngine::new(),
            live,
            last: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn print_report(&mut self, snapshot: &Snapshot) {
        let rendered = self.engine.render_report(snapshot);
        self.emit(rendered);
        self.last = Some(snapshot.clone());
    }

    fn emit(&mut self, rendered: anyhow::Result<String>) {
        let text = match rendered {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed to render view");
                return;
            }
        };
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            warn!(error = %err, "failed to write view");
        }
    }
}

impl<W: Write> ViewSink for TerminalView<W> {
    fn render(&mut self, snapshot: &Snapshot) {
        if !self.live {
            return;
        }
        let changed = self
            .last
            .as_ref()
            .is_none_or(|last| !last.same_artifacts(snapshot));
        if changed {
            self.print_report(snapshot);
        } else {
            let rendered = self.engine.render_status(snapshot);
            self.emit(rendered);
            self.last = Some(snapshot.clone());
        }
    }

    fn notify(&mut self, notice: &Notice) {
        self.emit(Ok(format!("{notice}\n")));
    }

    fn show(&mut self, snapshot: &Snapshot) {
        self.print_report(snapshot);
    }
}
