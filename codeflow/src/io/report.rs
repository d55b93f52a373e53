//! Text rendering of session snapshots.

use anyhow::Result;
use minijinja::{Environment, context};

use crate::core::view::Snapshot;

const STAGES_TEMPLATE: &str = include_str!("templates/stages.txt");
const REPORT_TEMPLATE: &str = include_str!("templates/report.txt");

/// Template engine wrapper around minijinja.
pub struct ReportEngine {
    env: Environment<'static>,
}

impl ReportEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_template("stages", STAGES_TEMPLATE)
            .expect("stages template should be valid");
        env.add_template("report", REPORT_TEMPLATE)
            .expect("report template should be valid");
        Self { env }
    }

    /// Stage strip plus busy line.
    pub fn render_status(&self, snapshot: &Snapshot) -> Result<String> {
        let template = self.env.get_template("stages")?;
        Ok(template.render(context! { s => snapshot })?)
    }

    /// Everything the session currently shows.
    pub fn render_report(&self, snapshot: &Snapshot) -> Result<String> {
        let template = self.env.get_template("report")?;
        Ok(template.render(context! { s => snapshot })?)
    }
}

impl Default for ReportEngine {
    fn default() -> Self {
        Self::new()
    }
}
