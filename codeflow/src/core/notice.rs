//! Transient user feedback for every pipeline event.

use std::fmt;

use serde::Serialize;

use crate::core::error::StageError;
use crate::core::gate::GateRejection;
use crate::core::reconcile::Applied;
use crate::core::types::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Icon {
    Success,
    Warning,
    Error,
    Bug,
    Celebrate,
    Tests,
    Shield,
    Trash,
    Load,
}

impl Icon {
    pub fn glyph(self) -> &'static str {
        match self {
            Icon::Success => "✅",
            Icon::Warning => "⚠️",
            Icon::Error => "❌",
            Icon::Bug => "🐛",
            Icon::Celebrate => "🎉",
            Icon::Tests => "🧪",
            Icon::Shield => "🛡️",
            Icon::Trash => "🗑️",
            Icon::Load => "⬅️",
        }
    }
}

/// A (message, icon) pair for the notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub message: String,
    pub icon: Icon,
}

impl Notice {
    pub fn new(message: impl Into<String>, icon: Icon) -> Self {
        Self {
            message: message.into(),
            icon,
        }
    }

    pub fn rejected(rejection: GateRejection) -> Self {
        Notice::new(rejection.to_string(), Icon::Warning)
    }

    pub fn cleared() -> Self {
        Notice::new("Everything cleared", Icon::Trash)
    }

    pub fn fixed_code_loaded() -> Self {
        Notice::new("Fixed code loaded into editor", Icon::Load)
    }

    /// A response that arrived after a newer one (or after a clear) was dropped.
    pub fn discarded(stage: Stage) -> Self {
        Notice::new(
            format!("Ignored an outdated {stage} response"),
            Icon::Warning,
        )
    }

    /// Feedback for a settled stage call.
    pub fn settled(stage: Stage, outcome: &Result<Applied, StageError>) -> Self {
        match outcome {
            Ok(applied) => Notice::applied(*applied),
            Err(StageError::Gate(rejection)) => Notice::rejected(*rejection),
            Err(StageError::Domain(message)) => Notice::new(message.clone(), Icon::Error),
            Err(StageError::Transport(_)) => Notice::new(transport_message(stage), Icon::Error),
        }
    }

    fn applied(applied: Applied) -> Self {
        match applied {
            Applied::Analyzed { total: 0 } => Notice::new("Your code is clean!", Icon::Celebrate),
            Applied::Analyzed { total } => {
                Notice::new(format!("Found {total} {}", plural(total, "issue")), Icon::Bug)
            }
            Applied::Fixed => Notice::new("All bugs fixed!", Icon::Success),
            Applied::TestsGenerated { total } => Notice::new(
                format!("{total} {} generated", plural(total, "test case")),
                Icon::Tests,
            ),
            Applied::Verified { clean: true } => {
                Notice::new("Code verified clean!", Icon::Shield)
            }
            Applied::Verified { clean: false } => {
                Notice::new("Some issues remain", Icon::Warning)
            }
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.icon.glyph(), self.message)
    }
}

fn transport_message(stage: Stage) -> &'static str {
    match stage {
        Stage::Analyze => "Server connection failed. Try again.",
        Stage::Fix => "Fix failed. Try again.",
        Stage::Test => "Test generation failed.",
        Stage::Verify => "Verification failed.",
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        noun.to_string()
    } else {
        format!("{noun}s")
    }
}
