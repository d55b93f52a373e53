//! Failure taxonomy for a single stage invocation.

use thiserror::Error;

use crate::core::gate::GateRejection;

/// Every way a stage invocation can fail.
///
/// Missing optional response fields are not errors; they are defaulted while
/// parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    /// Prerequisites not met; no request was sent.
    #[error(transparent)]
    Gate(#[from] GateRejection),
    /// Network or protocol failure without a usable error body.
    #[error("transport error: {0}")]
    Transport(String),
    /// The service answered but flagged an error.
    #[error("{0}")]
    Domain(String),
}
