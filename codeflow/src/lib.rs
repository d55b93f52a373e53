//! Client-side orchestrator for a four-stage code review pipeline:
//! Analyze, Fix, Generate Tests and Verify.
//!
//! The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (gating, reconciliation, view model).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting adapters (config files, HTTP service, terminal).
//!   Behind traits so tests can script them.
//!
//! [`session`] ties the two together; [`pipeline`] and [`repl`] drive a
//! session for the `review` and `session` commands.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod repl;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
