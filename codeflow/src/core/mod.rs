//! Deterministic pipeline logic.
//!
//! Core modules are free of I/O. They operate on in-memory state and return
//! deterministic outputs suitable for tests.

pub mod error;
pub mod gate;
pub mod indicator;
pub mod notice;
pub mod payload;
pub mod reconcile;
pub mod store;
pub mod types;
pub mod view;
