//! Side-effecting adapters: configuration, the review service, the terminal.

pub mod config;
pub mod report;
pub mod service;
pub mod view;
pub mod wire;
