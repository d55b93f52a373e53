//! Stable exit codes for codeflow CLI commands.

/// Command succeeded; for `review`, the code is clean or verified clean.
pub const OK: i32 = 0;
/// Invalid config or input, unreadable file, or a stage rejected for missing input.
pub const INVALID: i32 = 1;
/// `codeflow review` finished but Verify reported remaining issues.
pub const ISSUES_REMAIN: i32 = 2;
/// `codeflow review` stopped because a stage call failed.
pub const STAGE_FAILED: i32 = 3;
