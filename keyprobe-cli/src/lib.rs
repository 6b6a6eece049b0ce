//! # keyprobe
//!
//! Command-line front end for `credential-validator`.
//!
//! ```bash
//! # Test the key from OPENAI_API_KEY (or .env)
//! keyprobe
//!
//! # Test a specific model through a proxy, machine-readable output
//! keyprobe --model gpt-4o-mini --base-url http://localhost:4000 --json
//! ```
//!
//! Exit status is 0 when every stage passed, 1 otherwise, and 130 when the
//! run was interrupted.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing))]

pub mod cli;
pub mod output;

pub use cli::{Args, LogFormatArg};
pub use output::{ConsoleReporter, JsonReport};

use credential_validator::RunReport;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_INTERRUPTED: u8 = 130;

/// Process exit status for a finished run
pub fn exit_status(report: &RunReport) -> u8 {
    if report.was_interrupted() {
        EXIT_INTERRUPTED
    } else if report.summary().outcome.is_success() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILURE
    }
}
