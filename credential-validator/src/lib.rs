//! # Credential Validator
//!
//! Staged validation of an API credential against an OpenAI-compatible
//! inference service.
//!
//! ## Stages:
//! 1. Format - local checks on the credential shape (fatal gate)
//! 2. Connectivity - `GET /v1/models` with the credential (fatal gate)
//! 3. Model availability - lookup of the configured model, with fallback
//! 4. Completion - one small chat completion request
//!
//! ## Features:
//! - Per-stage results with diagnostics, in execution order
//! - Progressive reporting through [`StageObserver`]
//! - Interruptible runs that keep a consistent partial report
//! - Aggregate summary classification
//! - Credentials are redacted from every recorded diagnostic
//!
//! ```no_run
//! use credential_validator::{Validator, ValidatorConfig};
//!
//! # async fn example() -> credential_validator::Result<()> {
//! let validator = Validator::new(ValidatorConfig::from_env()?)?;
//! let report = validator.run().await;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing))]

pub mod config;
pub mod error;
pub mod format;
pub mod providers;
pub mod report;
pub mod stage;
pub mod validator;

pub use config::*;
pub use error::*;
pub use providers::{OpenAiClient, ProviderApi};
pub use report::{Outcome, RunReport, StageRecord, Summary};
pub use stage::{Stage, StageResult};
pub use validator::{StageObserver, Validator};

/// Result type for validator setup
pub type Result<T> = std::result::Result<T, ValidatorError>;
