//! Tracing setup and secret redaction for keyprobe
//!
//! Credentials under test must never reach a terminal or a log file in
//! clear text. This crate provides the two halves of that guarantee:
//!
//! - **Redaction**: [`SecretRedactor`] scrubs API keys (`sk-...`), bearer
//!   tokens, e-mail addresses and any explicitly registered secret from free
//!   text, either with a fixed mask or a short correlation hash.
//! - **Subscriber setup**: [`init_tracing`] installs a `tracing` subscriber
//!   writing to stderr so stdout stays reserved for the report.
//!
//! # Example
//!
//! ```rust
//! use logger_redacted::{RedactionConfig, SecretRedactor, redacted_warn};
//!
//! let redactor = SecretRedactor::new(
//!     RedactionConfig::default().with_secret("sk-live-0123456789abcdef"),
//! );
//!
//! redacted_warn!(redactor, "provider echoed {}", "sk-live-0123456789abcdef");
//! ```
//!
//! # Environment
//!
//! `KEYPROBE_LOG` overrides the configured filter directive, using the
//! `tracing_subscriber::EnvFilter` syntax.

pub mod redactor;
pub mod macros;
pub mod config;

pub use redactor::*;
pub use config::*;

#[doc(hidden)]
pub use tracing;

use thiserror::Error;
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Environment variable holding an `EnvFilter` directive
pub const LOG_ENV_VAR: &str = "KEYPROBE_LOG";

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Tracing initialization failed: {0}")]
    InitFailed(String),
}

/// Install the global tracing subscriber
pub fn init_tracing(config: &LoggerConfig) -> Result<(), LoggerError> {
    let env_filter = match EnvFilter::try_from_env(LOG_ENV_VAR) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|e| LoggerError::InvalidFilter(e.to_string()))?,
    };

    match config.format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(config.ansi),
            )
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .json(),
            )
            .try_init(),
    }
    .map_err(|e| LoggerError::InitFailed(e.to_string()))
}
