//! Command-line arguments

use clap::{Parser, ValueEnum};
use credential_validator::ValidatorConfig;
use logger_redacted::{LogFormat, LoggerConfig};
use std::time::Duration;

/// Check that an OpenAI-compatible API key works, in four staged tests
///
/// The key is read from `OPENAI_API_KEY`, optionally seeded from a `.env`
/// file in the working directory.
#[derive(Parser, Debug)]
#[command(name = "keyprobe", version)]
pub struct Args {
    /// Model to look up and use for the completion test [env: OPENAI_MODEL]
    #[arg(short, long)]
    pub model: Option<String>,

    /// API base URL, with or without the `/v1` suffix [env: OPENAI_API_BASE]
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Timeout for model lookup and completion requests [env: OPENAI_TIMEOUT_SECS]
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Timeout for the connectivity check
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub connect_timeout: Option<u64>,

    /// Print the report as JSON instead of the console summary
    #[arg(long)]
    pub json: bool,

    /// Do not load a `.env` file
    #[arg(long)]
    pub no_dotenv: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", value_parser = clap::builder::FalseyValueParser::new())]
    pub no_color: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value_t = LogFormatArg::Text, env = "KEYPROBE_LOG_FORMAT")]
    pub log_format: LogFormatArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl Args {
    /// Resolve the validator configuration from the environment plus flag overrides
    ///
    /// # Errors
    ///
    /// Returns an error if an environment value cannot be parsed.
    pub fn validator_config(&self) -> credential_validator::Result<ValidatorConfig> {
        self.apply_overrides(ValidatorConfig::from_env()?)
    }

    fn apply_overrides(
        &self,
        mut config: ValidatorConfig,
    ) -> credential_validator::Result<ValidatorConfig> {
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(base) = &self.base_url {
            config = config.with_endpoint_base(base.clone());
        }
        if let Some(secs) = self.timeout {
            config = config.with_request_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.connect_timeout {
            config = config.with_connectivity_timeout(Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }

    pub fn logger_config(&self) -> LoggerConfig {
        let base = if self.verbose {
            LoggerConfig::verbose()
        } else {
            LoggerConfig::default()
        };

        LoggerConfig {
            format: match self.log_format {
                LogFormatArg::Text => LogFormat::Text,
                LogFormatArg::Json => LogFormat::Json,
            },
            ansi: !self.no_color,
            ..base
        }
    }
}
