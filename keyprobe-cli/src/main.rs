use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use credential_validator::Validator;
use keyprobe_cli::{exit_status, Args, ConsoleReporter, JsonReport, EXIT_FAILURE};
use logger_redacted::{init_tracing, redacted_error, SecretRedactor};
use std::process::ExitCode;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(status) => ExitCode::from(status),
        Err(e) => {
            let redactor = SecretRedactor::default();
            redacted_error!(redactor, "keyprobe failed: {e:#}");
            eprintln!("{} {}", "Unexpected error:".red(), redactor.redact(&format!("{e:#}")));
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(args: Args) -> Result<u8> {
    // Load .env before tracing so KEYPROBE_LOG can come from it
    let dotenv = if args.no_dotenv {
        None
    } else {
        match dotenvy::dotenv() {
            Ok(path) => Some(path),
            Err(e) if e.not_found() => None,
            Err(e) => return Err(e).context("Failed to load .env file"),
        }
    };

    // Env-backed flags (NO_COLOR, KEYPROBE_LOG_FORMAT) must see .env values too
    let args = if dotenv.is_some() { Args::parse() } else { args };
    if args.no_color {
        colored::control::set_override(false);
    }

    init_tracing(&args.logger_config()).context("Failed to initialize logging")?;
    if let Some(path) = dotenv {
        debug!(path = %path.display(), "Loaded environment file");
    }

    let config = args.validator_config().context("Invalid configuration")?;
    info!(model = %config.model_id, endpoint = %config.api_base(), "Starting key validation");
    let validator = Validator::new(config).context("Failed to create validator")?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Unable to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    let report = if args.json {
        let report = validator.run_until(shutdown, &mut ()).await;
        JsonReport::new(validator.config(), &report)
            .write_to(std::io::stdout().lock())
            .context("Failed to write report")?;
        report
    } else {
        let mut reporter = ConsoleReporter::stdout();
        reporter
            .header(validator.config())
            .context("Failed to write header")?;
        let report = validator.run_until(shutdown, &mut reporter).await;
        reporter.summary(&report).context("Failed to write summary")?;
        report
    };

    let summary = report.summary();
    info!(passed = summary.passed, total = summary.total, outcome = ?summary.outcome, "Validation finished");
    Ok(exit_status(&report))
}
