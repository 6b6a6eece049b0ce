//! Console and JSON rendering of a validation run

use chrono::{DateTime, Utc};
use colored::Colorize;
use credential_validator::{
    Outcome, RunReport, Stage, StageObserver, StageRecord, StageResult, Summary, ValidatorConfig,
};
use logger_redacted::mask_secret;
use serde::Serialize;
use std::io::{self, Write};
use tracing::debug;

const RULE_WIDTH: usize = 60;

fn action(stage: Stage) -> &'static str {
    match stage {
        Stage::Format => "Checking API key format...",
        Stage::Connectivity => "Testing connectivity...",
        Stage::ModelAvailability => "Checking model availability...",
        Stage::Completion => "Testing simple completion...",
    }
}

/// Writes progress lines as stages finish, then the summary
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn banner(&mut self, title: &str) -> io::Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(self.out, "{}", rule.cyan())?;
        writeln!(self.out, "{}", title.cyan())?;
        writeln!(self.out, "{}", rule.cyan())
    }

    /// # Errors
    ///
    /// Fails if the output cannot be written.
    pub fn header(&mut self, config: &ValidatorConfig) -> io::Result<()> {
        self.banner("🤖 OpenAI API Key Tester")?;
        let credential = config.credential_str();
        if !credential.is_empty() {
            writeln!(self.out, "Key:      {}", mask_secret(credential))?;
        }
        writeln!(self.out, "Model:    {}", config.model_id)?;
        writeln!(self.out, "Endpoint: {}", config.api_base())?;
        writeln!(self.out)
    }

    fn stage_line(&mut self, record: &StageRecord) -> io::Result<()> {
        match &record.result {
            StageResult::Passed { detail } => {
                writeln!(self.out, "{} {}", "✅".green(), detail.green())?;
            }
            StageResult::Failed { error } if record.stage.is_fatal_gate() => {
                writeln!(self.out, "{} {}", "❌".red(), error.to_string().red())?;
            }
            StageResult::Failed { error } => {
                writeln!(self.out, "{}  {}", "⚠️".yellow(), error.to_string().yellow())?;
            }
        }
        writeln!(self.out)
    }

    /// # Errors
    ///
    /// Fails if the output cannot be written.
    pub fn summary(&mut self, report: &RunReport) -> io::Result<()> {
        if report.was_interrupted() {
            writeln!(self.out, "{}", "Testing interrupted by user.".yellow())?;
            writeln!(self.out)?;
        }

        self.banner("📊 Test Summary")?;
        for entry in report.entries() {
            let status = if entry.result.is_passed() {
                "✅ PASS".green()
            } else {
                "❌ FAIL".red()
            };
            writeln!(self.out, "{}: {}", entry.stage.title(), status)?;
        }

        let summary = report.summary();
        writeln!(self.out)?;
        writeln!(self.out, "Overall: {summary}")?;

        if report.was_interrupted() {
            return writeln!(
                self.out,
                "{}",
                "⚠️  Run interrupted; remaining stages were not tested.".yellow()
            );
        }

        match summary.outcome {
            Outcome::AllPassed => writeln!(
                self.out,
                "{}",
                "🎉 All tests passed! Your OpenAI API key is working correctly.".green()
            ),
            Outcome::PartialPass => writeln!(
                self.out,
                "{}",
                "⚠️  Some tests passed, but there are issues to address.".yellow()
            ),
            Outcome::AllFailed => writeln!(
                self.out,
                "{}",
                "💥 All tests failed. Please check your configuration.".red()
            ),
        }
    }
}

impl<W: Write> StageObserver for ConsoleReporter<W> {
    fn stage_started(&mut self, stage: Stage) {
        let line = format!("Step {}: {}", stage.step(), action(stage));
        if let Err(e) = writeln!(self.out, "{}", line.blue()).and_then(|()| self.out.flush()) {
            debug!(error = %e, "Failed to write progress line");
        }
    }

    fn stage_finished(&mut self, record: &StageRecord) {
        if let Err(e) = self.stage_line(record).and_then(|()| self.out.flush()) {
            debug!(error = %e, "Failed to write stage result");
        }
    }
}

/// Machine-readable form of one run
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub checked_at: DateTime<Utc>,
    pub key: String,
    pub model: &'a str,
    pub endpoint: String,
    pub summary: Summary,
    #[serde(flatten)]
    pub report: &'a RunReport,
}

impl<'a> JsonReport<'a> {
    pub fn new(config: &'a ValidatorConfig, report: &'a RunReport) -> Self {
        Self {
            checked_at: Utc::now(),
            key: mask_secret(config.credential_str()),
            model: &config.model_id,
            endpoint: config.api_base(),
            summary: report.summary(),
            report,
        }
    }

    /// # Errors
    ///
    /// Fails if serialization or the write fails.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut out, self)?;
        writeln!(out)
    }
}
