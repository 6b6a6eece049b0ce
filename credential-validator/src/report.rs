//! Run report and summary classification

use crate::{Stage, StageResult};
use serde::Serialize;
use std::fmt;

/// One executed stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub result: StageResult,
    pub latency_ms: u64,
}

/// Ordered record of the stages executed in one run
///
/// Only the validator appends to a report, so it never holds a stage that did
/// not run, and never holds a stage twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    entries: Vec<StageRecord>,
    interrupted: bool,
}

impl RunReport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, record: StageRecord) {
        debug_assert!(
            self.entries
                .last()
                .map_or(true, |last| last.stage.step() < record.stage.step()),
            "stages must be recorded once and in order"
        );
        self.entries.push(record);
    }

    pub(crate) fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    /// Entries in execution order
    pub fn entries(&self) -> &[StageRecord] {
        &self.entries
    }

    pub fn get(&self, stage: Stage) -> Option<&StageResult> {
        self.entries
            .iter()
            .find(|entry| entry.stage == stage)
            .map(|entry| &entry.result)
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.entries.iter().map(|entry| entry.stage).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The run was stopped by an external interrupt before it finished
    pub fn was_interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn summary(&self) -> Summary {
        Summary::from(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    AllPassed,
    PartialPass,
    AllFailed,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::AllPassed)
    }
}

/// Aggregate counts over a [`RunReport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub passed: usize,
    pub total: usize,
    pub outcome: Outcome,
}

impl From<&RunReport> for Summary {
    fn from(report: &RunReport) -> Self {
        let total = report.len();
        let passed = report
            .entries()
            .iter()
            .filter(|entry| entry.result.is_passed())
            .count();

        let outcome = if total == 0 || passed == 0 {
            Outcome::AllFailed
        } else if passed == total {
            Outcome::AllPassed
        } else {
            Outcome::PartialPass
        };

        Self {
            passed,
            total,
            outcome,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} tests passed", self.passed, self.total)
    }
}
