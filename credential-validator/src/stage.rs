//! Pipeline stages and their results

use crate::ProbeError;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Format,
    Connectivity,
    ModelAvailability,
    Completion,
}

impl Stage {
    /// Execution order
    pub const ALL: [Stage; 4] = [
        Stage::Format,
        Stage::Connectivity,
        Stage::ModelAvailability,
        Stage::Completion,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Format => "format",
            Stage::Connectivity => "connectivity",
            Stage::ModelAvailability => "model_availability",
            Stage::Completion => "completion",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::Format => "Format",
            Stage::Connectivity => "Connectivity",
            Stage::ModelAvailability => "Model Availability",
            Stage::Completion => "Completion",
        }
    }

    /// 1-based position in the pipeline
    pub fn step(self) -> usize {
        match self {
            Stage::Format => 1,
            Stage::Connectivity => 2,
            Stage::ModelAvailability => 3,
            Stage::Completion => 4,
        }
    }

    /// A failure here stops the pipeline
    pub fn is_fatal_gate(self) -> bool {
        matches!(self, Stage::Format | Stage::Connectivity)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one executed stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageResult {
    Passed { detail: String },
    Failed { error: ProbeError },
}

impl StageResult {
    pub fn passed(detail: impl Into<String>) -> Self {
        StageResult::Passed { detail: detail.into() }
    }

    pub fn failed(error: ProbeError) -> Self {
        StageResult::Failed { error }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, StageResult::Passed { .. })
    }

    pub fn error(&self) -> Option<&ProbeError> {
        match self {
            StageResult::Passed { .. } => None,
            StageResult::Failed { error } => Some(error),
        }
    }

    /// Human readable diagnostic for either outcome
    pub fn detail(&self) -> String {
        match self {
            StageResult::Passed { detail } => detail.clone(),
            StageResult::Failed { error } => error.to_string(),
        }
    }
}
