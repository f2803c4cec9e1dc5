//! Aggregated outcome of a pipeline run.

use super::{Diagnostic, PersistedFile, Severity, StageKind, StageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    /// No fatal error and no stage errors.
    Success,
    /// Some stages failed but others completed.
    PartialFailure,
    /// The run aborted before producing its primary artifacts.
    Failure,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::PartialFailure => write!(f, "partial failure"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

impl RunStatus {
    /// Derives the terminal status from the recorded stage results.
    ///
    /// An aborted run is a `Failure` unless a validation artifact was already
    /// produced, in which case it degrades to `PartialFailure`. A run that
    /// reached the end is a `PartialFailure` if any stage failed or any
    /// error-severity diagnostic was recorded.
    #[must_use]
    pub fn aggregate(stages: &[StageResult], diagnostics: &[Diagnostic], aborted: bool) -> Self {
        if aborted {
            let produced_validation = stages
                .iter()
                .any(|s| s.stage.is_validation() && s.is_success());
            return if produced_validation {
                Self::PartialFailure
            } else {
                Self::Failure
            };
        }

        let any_failed = stages.iter().any(StageResult::is_failure);
        let any_error = diagnostics.iter().any(|d| d.severity >= Severity::Error);
        if any_failed || any_error {
            Self::PartialFailure
        } else {
            Self::Success
        }
    }
}

/// Everything a run produced: per-stage results, diagnostics and status.
///
/// Finalized exactly once, after the last applicable stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Unique identifier of the run.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Total run time.
    pub duration_ms: f64,
    /// Terminal status.
    pub status: RunStatus,
    /// Stage results in execution order.
    pub stages: Vec<StageResult>,
    /// Every diagnostic recorded during the run, in order.
    pub diagnostics: Vec<Diagnostic>,
    /// The message of the first fatal error, if the run aborted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fatal_message: Option<String>,
}

impl RunOutcome {
    /// Returns true if the run succeeded without errors.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Returns the first result recorded for a stage kind.
    #[must_use]
    pub fn stage(&self, kind: StageKind) -> Option<&StageResult> {
        self.stages.iter().find(|s| s.stage == kind)
    }

    /// Returns all results recorded for a stage kind.
    pub fn stages_of(&self, kind: StageKind) -> impl Iterator<Item = &StageResult> {
        self.stages.iter().filter(move |s| s.stage == kind)
    }

    /// Returns the export result for one format.
    #[must_use]
    pub fn export(&self, format: &str) -> Option<&StageResult> {
        self.stages
            .iter()
            .find(|s| s.stage == StageKind::FormatExport && s.target.as_deref() == Some(format))
    }

    /// Returns true if the stage was attempted (not skipped and not absent).
    #[must_use]
    pub fn ran(&self, kind: StageKind) -> bool {
        self.stages_of(kind)
            .any(|s| s.status != super::StageStatus::Skipped)
    }

    /// Returns every persisted file, in write order.
    pub fn files(&self) -> impl Iterator<Item = &PersistedFile> {
        self.stages
            .iter()
            .filter_map(|s| s.artifact.as_ref())
            .flat_map(|a| a.files.iter())
    }

    /// Returns diagnostics at or above a severity.
    pub fn diagnostics_at_least(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.severity >= severity)
    }

    /// Returns true if any fatal diagnostic was recorded.
    #[must_use]
    pub fn has_fatal(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Fatal)
    }

    /// Serializes the outcome to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
