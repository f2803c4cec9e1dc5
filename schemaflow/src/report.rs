//! Human-readable run reports.

use crate::core::{RunOutcome, RunStatus, Severity, StageStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One line per stage in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageLine {
    /// Stage name, with the format for exports.
    pub label: String,
    /// Terminal status.
    pub status: StageStatus,
    /// Skip reason or first error, when there is one.
    pub detail: Option<String>,
    /// Files the stage wrote.
    pub files: Vec<String>,
}

/// A formatted summary of a run. Purely presentational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Terminal status.
    pub status: RunStatus,
    /// Cause of an aborted run.
    pub fatal_message: Option<String>,
    /// One line per stage result.
    pub stages: Vec<StageLine>,
    /// Every diagnostic at or above warning, rendered, in recording order.
    pub problems: Vec<String>,
    /// Number of warnings.
    pub warnings: usize,
    /// Number of errors, fatal included.
    pub errors: usize,
}

impl RunReport {
    /// Returns true if nothing above info was recorded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Summarizes an outcome.
#[must_use]
pub fn summarize(outcome: &RunOutcome) -> RunReport {
    let stages = outcome
        .stages
        .iter()
        .map(|result| StageLine {
            label: result.label(),
            status: result.status,
            detail: result
                .skip_reason
                .clone()
                .or_else(|| result.first_error().map(str::to_string)),
            files: result
                .artifact
                .iter()
                .flat_map(|a| a.files.iter())
                .map(|f| f.path.display().to_string())
                .collect(),
        })
        .collect();

    let problems = outcome
        .diagnostics_at_least(Severity::Warning)
        .map(ToString::to_string)
        .collect();

    RunReport {
        status: outcome.status,
        fatal_message: outcome.fatal_message.clone(),
        stages,
        problems,
        warnings: outcome
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count(),
        errors: outcome.diagnostics.iter().filter(|d| d.is_error()).count(),
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Run {} ({} warning(s), {} error(s))",
            self.status, self.warnings, self.errors
        )?;
        if let Some(ref message) = self.fatal_message {
            writeln!(f, "Aborted: {message}")?;
        }

        if !self.stages.is_empty() {
            writeln!(f, "\nStages:")?;
        }
        for stage in &self.stages {
            let status = match stage.status {
                StageStatus::Ok => "ok",
                StageStatus::Skipped => "skipped",
                StageStatus::Failed => "FAILED",
            };
            write!(f, "  {:<8} {}", status, stage.label)?;
            if let Some(ref detail) = stage.detail {
                write!(f, " ({detail})")?;
            }
            writeln!(f)?;
            for file in &stage.files {
                writeln!(f, "           -> {file}")?;
            }
        }

        if !self.problems.is_empty() {
            writeln!(f, "\nDiagnostics:")?;
            for problem in &self.problems {
                writeln!(f, "  {problem}")?;
            }
        }
        Ok(())
    }
}
