//! Uniform stage error.

use crate::core::{SourceLocation, StageKind};
use thiserror::Error;

/// Error raised when a stage fails.
///
/// `fatal` failures abort the remaining pipeline; recoverable ones are
/// recorded and only cancel the stages that depend on the failed one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Stage {stage} failed: {message}")]
pub struct StageFailure {
    /// Stage that failed.
    pub stage: StageKind,
    /// Original error message.
    pub message: String,
    /// Whether the failure aborts the run.
    pub fatal: bool,
    /// Source location reported by the engine.
    pub location: Option<SourceLocation>,
    /// Format identifier for per-format stages.
    pub target: Option<String>,
}

impl StageFailure {
    /// Creates a failure that aborts the run.
    #[must_use]
    pub fn fatal(stage: StageKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            fatal: true,
            location: None,
            target: None,
        }
    }

    /// Creates a failure the run recovers from.
    #[must_use]
    pub fn recoverable(stage: StageKind, message: impl Into<String>) -> Self {
        Self {
            fatal: false,
            ..Self::fatal(stage, message)
        }
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_location(mut self, location: Option<SourceLocation>) -> Self {
        self.location = location;
        self
    }

    /// Sets the format target.
    #[must_use]
    pub fn with_target(mut self, target: Option<String>) -> Self {
        self.target = target;
        self
    }

    /// Marks the failure as fatal.
    #[must_use]
    pub fn escalate(mut self) -> Self {
        self.fatal = true;
        self
    }
}
