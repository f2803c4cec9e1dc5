//! Per-stage result type.

use super::{Artifact, Diagnostic, Severity, StageKind, StageStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    /// Which stage ran.
    pub stage: StageKind,
    /// Format identifier for per-format stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Terminal status.
    pub status: StageStatus,
    /// What the stage produced; absent when it failed or was skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,
    /// Diagnostics recorded while the stage ran, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
    /// Whether this result terminated the pipeline.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fatal: bool,
    /// Why the stage was skipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    /// When the stage started.
    pub started_at: DateTime<Utc>,
    /// How long the stage took.
    pub duration_ms: f64,
}

impl StageResult {
    /// Creates a completed stage result.
    #[must_use]
    pub fn completed(stage: StageKind, started_at: DateTime<Utc>, artifact: Artifact) -> Self {
        Self {
            stage,
            target: None,
            status: StageStatus::Ok,
            artifact: Some(artifact),
            diagnostics: Vec::new(),
            fatal: false,
            skip_reason: None,
            started_at,
            duration_ms: 0.0,
        }
    }

    /// Creates a failed stage result.
    #[must_use]
    pub fn failed(stage: StageKind, started_at: DateTime<Utc>, fatal: bool) -> Self {
        Self {
            stage,
            target: None,
            status: StageStatus::Failed,
            artifact: None,
            diagnostics: Vec::new(),
            fatal,
            skip_reason: None,
            started_at,
            duration_ms: 0.0,
        }
    }

    /// Creates a skipped stage result.
    #[must_use]
    pub fn skipped(stage: StageKind, reason: impl Into<String>) -> Self {
        Self {
            stage,
            target: None,
            status: StageStatus::Skipped,
            artifact: None,
            diagnostics: Vec::new(),
            fatal: false,
            skip_reason: Some(reason.into()),
            started_at: Utc::now(),
            duration_ms: 0.0,
        }
    }

    /// Sets the format target.
    #[must_use]
    pub fn with_target(mut self, target: Option<String>) -> Self {
        self.target = target;
        self
    }

    /// Sets the diagnostics.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Returns a display label, including the target for per-format stages.
    #[must_use]
    pub fn label(&self) -> String {
        match self.target {
            Some(ref target) => format!("{}[{}]", self.stage, target),
            None => self.stage.to_string(),
        }
    }

    /// Returns true if the stage completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if the stage failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }

    /// Returns true if the stage recorded an error-severity diagnostic.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity >= Severity::Error)
    }

    /// Returns the first error message recorded by the stage.
    #[must_use]
    pub fn first_error(&self) -> Option<&str> {
        self.diagnostics
            .iter()
            .find(|d| d.is_error())
            .map(|d| d.message.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ArtifactHandle;

    #[test]
    fn test_stage_result_completed() {
        let result = StageResult::completed(
            StageKind::Normalize,
            Utc::now(),
            Artifact::new(ArtifactHandle::NormalizedSchema),
        );

        assert!(result.is_success());
        assert!(!result.is_failure());
        assert!(!result.fatal);
        assert_eq!(result.label(), "normalize");
    }

    #[test]
    fn test_stage_result_failed() {
        let result = StageResult::failed(StageKind::GrammarGeneration, Utc::now(), false)
            .with_diagnostics(vec![Diagnostic::error("bad grammar")]);

        assert!(result.is_failure());
        assert!(result.artifact.is_none());
        assert!(result.has_error());
        assert_eq!(result.first_error(), Some("bad grammar"));
    }

    #[test]
    fn test_stage_result_label_with_target() {
        let result = StageResult::skipped(StageKind::FormatExport, "no documentation")
            .with_target(Some("html".to_string()));

        assert_eq!(result.label(), "format-export[html]");
        assert_eq!(result.skip_reason.as_deref(), Some("no documentation"));
    }

    #[test]
    fn test_stage_result_serialization() {
        let result = StageResult::failed(StageKind::DtdGeneration, Utc::now(), true);
        let json = serde_json::to_string(&result).unwrap();
        let deserialized: StageResult = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.stage, StageKind::DtdGeneration);
        assert!(deserialized.fatal);
    }
}
