//! Per-invocation diagnostic buffer handed to engines.

use crate::core::{Diagnostic, Severity, SourceLocation, StageKind};
use parking_lot::Mutex;

/// Collects what an engine reports during one transformation.
///
/// Engines may call it from any task they spawn; the pipeline drains it
/// into the run's diagnostic log once the call returns, so entries keep
/// their reporting order.
#[derive(Debug)]
pub struct StageReporter {
    stage: StageKind,
    entries: Mutex<Vec<Diagnostic>>,
}

impl StageReporter {
    /// Creates an empty reporter for a stage.
    #[must_use]
    pub fn new(stage: StageKind) -> Self {
        Self {
            stage,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Returns the stage this reporter belongs to.
    #[must_use]
    pub fn stage(&self) -> StageKind {
        self.stage
    }

    /// Records a diagnostic, tagging it with the stage.
    pub fn report(&self, diagnostic: Diagnostic) {
        self.entries.lock().push(diagnostic.with_stage(self.stage));
    }

    /// Records an informational message.
    pub fn message(&self, message: impl Into<String>) {
        self.report(Diagnostic::info(message));
    }

    /// Records a warning.
    pub fn warning(&self, message: impl Into<String>, location: Option<SourceLocation>) {
        self.report(Diagnostic::warning(message).with_optional_location(location));
    }

    /// Records an error.
    pub fn error(&self, message: impl Into<String>, location: Option<SourceLocation>) {
        self.report(Diagnostic::error(message).with_optional_location(location));
    }

    /// Records a fatal error. The transformation fails even if it returns output.
    pub fn fatal(&self, message: impl Into<String>, location: Option<SourceLocation>) {
        self.report(Diagnostic::fatal(message).with_optional_location(location));
    }

    /// Returns the first fatal diagnostic, if any.
    #[must_use]
    pub fn first_fatal(&self) -> Option<Diagnostic> {
        self.entries
            .lock()
            .iter()
            .find(|d| d.severity == Severity::Fatal)
            .cloned()
    }

    /// Returns true if a fatal diagnostic was reported.
    #[must_use]
    pub fn has_fatal(&self) -> bool {
        self.first_fatal().is_some()
    }

    /// Returns the number of buffered diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing was reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drains the buffered diagnostics, in order.
    #[must_use]
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.lock())
    }
}
