//! Append-only diagnostic log of one run.

use super::DiagnosticSink;
use crate::core::Diagnostic;
use std::fmt;
use std::sync::Arc;

/// The ordered record of every diagnostic of a run.
///
/// Appending requires `&mut self`, so the pipeline's single thread of
/// control is the only writer. Each entry is forwarded to the sink as it is
/// appended.
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
    sink: Arc<dyn DiagnosticSink>,
}

impl DiagnosticLog {
    /// Creates an empty log forwarding to `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            entries: Vec::new(),
            sink,
        }
    }

    /// Appends a diagnostic and forwards it to the sink.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        self.sink.record(&diagnostic);
        self.entries.push(diagnostic);
    }

    /// Returns every entry, in order.
    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the log, returning its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl fmt::Debug for DiagnosticLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticLog")
            .field("entries", &self.entries.len())
            .finish()
    }
}
