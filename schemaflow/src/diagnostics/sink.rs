//! Diagnostic sink trait and implementations.

use crate::core::{Diagnostic, Severity};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Receives every diagnostic recorded during a run.
///
/// The pipeline is the only writer and calls `record` from its single thread
/// of control. Implementations that cross into another thread (a UI polling
/// progress, for instance) must be thread-safe from the caller's side.
pub trait DiagnosticSink: Send + Sync {
    /// Receives one diagnostic. Must not block and must not panic.
    fn record(&self, diagnostic: &Diagnostic);
}

/// A sink that discards every diagnostic.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpDiagnosticSink;

impl DiagnosticSink for NoOpDiagnosticSink {
    fn record(&self, _diagnostic: &Diagnostic) {}
}

/// A sink that logs diagnostics using the tracing framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingDiagnosticSink;

impl DiagnosticSink for LoggingDiagnosticSink {
    fn record(&self, diagnostic: &Diagnostic) {
        let stage = diagnostic.stage.map(|s| s.as_str()).unwrap_or("pipeline");
        let location = diagnostic.location.as_ref().map(ToString::to_string);
        match diagnostic.severity {
            Severity::Info => info!(stage, ?location, "{}", diagnostic.message),
            Severity::Warning => warn!(stage, ?location, "{}", diagnostic.message),
            Severity::Error | Severity::Fatal => {
                error!(stage, ?location, severity = %diagnostic.severity, "{}", diagnostic.message);
            }
        }
    }
}

/// A sink that keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct CollectingDiagnosticSink {
    diagnostics: RwLock<Vec<Diagnostic>>,
}

impl CollectingDiagnosticSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected diagnostics.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.read().clone()
    }

    /// Returns the collected messages, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.diagnostics
            .read()
            .iter()
            .map(|d| d.message.clone())
            .collect()
    }

    /// Returns the number of collected diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.read().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.read().is_empty()
    }

    /// Returns diagnostics at or above a severity.
    #[must_use]
    pub fn at_least(&self, severity: Severity) -> Vec<Diagnostic> {
        self.diagnostics
            .read()
            .iter()
            .filter(|d| d.severity >= severity)
            .cloned()
            .collect()
    }

    /// Clears all collected diagnostics.
    pub fn clear(&self) {
        self.diagnostics.write().clear();
    }
}

impl DiagnosticSink for CollectingDiagnosticSink {
    fn record(&self, diagnostic: &Diagnostic) {
        self.diagnostics.write().push(diagnostic.clone());
    }
}

/// A sink that forwards diagnostics over an unbounded channel.
///
/// Lets a driving application consume progress on another task without the
/// pipeline ever waiting on it.
#[derive(Debug, Clone)]
pub struct ChannelDiagnosticSink {
    sender: mpsc::UnboundedSender<Diagnostic>,
}

impl ChannelDiagnosticSink {
    /// Creates a sink and the receiver that drains it.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Diagnostic>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl DiagnosticSink for ChannelDiagnosticSink {
    fn record(&self, diagnostic: &Diagnostic) {
        if self.sender.send(diagnostic.clone()).is_err() {
            debug!("Diagnostic receiver dropped; discarding: {}", diagnostic.message);
        }
    }
}
