//! Diagnostics sink system.
//!
//! Every stage reports through an explicit [`DiagnosticLog`], which keeps
//! the append-only record of the run and forwards each entry to a
//! caller-supplied [`DiagnosticSink`] (UI, log or test harness).

mod log;
mod sink;

pub use log::DiagnosticLog;
pub use sink::{
    ChannelDiagnosticSink, CollectingDiagnosticSink, DiagnosticSink, LoggingDiagnosticSink,
    NoOpDiagnosticSink,
};
