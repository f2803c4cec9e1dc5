//! Core domain model types for schemaflow.
//!
//! This module contains the fundamental types used throughout the pipeline:
//! - Stage kind and status enums
//! - Diagnostics and their severities
//! - In-memory documents and persisted artifacts
//! - Per-stage results and the aggregated run outcome

mod artifact;
mod diagnostic;
mod document;
mod outcome;
mod result;
mod status;

pub use artifact::{Artifact, ArtifactHandle, PersistedFile};
pub use diagnostic::{Diagnostic, Severity, SourceLocation};
pub use document::{Document, DocumentKind};
pub use outcome::{RunOutcome, RunStatus};
pub use result::StageResult;
pub use status::{StageKind, StageStatus};
