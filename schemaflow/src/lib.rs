//! # Schemaflow
//!
//! A stage-sequencing engine that turns one authoritative schema-definition
//! document into its derived artifacts: a compiled schema document,
//! validation grammars in several serializations, and documentation in
//! several output formats.
//!
//! The transformations themselves are delegated to an external
//! [`TransformEngine`](transform::TransformEngine). Schemaflow decides:
//!
//! - **Which stages run**: every stage is gated by the run configuration
//! - **In what order**: a fixed dependency order, binary export always last
//! - **How failures propagate**: fatal stages abort, recoverable stages are
//!   recorded and only cancel their dependents
//! - **What each transformation receives**: one immutable parameter record
//!   per stage, built from the run configuration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use schemaflow::prelude::*;
//! use std::sync::Arc;
//!
//! let config = RunConfiguration::new("schema.odd", "out")
//!     .with_schema_name("myschema")
//!     .with_formats(["html", "docx"])
//!     .with_profile("default");
//!
//! let pipeline = SchemaPipeline::new(Arc::new(MyEngine::default()))
//!     .with_sink(Arc::new(LoggingDiagnosticSink::default()));
//!
//! let outcome = pipeline.execute(&config).await;
//! println!("{}", summarize(&outcome));
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod diagnostics;
pub mod errors;
pub mod observability;
pub mod params;
pub mod pipeline;
pub mod report;
pub mod testing;
pub mod transform;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{DtdFailurePolicy, OutputLayout, ResourceLayout, RunConfiguration};
    pub use crate::core::{
        Artifact, ArtifactHandle, Diagnostic, Document, DocumentKind, PersistedFile, RunOutcome,
        RunStatus, Severity, SourceLocation, StageKind, StageResult, StageStatus,
    };
    pub use crate::diagnostics::{
        ChannelDiagnosticSink, CollectingDiagnosticSink, DiagnosticLog, DiagnosticSink,
        LoggingDiagnosticSink, NoOpDiagnosticSink,
    };
    pub use crate::errors::{ConfigError, PreconditionError, SchemaflowError};
    pub use crate::params::{StageConfigBuilder, StageParams};
    pub use crate::pipeline::SchemaPipeline;
    pub use crate::report::{summarize, RunReport};
    pub use crate::transform::{
        EngineError, StageFailure, StageReporter, TransformEngine, TransformId, TransformInvoker,
        TransformOutput, TransformRequest, TransformSource,
    };
}
