//! Transform engine trait and request/response types.

use super::StageReporter;
use crate::core::{Document, SourceLocation, StageKind};
use crate::params::StageParams;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Identifies which external transformation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransformId {
    /// Parse the input document.
    Load,
    /// Compile the schema definition.
    Normalize,
    /// Derive the canonical grammar.
    GenerateGrammar,
    /// Derive a DTD from the compiled document.
    GenerateDtd,
    /// Derive the documentation source.
    GenerateDocumentation,
    /// Render documentation in one format.
    Export,
    /// Render the binary document.
    BinaryExport,
    /// Convert the grammar to compact notation.
    ConvertCompact,
    /// Convert the grammar to a structured schema.
    ConvertStructured,
}

impl TransformId {
    /// Returns the transformation a stage runs.
    #[must_use]
    pub fn for_stage(stage: StageKind) -> Self {
        match stage {
            StageKind::Load => Self::Load,
            StageKind::Normalize => Self::Normalize,
            StageKind::GrammarGeneration => Self::GenerateGrammar,
            StageKind::DtdGeneration => Self::GenerateDtd,
            StageKind::CompactConversion => Self::ConvertCompact,
            StageKind::StructuredConversion => Self::ConvertStructured,
            StageKind::DocumentationAssembly => Self::GenerateDocumentation,
            StageKind::FormatExport => Self::Export,
            StageKind::BinaryDocumentExport => Self::BinaryExport,
        }
    }

    /// Returns the kebab-case name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Normalize => "normalize",
            Self::GenerateGrammar => "generate-grammar",
            Self::GenerateDtd => "generate-dtd",
            Self::GenerateDocumentation => "generate-documentation",
            Self::Export => "export",
            Self::BinaryExport => "binary-export",
            Self::ConvertCompact => "convert-compact",
            Self::ConvertStructured => "convert-structured",
        }
    }
}

impl fmt::Display for TransformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a transformation reads.
#[derive(Debug, Clone, Copy)]
pub enum TransformSource<'a> {
    /// A file on disk: the input document or a persisted grammar.
    File(&'a Path),
    /// An in-memory document produced by an earlier stage.
    Document(&'a Document),
}

impl TransformSource<'_> {
    /// Returns the source path, if the source is a file or has an origin.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Document(document) => document.origin(),
        }
    }
}

/// What a transformation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformOutput {
    /// An in-memory document; the pipeline persists it if needed.
    Document(Document),
    /// The engine wrote the output file itself.
    Written(PathBuf),
}

impl TransformOutput {
    /// Returns the document, if one was produced in memory.
    #[must_use]
    pub fn into_document(self) -> Option<Document> {
        match self {
            Self::Document(document) => Some(document),
            Self::Written(_) => None,
        }
    }
}

/// One call into the engine.
#[derive(Debug, Clone, Copy)]
pub struct TransformRequest<'a> {
    /// Which transformation to run.
    pub id: TransformId,
    /// What it reads.
    pub source: TransformSource<'a>,
    /// The stage's parameter record.
    pub params: &'a StageParams,
}

/// An error raised by an engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    /// What went wrong.
    pub message: String,
    /// Where in the source the engine failed, when it knows.
    pub location: Option<SourceLocation>,
}

impl EngineError {
    /// Creates a new engine error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(format!("{err:#}"))
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// An external transformation engine.
///
/// Implementations are assumed deterministic: the same request yields the
/// same output, and a failed call leaves no side effects behind. Progress,
/// warnings and errors raised mid-transformation go to the `reporter`.
#[async_trait]
pub trait TransformEngine: Send + Sync {
    /// Returns the engine's name, used in logs.
    fn name(&self) -> &str {
        "engine"
    }

    /// Runs one transformation.
    async fn transform(
        &self,
        request: TransformRequest<'_>,
        reporter: &StageReporter,
    ) -> Result<TransformOutput, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DocumentKind;

    #[test]
    fn test_transform_id_for_every_stage() {
        for stage in StageKind::ALL {
            let id = TransformId::for_stage(stage);
            assert!(!id.as_str().is_empty());
        }
        assert_eq!(
            TransformId::for_stage(StageKind::StructuredConversion),
            TransformId::ConvertStructured
        );
        assert_eq!(TransformId::GenerateDtd.to_string(), "generate-dtd");
    }

    #[test]
    fn test_engine_error_from_anyhow() {
        let err = anyhow::anyhow!("unexpected element").context("compile failed");
        let engine_err = EngineError::from(err);
        assert_eq!(engine_err.message, "compile failed: unexpected element");
        assert!(engine_err.location.is_none());
    }

    #[test]
    fn test_engine_error_with_location() {
        let err = EngineError::new("bad attribute")
            .with_location(SourceLocation::new("in.odd").at(3, 7));
        assert_eq!(err.to_string(), "bad attribute");
        assert_eq!(err.location.unwrap().line, Some(3));
    }

    #[test]
    fn test_source_path() {
        let doc = Document::new(DocumentKind::Source, "<TEI/>").with_origin("in.odd");
        assert_eq!(
            TransformSource::Document(&doc).path(),
            Some(Path::new("in.odd"))
        );
        assert_eq!(
            TransformSource::File(Path::new("/out/x.rng")).path(),
            Some(Path::new("/out/x.rng"))
        );
    }

    #[test]
    fn test_output_into_document() {
        let doc = Document::new(DocumentKind::Grammar, "<grammar/>");
        assert!(TransformOutput::Document(doc).into_document().is_some());
        assert!(TransformOutput::Written(PathBuf::from("/out/x.dtd"))
            .into_document()
            .is_none());
    }
}
