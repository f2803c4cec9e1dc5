//! Error types for the schemaflow pipeline.
//!
//! Precondition and configuration errors are raised before any stage runs.
//! Stage errors travel as [`StageFailure`](crate::transform::StageFailure)
//! and are mapped to a run status by the orchestrator.

use crate::transform::StageFailure;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for schemaflow operations.
#[derive(Debug, Error)]
pub enum SchemaflowError {
    /// A filesystem precondition failed before any stage ran.
    #[error("{0}")]
    Precondition(#[from] PreconditionError),

    /// The run configuration is malformed or incomplete.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A stage failed fatally and aborted the run.
    #[error("{0}")]
    StageFatal(#[from] StageFailure),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error raised when the filesystem does not satisfy the run preconditions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreconditionError {
    /// The input document does not exist.
    #[error("The selected input document does not exist: {}", .0.display())]
    InputMissing(PathBuf),

    /// The input document exists but cannot be read as a file.
    #[error("The selected input document is not a readable file: {}", .0.display())]
    InputUnreadable(PathBuf),

    /// The output directory is missing or is not a directory.
    #[error("The selected output directory does not exist or is not a directory: {}", .0.display())]
    OutputDirInvalid(PathBuf),
}

/// Error raised when the run configuration cannot drive a stage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A field required by an enabled stage is absent.
    #[error("Stage '{stage}' requires '{field}' but it is not set")]
    MissingField {
        /// Stage that needs the field.
        stage: String,
        /// Name of the missing field.
        field: String,
    },

    /// A name that becomes part of an output file name is not a plain token.
    #[error("Invalid {field} '{value}': expected letters, digits, '.', '_' or '-'")]
    InvalidName {
        /// Which field carried the value.
        field: String,
        /// The rejected value.
        value: String,
    },

    /// Two stages would write the same output file.
    #[error("Format '{format}' would overwrite the documentation source {}", .path.display())]
    OutputCollision {
        /// The export format that clashes.
        format: String,
        /// The contested path.
        path: PathBuf,
    },

    /// The configuration document could not be parsed.
    #[error("Could not parse run configuration: {0}")]
    Parse(String),
}

impl ConfigError {
    /// Creates a missing-field error.
    #[must_use]
    pub fn missing(stage: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            stage: stage.into(),
            field: field.into(),
        }
    }

    /// Creates an invalid-name error.
    #[must_use]
    pub fn invalid_name(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidName {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Result type for schemaflow operations.
pub type Result<T> = std::result::Result<T, SchemaflowError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageKind;

    #[test]
    fn test_precondition_messages_name_the_path() {
        let err = PreconditionError::InputMissing(PathBuf::from("/nowhere/schema.odd"));
        assert!(err.to_string().contains("/nowhere/schema.odd"));

        let err = PreconditionError::OutputDirInvalid(PathBuf::from("/out"));
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn test_config_error_missing_field() {
        let err = ConfigError::missing("binary-document-export", "profile_name");
        assert_eq!(
            err.to_string(),
            "Stage 'binary-document-export' requires 'profile_name' but it is not set"
        );
    }

    #[test]
    fn test_schemaflow_error_from_stage_failure() {
        let failure = StageFailure::fatal(StageKind::Normalize, "boom");
        let err: SchemaflowError = failure.into();
        assert!(matches!(err, SchemaflowError::StageFatal(_)));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_schemaflow_error_from_config() {
        let err: SchemaflowError = ConfigError::invalid_name("schema_name", "../x").into();
        assert!(err.to_string().contains("../x"));
    }
}
