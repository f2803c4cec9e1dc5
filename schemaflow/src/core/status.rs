//! Stage kind and status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The stages of the pipeline, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    /// Parse the input document.
    Load,
    /// Produce the compiled schema document.
    Normalize,
    /// Derive the canonical grammar document.
    GrammarGeneration,
    /// Derive a DTD directly from the compiled document.
    DtdGeneration,
    /// Convert the persisted grammar to compact notation.
    CompactConversion,
    /// Convert the persisted grammar to a structured schema.
    StructuredConversion,
    /// Derive the documentation-source document.
    DocumentationAssembly,
    /// Export documentation in one requested format.
    FormatExport,
    /// Export the binary document format.
    BinaryDocumentExport,
}

impl StageKind {
    /// All stage kinds in execution order.
    pub const ALL: [Self; 9] = [
        Self::Load,
        Self::Normalize,
        Self::GrammarGeneration,
        Self::DtdGeneration,
        Self::CompactConversion,
        Self::StructuredConversion,
        Self::DocumentationAssembly,
        Self::FormatExport,
        Self::BinaryDocumentExport,
    ];

    /// Returns the stable, kebab-case stage name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Normalize => "normalize",
            Self::GrammarGeneration => "grammar-generation",
            Self::DtdGeneration => "dtd-generation",
            Self::CompactConversion => "compact-conversion",
            Self::StructuredConversion => "structured-conversion",
            Self::DocumentationAssembly => "documentation-assembly",
            Self::FormatExport => "format-export",
            Self::BinaryDocumentExport => "binary-document-export",
        }
    }

    /// Returns true for the two grammar-conversion sub-stages.
    #[must_use]
    pub fn is_grammar_conversion(&self) -> bool {
        matches!(self, Self::CompactConversion | Self::StructuredConversion)
    }

    /// Returns true for stages that produce validation artifacts.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::GrammarGeneration
                | Self::DtdGeneration
                | Self::CompactConversion
                | Self::StructuredConversion
        )
    }

    /// Returns true if only the compiled form can feed this stage.
    #[must_use]
    pub fn requires_compiled_form(&self) -> bool {
        matches!(
            self,
            Self::Normalize
                | Self::GrammarGeneration
                | Self::DtdGeneration
                | Self::CompactConversion
                | Self::StructuredConversion
                | Self::DocumentationAssembly
        )
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The terminal state of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage completed and produced its artifact.
    #[default]
    Ok,
    /// Stage was gated off or cancelled by a missing dependency.
    Skipped,
    /// Stage ran and failed.
    Failed,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Skipped => write!(f, "skipped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl StageStatus {
    /// Returns true if the stage ran to completion.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns true if the stage failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_kind_display() {
        assert_eq!(StageKind::Load.to_string(), "load");
        assert_eq!(StageKind::GrammarGeneration.to_string(), "grammar-generation");
        assert_eq!(StageKind::BinaryDocumentExport.to_string(), "binary-document-export");
    }

    #[test]
    fn test_stage_kind_order_matches_execution_order() {
        let mut sorted = StageKind::ALL;
        sorted.sort();
        assert_eq!(sorted, StageKind::ALL);
        assert!(StageKind::FormatExport < StageKind::BinaryDocumentExport);
    }

    #[test]
    fn test_stage_kind_groups() {
        assert!(StageKind::CompactConversion.is_grammar_conversion());
        assert!(!StageKind::GrammarGeneration.is_grammar_conversion());
        assert!(StageKind::DtdGeneration.is_validation());
        assert!(!StageKind::FormatExport.is_validation());
        assert!(StageKind::DocumentationAssembly.requires_compiled_form());
        assert!(!StageKind::FormatExport.requires_compiled_form());
        assert!(!StageKind::Load.requires_compiled_form());
    }

    #[test]
    fn test_stage_status_display() {
        assert_eq!(StageStatus::Ok.to_string(), "ok");
        assert_eq!(StageStatus::Skipped.to_string(), "skipped");
        assert_eq!(StageStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_stage_kind_serialize() {
        let json = serde_json::to_string(&StageKind::DtdGeneration).unwrap();
        assert_eq!(json, r#""dtd-generation""#);

        let deserialized: StageKind = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, StageKind::DtdGeneration);
    }
}
