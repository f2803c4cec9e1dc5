//! In-memory documents threaded between stages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// What a document represents in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// The loaded input document.
    Source,
    /// The compiled schema document.
    NormalizedSchema,
    /// The canonical grammar document.
    Grammar,
    /// The documentation-source document.
    Documentation,
    /// Any other engine output.
    Other,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::NormalizedSchema => write!(f, "normalized_schema"),
            Self::Grammar => write!(f, "grammar"),
            Self::Documentation => write!(f, "documentation"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A serialized document held in memory.
///
/// Exactly one stage owns a document at a time; it is moved to the next
/// stage or dropped after persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    kind: DocumentKind,
    content: Vec<u8>,
    origin: Option<PathBuf>,
}

impl Document {
    /// Creates a document from raw bytes.
    #[must_use]
    pub fn new(kind: DocumentKind, content: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            content: content.into(),
            origin: None,
        }
    }

    /// Records the file the document was read from.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<PathBuf>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Returns the document kind.
    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Returns the raw content.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Returns the content as text, if it is valid UTF-8.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }

    /// Returns the file the document was read from.
    #[must_use]
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// Returns the content length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns true if the document has no content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_accessors() {
        let doc = Document::new(DocumentKind::Grammar, "<grammar/>").with_origin("/tmp/x.rng");

        assert_eq!(doc.kind(), DocumentKind::Grammar);
        assert_eq!(doc.as_text(), Some("<grammar/>"));
        assert_eq!(doc.origin(), Some(Path::new("/tmp/x.rng")));
        assert_eq!(doc.len(), 10);
        assert!(!doc.is_empty());
    }

    #[test]
    fn test_document_binary_content() {
        let doc = Document::new(DocumentKind::Other, vec![0xff, 0xfe]);
        assert!(doc.as_text().is_none());
    }
}
