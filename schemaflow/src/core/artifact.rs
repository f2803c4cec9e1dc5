//! Artifacts produced by stages.

use super::DocumentKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Typed handle describing what a stage produced in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactHandle {
    /// The loaded input document.
    SourceDocument,
    /// The compiled schema document.
    NormalizedSchema,
    /// The canonical grammar document.
    Grammar,
    /// The documentation-source document.
    Documentation,
    /// The stage produced files only.
    #[default]
    None,
}

impl From<DocumentKind> for ArtifactHandle {
    fn from(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::Source => Self::SourceDocument,
            DocumentKind::NormalizedSchema => Self::NormalizedSchema,
            DocumentKind::Grammar => Self::Grammar,
            DocumentKind::Documentation => Self::Documentation,
            DocumentKind::Other => Self::None,
        }
    }
}

/// A file written to the output layout, with its content digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedFile {
    /// Where the file was written.
    pub path: PathBuf,
    /// Hex-encoded SHA-256 of the file content.
    pub sha256: String,
    /// Size in bytes.
    pub bytes: u64,
}

impl PersistedFile {
    /// Creates a persisted-file record from content that was just written.
    #[must_use]
    pub fn from_content(path: impl Into<PathBuf>, content: &[u8]) -> Self {
        Self {
            path: path.into(),
            sha256: crate::utils::sha256_hex(content),
            bytes: content.len() as u64,
        }
    }

    /// Returns the file name component.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}

/// The result of a stage: what it produced and which files it wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// The in-memory document kind handed to later stages.
    pub handle: ArtifactHandle,
    /// Files written by the stage, in write order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<PersistedFile>,
}

impl Artifact {
    /// Creates an artifact with the given handle and no files.
    #[must_use]
    pub fn new(handle: ArtifactHandle) -> Self {
        Self {
            handle,
            files: Vec::new(),
        }
    }

    /// Creates a file-only artifact.
    #[must_use]
    pub fn files(files: Vec<PersistedFile>) -> Self {
        Self {
            handle: ArtifactHandle::None,
            files,
        }
    }

    /// Adds a persisted file.
    #[must_use]
    pub fn with_file(mut self, file: PersistedFile) -> Self {
        self.files.push(file);
        self
    }

    /// Appends a persisted file in place.
    pub fn push_file(&mut self, file: PersistedFile) {
        self.files.push(file);
    }

    /// Returns the persisted file written to `path`, if any.
    #[must_use]
    pub fn file_at(&self, path: &Path) -> Option<&PersistedFile> {
        self.files.iter().find(|file| file.path == path)
    }

    /// Forgets the file written to `path`, once it no longer exists.
    pub fn remove_file(&mut self, path: &Path) -> Option<PersistedFile> {
        let index = self.files.iter().position(|file| file.path == path)?;
        Some(self.files.remove(index))
    }
}
