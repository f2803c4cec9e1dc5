//! Writes stage outputs into the output layout.
//!
//! Every helper returns plain `io::Result`s. Whether a failure is fatal,
//! an error or a warning is decided by the orchestrator.

use crate::config::ResourceLayout;
use crate::core::{Document, DocumentKind, PersistedFile};
use crate::transform::TransformOutput;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Writes a document to `path` and fingerprints it.
pub async fn store_document(document: &Document, path: &Path) -> io::Result<PersistedFile> {
    fs::write(path, document.content()).await?;
    debug!(path = %path.display(), bytes = document.len(), "Stored document");
    Ok(PersistedFile::from_content(path, document.content()))
}

/// Fingerprints a file an engine wrote.
pub async fn fingerprint(path: &Path) -> io::Result<PersistedFile> {
    let content = fs::read(path).await?;
    Ok(PersistedFile::from_content(path, &content))
}

/// Makes sure a transform's output exists at `path`.
///
/// In-memory documents are written there. Files the engine wrote are
/// fingerprinted where they are, and copied over when the engine chose a
/// different path.
pub async fn materialize(output: TransformOutput, path: &Path) -> io::Result<PersistedFile> {
    match output {
        TransformOutput::Document(document) => store_document(&document, path).await,
        TransformOutput::Written(written) if written == path => fingerprint(path).await,
        TransformOutput::Written(written) => {
            fs::copy(&written, path).await?;
            fingerprint(path).await
        }
    }
}

/// Turns a transform's output into an in-memory document of `kind`.
pub async fn into_document(output: TransformOutput, kind: DocumentKind) -> io::Result<Document> {
    match output {
        TransformOutput::Document(document) => Ok(document),
        TransformOutput::Written(path) => {
            let content = fs::read(&path).await?;
            Ok(Document::new(kind, content).with_origin(path))
        }
    }
}

/// Whether the documentation directory was already there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryState {
    /// A directory was already there.
    Existing,
    /// The directory was created.
    Created,
}

/// Ensures a directory exists.
///
/// A missing path is created and an existing directory is accepted as is.
/// An existing non-directory at the path is an error.
pub async fn ensure_directory(path: &Path) -> io::Result<DirectoryState> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(DirectoryState::Existing),
        Ok(_) => Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} exists and is not a directory", path.display()),
        )),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(path).await?;
            debug!(path = %path.display(), "Created directory");
            Ok(DirectoryState::Created)
        }
        Err(err) => Err(err),
    }
}

/// A support file that could not be copied.
#[derive(Debug)]
pub struct CopyFailure {
    /// File name of the support file.
    pub name: &'static str,
    /// Where it should have gone.
    pub destination: PathBuf,
    /// Why the copy failed.
    pub error: io::Error,
}

/// Copies the fixed support files into `dir`.
///
/// Each file is attempted independently.
pub async fn copy_support_files(
    resources: &ResourceLayout,
    dir: &Path,
) -> Vec<Result<PersistedFile, CopyFailure>> {
    let mut results = Vec::new();
    for (name, source) in resources.support_files() {
        let destination = dir.join(name);
        let copied = match fs::copy(&source, &destination).await {
            Ok(_) => fingerprint(&destination).await,
            Err(err) => Err(err),
        };
        results.push(copied.map_err(|error| CopyFailure {
            name,
            destination,
            error,
        }));
    }
    results
}

/// Deletes an intermediate file. Returns whether it is gone; failures are
/// otherwise ignored.
pub async fn remove_intermediate(path: &Path) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => true,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "Intermediate file not removed");
            err.kind() == io::ErrorKind::NotFound
        }
    }
}
