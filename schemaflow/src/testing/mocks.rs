//! Scripted transform engine for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::{Document, DocumentKind};
use crate::params::StageParams;
use crate::transform::{
    EngineError, StageReporter, TransformEngine, TransformId, TransformOutput, TransformRequest,
    TransformSource,
};

/// One call the engine received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Which transformation was requested.
    pub id: TransformId,
    /// The parameter record it received.
    pub params: StageParams,
    /// The source path, when the source was a file or had an origin.
    pub source: Option<PathBuf>,
}

/// A deterministic engine that records calls and fails on demand.
///
/// Outputs are pure functions of the request, so two runs over the same
/// input produce byte-identical artifacts. Document-producing transforms
/// return documents; DTD generation, conversions and the binary export
/// write their output files themselves.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    failures: HashMap<TransformId, String>,
    format_failures: HashMap<String, String>,
    warnings: HashMap<TransformId, String>,
    fatal_reports: HashMap<TransformId, String>,
    delays: HashMap<TransformId, Duration>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedEngine {
    /// Creates an engine where every transform succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes a transform fail with an engine error.
    #[must_use]
    pub fn fail_on(mut self, id: TransformId, message: impl Into<String>) -> Self {
        self.failures.insert(id, message.into());
        self
    }

    /// Makes the export of one format fail.
    #[must_use]
    pub fn fail_on_format(mut self, format: impl Into<String>, message: impl Into<String>) -> Self {
        self.format_failures.insert(format.into(), message.into());
        self
    }

    /// Makes a transform report a warning and then succeed.
    #[must_use]
    pub fn warn_on(mut self, id: TransformId, message: impl Into<String>) -> Self {
        self.warnings.insert(id, message.into());
        self
    }

    /// Makes a transform report a fatal diagnostic but still return output.
    #[must_use]
    pub fn report_fatal_on(mut self, id: TransformId, message: impl Into<String>) -> Self {
        self.fatal_reports.insert(id, message.into());
        self
    }

    /// Delays a transform before it produces output.
    #[must_use]
    pub fn delay(mut self, id: TransformId, delay: Duration) -> Self {
        self.delays.insert(id, delay);
        self
    }

    /// Returns every recorded call, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Returns the transform ids called, in order.
    #[must_use]
    pub fn call_ids(&self) -> Vec<TransformId> {
        self.calls.lock().iter().map(|c| c.id).collect()
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns true if a transform was called at least once.
    #[must_use]
    pub fn was_called(&self, id: TransformId) -> bool {
        self.calls.lock().iter().any(|c| c.id == id)
    }

    /// Returns the formats exported, in call order.
    #[must_use]
    pub fn exported_formats(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c.params {
                StageParams::Export(ref params) => Some(params.format.clone()),
                _ => None,
            })
            .collect()
    }

    /// Clears recorded calls.
    pub fn reset(&self) {
        self.calls.lock().clear();
    }

    fn scripted_failure(&self, request: &TransformRequest<'_>) -> Option<&String> {
        if let StageParams::Export(ref params) = *request.params {
            if let Some(message) = self.format_failures.get(&params.format) {
                return Some(message);
            }
        }
        self.failures.get(&request.id)
    }
}

async fn read_source(source: TransformSource<'_>) -> Result<Vec<u8>, EngineError> {
    match source {
        TransformSource::File(path) => Ok(tokio::fs::read(path).await?),
        TransformSource::Document(document) => Ok(document.content().to_vec()),
    }
}

async fn write_output(path: &Path, content: String) -> Result<TransformOutput, EngineError> {
    tokio::fs::write(path, content).await?;
    Ok(TransformOutput::Written(path.to_path_buf()))
}

fn document(kind: DocumentKind, content: String) -> TransformOutput {
    TransformOutput::Document(Document::new(kind, content))
}

#[async_trait]
impl TransformEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn transform(
        &self,
        request: TransformRequest<'_>,
        reporter: &StageReporter,
    ) -> Result<TransformOutput, EngineError> {
        self.calls.lock().push(RecordedCall {
            id: request.id,
            params: request.params.clone(),
            source: request.source.path().map(Path::to_path_buf),
        });

        if let Some(delay) = self.delays.get(&request.id) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(message) = self.warnings.get(&request.id) {
            reporter.warning(message.clone(), None);
        }
        if let Some(message) = self.scripted_failure(&request) {
            return Err(EngineError::new(message.clone()));
        }
        if let Some(message) = self.fatal_reports.get(&request.id) {
            reporter.fatal(message.clone(), None);
        }

        let source = read_source(request.source).await?;
        let source = String::from_utf8_lossy(&source);

        match *request.params {
            StageParams::Load(_) => Ok(document(DocumentKind::Source, source.into_owned())),
            StageParams::Normalize(ref p) => Ok(document(
                DocumentKind::NormalizedSchema,
                format!(
                    "<compiled schema=\"{}\" locale=\"{}\" stripped=\"{}\">{source}</compiled>",
                    p.schema_name, p.locale, p.stripped
                ),
            )),
            StageParams::Grammar(ref p) => Ok(document(
                DocumentKind::Grammar,
                format!(
                    "<grammar schema=\"{}\" prefix=\"{}\">{}</grammar>",
                    p.schema_name,
                    p.pattern_prefix,
                    source.len()
                ),
            )),
            StageParams::Dtd(ref p) => {
                write_output(
                    &p.output_file,
                    format!("<!-- {} --><!ELEMENT TEI ANY>\n", p.schema_name),
                )
                .await
            }
            StageParams::Documentation(ref p) => Ok(document(
                DocumentKind::Documentation,
                format!("<TEI xml:lang=\"{}\">{}</TEI>", p.locale, source.len()),
            )),
            StageParams::Export(ref p) => Ok(document(
                DocumentKind::Other,
                format!("[{}] {}", p.format, source),
            )),
            StageParams::BinaryExport(ref p) => {
                write_output(
                    &p.output_file,
                    format!("PK docx template={}", p.template_file.display()),
                )
                .await
            }
            StageParams::Conversion(ref p) => {
                write_output(
                    &p.output_file,
                    format!("# {:?} ({}) from {} bytes\n", p.target, p.encoding, source.len()),
                )
                .await
            }
        }
    }
}
