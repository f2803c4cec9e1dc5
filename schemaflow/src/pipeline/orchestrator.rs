//! The pipeline orchestrator.

use super::persist::{self, DirectoryState};
use crate::config::{DtdFailurePolicy, OutputLayout, RunConfiguration, BINARY_DOCUMENT_FORMAT};
use crate::core::{
    Artifact, ArtifactHandle, Diagnostic, Document, DocumentKind, PersistedFile, RunOutcome,
    RunStatus, StageKind, StageResult,
};
use crate::diagnostics::{DiagnosticLog, DiagnosticSink, NoOpDiagnosticSink};
use crate::errors::SchemaflowError;
use crate::params::{ConversionTarget, StageConfigBuilder, StageParams};
use crate::transform::{
    StageFailure, StageReporter, TransformEngine, TransformInvoker, TransformOutput,
    TransformSource,
};
use crate::utils::{elapsed_ms, generate_uuid};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// Runs the fixed stage graph against a transform engine.
///
/// Stages run strictly in dependency order on the caller's task. The only
/// optional concurrency is between the two grammar conversions.
#[derive(Clone)]
pub struct SchemaPipeline {
    invoker: TransformInvoker,
    sink: Arc<dyn DiagnosticSink>,
}

impl SchemaPipeline {
    /// Creates a pipeline over an engine. Diagnostics go nowhere until a
    /// sink is set.
    #[must_use]
    pub fn new(engine: Arc<dyn TransformEngine>) -> Self {
        Self {
            invoker: TransformInvoker::new(engine),
            sink: Arc::new(NoOpDiagnosticSink),
        }
    }

    /// Sets the sink that receives every diagnostic as it is recorded.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Executes one run.
    ///
    /// Never fails: configuration and precondition problems, as well as
    /// fatal stage failures, are reported through the returned outcome.
    pub async fn execute(&self, config: &RunConfiguration) -> RunOutcome {
        let run_id = generate_uuid();
        let started_at = Utc::now();
        let clock = Instant::now();
        let span = info_span!("run", %run_id, schema = %config.schema_name);

        let mut run = Run::new(config, &self.invoker, DiagnosticLog::new(self.sink.clone()));

        let fatal_message = match preflight(config) {
            Err(err) => {
                warn!(error = %err, "Run rejected before any stage");
                run.log.record(Diagnostic::fatal(err.to_string()));
                Some(err.to_string())
            }
            Ok(()) => match run.run_stages().instrument(span).await {
                Ok(()) => None,
                Err(failure) => {
                    warn!(stage = %failure.stage, "Run aborted: {}", failure.message);
                    Some(failure.to_string())
                }
            },
        };

        let Run { log, stages, .. } = run;
        let diagnostics = log.into_entries();
        let status = RunStatus::aggregate(&stages, &diagnostics, fatal_message.is_some());
        let duration_ms = elapsed_ms(clock);
        info!(%run_id, %status, duration_ms, stages = stages.len(), "Run finished");

        RunOutcome {
            run_id,
            started_at,
            duration_ms,
            status,
            stages,
            diagnostics,
            fatal_message,
        }
    }
}

impl fmt::Debug for SchemaPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaPipeline")
            .field("invoker", &self.invoker)
            .finish_non_exhaustive()
    }
}

/// Checks configuration shape and filesystem preconditions, touching nothing.
fn preflight(config: &RunConfiguration) -> Result<(), SchemaflowError> {
    config.validate()?;
    config.check_preconditions()?;
    Ok(())
}

/// A stage result plus the diagnostics the engine reported during the call.
type Attempt<T> = (Result<T, StageFailure>, Vec<Diagnostic>);

async fn attempt(
    invoker: &TransformInvoker,
    source: TransformSource<'_>,
    params: &StageParams,
) -> Attempt<TransformOutput> {
    let reporter = StageReporter::new(params.stage());
    let result = invoker.invoke(source, params, &reporter).await;
    (result, reporter.take())
}

async fn attempt_document(
    invoker: &TransformInvoker,
    source: TransformSource<'_>,
    params: &StageParams,
    kind: DocumentKind,
) -> Attempt<Document> {
    let (result, reported) = attempt(invoker, source, params).await;
    let result = match result {
        Ok(output) => persist::into_document(output, kind).await.map_err(|err| {
            StageFailure::recoverable(
                params.stage(),
                format!("Unable to read transform output: {err}"),
            )
        }),
        Err(failure) => Err(failure),
    };
    (result, reported)
}

async fn attempt_file(
    invoker: &TransformInvoker,
    source: TransformSource<'_>,
    params: &StageParams,
    path: &Path,
) -> Attempt<PersistedFile> {
    let (result, reported) = attempt(invoker, source, params).await;
    let result = match result {
        Ok(output) => persist::materialize(output, path).await.map_err(|err| {
            StageFailure::recoverable(
                params.stage(),
                format!("Unable to write {}: {err}", path.display()),
            )
        }),
        Err(failure) => Err(failure),
    };
    (result, reported)
}

/// Bookkeeping of one stage while it runs.
struct StageScope {
    stage: StageKind,
    target: Option<String>,
    started_at: DateTime<Utc>,
    clock: Instant,
    diagnostics: Vec<Diagnostic>,
}

/// State of one execution. Owned by a single task; the only writer of the
/// diagnostic log.
struct Run<'a> {
    config: &'a RunConfiguration,
    params: StageConfigBuilder<'a>,
    layout: OutputLayout,
    invoker: &'a TransformInvoker,
    log: DiagnosticLog,
    stages: Vec<StageResult>,
}

impl<'a> Run<'a> {
    fn new(config: &'a RunConfiguration, invoker: &'a TransformInvoker, log: DiagnosticLog) -> Self {
        let params = StageConfigBuilder::new(config);
        let layout = params.layout().clone();
        Self {
            config,
            params,
            layout,
            invoker,
            log,
            stages: Vec::new(),
        }
    }

    /// Runs every applicable stage. Returns the failure that aborted the run.
    async fn run_stages(&mut self) -> Result<(), StageFailure> {
        self.log.record(Diagnostic::info(format!(
            "Start processing {}",
            self.config.input.display()
        )));

        let source = self
            .load()
            .instrument(info_span!("stage", stage = %StageKind::Load))
            .await?;

        if self.config.use_compiled_form {
            self.compiled(&source).await?;
        } else {
            for stage in StageKind::ALL
                .into_iter()
                .filter(StageKind::requires_compiled_form)
            {
                self.skip(stage, None, "compiled form disabled");
            }
            self.exports(Some(&source)).await;
        }

        self.log.record(Diagnostic::info("done"));
        Ok(())
    }

    async fn compiled(&mut self, source: &Document) -> Result<(), StageFailure> {
        let normalized = self
            .normalize(source)
            .instrument(info_span!("stage", stage = %StageKind::Normalize))
            .await?;

        let grammar = if self.config.wants_grammar() {
            self.grammar(&normalized)
                .instrument(info_span!("stage", stage = %StageKind::GrammarGeneration))
                .await
        } else {
            self.skip(
                StageKind::GrammarGeneration,
                None,
                "validation grammars not requested",
            );
            None
        };

        if self.config.generate_validation_dtd {
            self.dtd(&normalized)
                .instrument(info_span!("stage", stage = %StageKind::DtdGeneration))
                .await?;
        } else {
            self.skip(StageKind::DtdGeneration, None, "DTD not requested");
        }

        match grammar {
            Some(ref file) => {
                self.conversions(&file.path)
                    .instrument(info_span!("stage", stage = "grammar-conversion"))
                    .await;
            }
            None => {
                let reason = if self.config.wants_grammar() {
                    "grammar unavailable"
                } else {
                    "validation grammars not requested"
                };
                self.skip(StageKind::CompactConversion, None, reason);
                self.skip(StageKind::StructuredConversion, None, reason);
            }
        }

        if !self.config.wants_documentation() {
            self.skip(
                StageKind::DocumentationAssembly,
                None,
                "no documentation requested",
            );
            return Ok(());
        }

        self.log.record(Diagnostic::info("Generate Output"));
        let documentation = self
            .documentation(&normalized)
            .instrument(info_span!("stage", stage = %StageKind::DocumentationAssembly))
            .await?;
        self.exports(documentation.as_ref()).await;
        Ok(())
    }

    async fn load(&mut self) -> Result<Document, StageFailure> {
        let mut scope = self.begin(StageKind::Load, None);
        let params = StageParams::Load(self.params.load());
        let (result, reported) = attempt_document(
            self.invoker,
            TransformSource::File(&self.config.input),
            &params,
            DocumentKind::Source,
        )
        .await;
        self.absorb(&mut scope, reported);

        let document = result.map(|document| {
            if document.origin().is_some() {
                document
            } else {
                document.with_origin(&self.config.input)
            }
        });
        self.settle(scope, document, true, |_| {
            Artifact::new(ArtifactHandle::SourceDocument)
        })
    }

    async fn normalize(&mut self, source: &Document) -> Result<Document, StageFailure> {
        let mut scope = self.begin(StageKind::Normalize, None);
        self.progress(&mut scope, "Create compiled odd");
        let params = StageParams::Normalize(self.params.normalize());
        let (result, reported) = attempt_document(
            self.invoker,
            TransformSource::Document(source),
            &params,
            DocumentKind::NormalizedSchema,
        )
        .await;
        self.absorb(&mut scope, reported);

        let mut dump = None;
        if let Ok(ref normalized) = result {
            if self.config.dumps_compiled_form() {
                let path = self.layout.compiled_dump();
                match persist::store_document(normalized, &path).await {
                    Ok(file) => dump = Some(file),
                    Err(err) => self.note(
                        &mut scope,
                        Diagnostic::warning(format!(
                            "Unable to store compiled document {}: {err}",
                            path.display()
                        )),
                    ),
                }
            }
        }

        self.settle(scope, result, true, |_| Artifact {
            handle: ArtifactHandle::NormalizedSchema,
            files: dump.into_iter().collect(),
        })
    }

    /// Generates and persists the canonical grammar. Returns the persisted
    /// file the conversions read.
    async fn grammar(&mut self, normalized: &Document) -> Option<PersistedFile> {
        let mut scope = self.begin(StageKind::GrammarGeneration, None);
        self.progress(&mut scope, "Create Relax NG");
        let params = StageParams::Grammar(self.params.grammar());
        let path = self.layout.grammar();
        let (result, reported) = attempt_file(
            self.invoker,
            TransformSource::Document(normalized),
            &params,
            &path,
        )
        .await;
        self.absorb(&mut scope, reported);

        self.settle(scope, result, false, |file| {
            Artifact::new(ArtifactHandle::Grammar).with_file(file.clone())
        })
        .ok()
    }

    async fn dtd(&mut self, normalized: &Document) -> Result<(), StageFailure> {
        let mut scope = self.begin(StageKind::DtdGeneration, None);
        self.progress(&mut scope, "Create DTD");
        let dtd = self.params.dtd();
        let path = dtd.output_file.clone();
        let params = StageParams::Dtd(dtd);
        let (result, reported) = attempt_file(
            self.invoker,
            TransformSource::Document(normalized),
            &params,
            &path,
        )
        .await;
        self.absorb(&mut scope, reported);

        let fatal = self.config.dtd_failure_policy == DtdFailurePolicy::Fatal;
        match self.settle(scope, result, fatal, |file| Artifact::files(vec![file.clone()])) {
            Err(failure) if failure.fatal => Err(failure),
            _ => Ok(()),
        }
    }

    /// Converts the persisted grammar, then removes it if it was only an
    /// intermediate.
    async fn conversions(&mut self, grammar: &Path) {
        let compact = self
            .config
            .generate_validation_rng
            .then(|| StageParams::Conversion(self.params.conversion(ConversionTarget::Compact)));
        let structured = self.config.generate_validation_xsd.then(|| {
            StageParams::Conversion(self.params.conversion(ConversionTarget::Structured))
        });

        if self.config.concurrent_conversions {
            let compact_scope = compact
                .as_ref()
                .map(|_| self.begin_with_progress(StageKind::CompactConversion, "Create Compact Relax NG"));
            let structured_scope = structured
                .as_ref()
                .map(|_| self.begin_with_progress(StageKind::StructuredConversion, "Create XSD"));

            let invoker = self.invoker;
            let (compact_attempt, structured_attempt) = futures::join!(
                async {
                    match compact {
                        Some(ref params) => Some(convert(invoker, grammar, params).await),
                        None => None,
                    }
                },
                async {
                    match structured {
                        Some(ref params) => Some(convert(invoker, grammar, params).await),
                        None => None,
                    }
                }
            );

            // merged by stage identity, never by completion order
            if let (Some(scope), Some(attempt)) = (compact_scope, compact_attempt) {
                self.settle_conversion(scope, attempt);
            }
            if let (Some(scope), Some(attempt)) = (structured_scope, structured_attempt) {
                self.settle_conversion(scope, attempt);
            }
        } else {
            if let Some(ref params) = compact {
                let scope =
                    self.begin_with_progress(StageKind::CompactConversion, "Create Compact Relax NG");
                let attempt = convert(self.invoker, grammar, params).await;
                self.settle_conversion(scope, attempt);
            }
            if let Some(ref params) = structured {
                let scope = self.begin_with_progress(StageKind::StructuredConversion, "Create XSD");
                let attempt = convert(self.invoker, grammar, params).await;
                self.settle_conversion(scope, attempt);
            }
        }

        if compact.is_none() {
            self.skip(StageKind::CompactConversion, None, "compact grammar not requested");
        }
        if structured.is_none() {
            self.skip(
                StageKind::StructuredConversion,
                None,
                "structured schema not requested",
            );
        }

        if self.config.discards_grammar_file() && persist::remove_intermediate(grammar).await {
            self.forget_file(StageKind::GrammarGeneration, grammar);
        }
    }

    /// Drops a deleted intermediate from the artifact of the stage that
    /// wrote it, so the outcome only lists files that exist.
    fn forget_file(&mut self, stage: StageKind, path: &Path) {
        let artifact = self
            .stages
            .iter_mut()
            .rev()
            .find(|result| result.stage == stage)
            .and_then(|result| result.artifact.as_mut());
        if let Some(artifact) = artifact {
            if artifact.remove_file(path).is_some() {
                debug!(%stage, path = %path.display(), "Removed intermediate file");
            }
        }
    }

    fn settle_conversion(&mut self, mut scope: StageScope, attempt: Attempt<PersistedFile>) {
        let (result, reported) = attempt;
        self.absorb(&mut scope, reported);
        // recoverable: the failure is recorded and the run continues
        let _ = self.settle(scope, result, false, |file| {
            Artifact::files(vec![file.clone()])
        });
    }

    /// Assembles the documentation source. Only a documentation directory
    /// occupied by a file aborts the run.
    async fn documentation(&mut self, normalized: &Document) -> Result<Option<Document>, StageFailure> {
        let mut scope = self.begin(StageKind::DocumentationAssembly, None);
        let dir = self.layout.documentation_dir().to_path_buf();
        match persist::ensure_directory(&dir).await {
            Ok(DirectoryState::Created) => debug!(path = %dir.display(), "Created documentation directory"),
            Ok(DirectoryState::Existing) => {}
            Err(err) => {
                let failure = StageFailure::fatal(
                    StageKind::DocumentationAssembly,
                    format!("Unable to use documentation directory: {err}"),
                );
                return Err(self.fail(scope, failure));
            }
        }

        let params = StageParams::Documentation(self.params.documentation());
        let (result, reported) = attempt_document(
            self.invoker,
            TransformSource::Document(normalized),
            &params,
            DocumentKind::Documentation,
        )
        .await;
        self.absorb(&mut scope, reported);

        let mut stored = None;
        if let Ok(ref documentation) = result {
            if self.config.produce_documentation_in_source_format {
                self.progress(&mut scope, "Generate Documentation (TEI)");
                let path = self.layout.documentation_source();
                match persist::store_document(documentation, &path).await {
                    Ok(file) => stored = Some(file),
                    Err(err) => self.note(
                        &mut scope,
                        Diagnostic::error(format!(
                            "Unable to store documentation source {}: {err}",
                            path.display()
                        )),
                    ),
                }
            }
        }

        Ok(self
            .settle(scope, result, false, |_| Artifact {
                handle: ArtifactHandle::Documentation,
                files: stored.into_iter().collect(),
            })
            .ok())
    }

    /// Runs every requested format export, then the binary export.
    ///
    /// `document` is the documentation source in compiled form, otherwise
    /// the loaded input. When it is absent every export is skipped.
    async fn exports(&mut self, document: Option<&Document>) {
        let formats: Vec<String> = self
            .config
            .export_formats()
            .into_iter()
            .map(str::to_string)
            .collect();

        for format in formats {
            match document {
                Some(document) => {
                    self.export(document, &format)
                        .instrument(info_span!("stage", stage = %StageKind::FormatExport, %format))
                        .await;
                }
                None => self.skip(
                    StageKind::FormatExport,
                    Some(&format),
                    "documentation source unavailable",
                ),
            }
        }

        if self.config.wants_binary_export() {
            match document {
                Some(document) => {
                    self.binary_export(document)
                        .instrument(info_span!("stage", stage = %StageKind::BinaryDocumentExport))
                        .await;
                }
                None => self.skip(
                    StageKind::BinaryDocumentExport,
                    None,
                    "documentation source unavailable",
                ),
            }
        }
    }

    async fn export(&mut self, document: &Document, format: &str) {
        let mut scope = self.begin(StageKind::FormatExport, Some(format));
        let progress = if self.config.use_compiled_form {
            format!("Generate Documentation ({format})")
        } else {
            format!("Generate {format} file")
        };
        self.progress(&mut scope, progress);

        let export = self.params.export(format);
        let path = export.output_file.clone();
        let params = StageParams::Export(export);
        let (result, reported) = attempt_file(
            self.invoker,
            TransformSource::Document(document),
            &params,
            &path,
        )
        .await;
        self.absorb(&mut scope, reported);

        let mut support = Vec::new();
        if result.is_ok() {
            let dir = self.layout.export_dir().to_path_buf();
            for copied in persist::copy_support_files(&self.config.resources, &dir).await {
                match copied {
                    Ok(file) => support.push(file),
                    Err(failure) => self.note(
                        &mut scope,
                        Diagnostic::warning(format!(
                            "Unable to copy {} to {}: {}",
                            failure.name,
                            failure.destination.display(),
                            failure.error
                        )),
                    ),
                }
            }
        }

        let _ = self.settle(scope, result, false, |file| {
            let mut artifact = Artifact::files(vec![file.clone()]);
            for copied in support {
                artifact.push_file(copied);
            }
            artifact
        });
    }

    async fn binary_export(&mut self, document: &Document) {
        let mut scope = self.begin(StageKind::BinaryDocumentExport, None);
        let progress = if self.config.use_compiled_form {
            format!("Generate Documentation ({BINARY_DOCUMENT_FORMAT})")
        } else {
            format!(
                "Generate {BINARY_DOCUMENT_FORMAT} file from: {}",
                self.config.input.display()
            )
        };
        self.progress(&mut scope, progress);

        let params = match self.params.binary_export() {
            Ok(params) => params,
            Err(err) => {
                let failure =
                    StageFailure::recoverable(StageKind::BinaryDocumentExport, err.to_string());
                let _ = self.fail(scope, failure);
                return;
            }
        };
        let path = params.output_file.clone();
        let params = StageParams::BinaryExport(params);
        let (result, reported) = attempt_file(
            self.invoker,
            TransformSource::Document(document),
            &params,
            &path,
        )
        .await;
        self.absorb(&mut scope, reported);

        let _ = self.settle(scope, result, false, |file| {
            Artifact::files(vec![file.clone()])
        });
    }

    fn begin(&mut self, stage: StageKind, target: Option<&str>) -> StageScope {
        debug!(%stage, ?target, "Stage started");
        StageScope {
            stage,
            target: target.map(str::to_string),
            started_at: Utc::now(),
            clock: Instant::now(),
            diagnostics: Vec::new(),
        }
    }

    fn begin_with_progress(&mut self, stage: StageKind, progress: &str) -> StageScope {
        let mut scope = self.begin(stage, None);
        self.progress(&mut scope, progress);
        scope
    }

    fn progress(&mut self, scope: &mut StageScope, message: impl Into<String>) {
        self.note(scope, Diagnostic::info(message));
    }

    /// Records a diagnostic in the run log and the stage's own list.
    fn note(&mut self, scope: &mut StageScope, diagnostic: Diagnostic) {
        let diagnostic = diagnostic.with_stage(scope.stage);
        scope.diagnostics.push(diagnostic.clone());
        self.log.record(diagnostic);
    }

    fn absorb(&mut self, scope: &mut StageScope, reported: Vec<Diagnostic>) {
        for diagnostic in reported {
            self.note(scope, diagnostic);
        }
    }

    /// Records the stage's terminal result.
    ///
    /// Failures are recorded as fatal when `fatal` is set, and returned so
    /// the caller can propagate them.
    fn settle<T>(
        &mut self,
        scope: StageScope,
        result: Result<T, StageFailure>,
        fatal: bool,
        artifact: impl FnOnce(&T) -> Artifact,
    ) -> Result<T, StageFailure> {
        match result {
            Ok(value) => {
                self.complete(scope, artifact(&value));
                Ok(value)
            }
            Err(failure) => {
                let failure = if fatal { failure.escalate() } else { failure };
                Err(self.fail(scope, failure))
            }
        }
    }

    fn complete(&mut self, scope: StageScope, artifact: Artifact) {
        let duration_ms = elapsed_ms(scope.clock);
        info!(stage = %scope.stage, target = ?scope.target, duration_ms, files = artifact.files.len(), "Stage completed");
        self.stages.push(
            StageResult::completed(scope.stage, scope.started_at, artifact)
                .with_target(scope.target)
                .with_diagnostics(scope.diagnostics)
                .with_duration_ms(duration_ms),
        );
    }

    fn fail(&mut self, mut scope: StageScope, failure: StageFailure) -> StageFailure {
        let diagnostic = if failure.fatal {
            Diagnostic::fatal(failure.to_string())
        } else {
            Diagnostic::error(failure.to_string())
        };
        self.note(
            &mut scope,
            diagnostic.with_optional_location(failure.location.clone()),
        );

        let duration_ms = elapsed_ms(scope.clock);
        warn!(stage = %scope.stage, target = ?scope.target, fatal = failure.fatal, duration_ms, "Stage failed");
        self.stages.push(
            StageResult::failed(scope.stage, scope.started_at, failure.fatal)
                .with_target(scope.target.clone())
                .with_diagnostics(scope.diagnostics)
                .with_duration_ms(duration_ms),
        );
        failure.with_target(scope.target)
    }

    fn skip(&mut self, stage: StageKind, target: Option<&str>, reason: &str) {
        debug!(%stage, ?target, reason, "Stage skipped");
        self.stages.push(
            StageResult::skipped(stage, reason).with_target(target.map(str::to_string)),
        );
    }
}

async fn convert(
    invoker: &TransformInvoker,
    grammar: &Path,
    params: &StageParams,
) -> Attempt<PersistedFile> {
    let Some(path) = params.output_file().cloned() else {
        return (
            Err(StageFailure::recoverable(
                params.stage(),
                "conversion has no output file",
            )),
            Vec::new(),
        );
    };
    attempt_file(invoker, TransformSource::File(grammar), params, &path).await
}
