//! Wraps exactly one engine call per stage.

use super::{
    StageFailure, StageReporter, TransformEngine, TransformId, TransformOutput, TransformRequest,
    TransformSource,
};
use crate::params::StageParams;
use crate::utils::elapsed_ms;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Calls the engine and translates its errors into [`StageFailure`]s.
///
/// Failures come back recoverable; the pipeline escalates them for the
/// stages whose failure aborts the run. Calls are never retried.
#[derive(Clone)]
pub struct TransformInvoker {
    engine: Arc<dyn TransformEngine>,
}

impl TransformInvoker {
    /// Creates an invoker over an engine.
    #[must_use]
    pub fn new(engine: Arc<dyn TransformEngine>) -> Self {
        Self { engine }
    }

    /// Runs the transformation for `params.stage()`.
    ///
    /// A fatal diagnostic reported by the engine fails the call even when
    /// the engine returned output.
    pub async fn invoke(
        &self,
        source: TransformSource<'_>,
        params: &StageParams,
        reporter: &StageReporter,
    ) -> Result<TransformOutput, StageFailure> {
        let stage = params.stage();
        let id = TransformId::for_stage(stage);
        let started = Instant::now();
        debug!(
            engine = self.engine.name(),
            transform = %id,
            source = ?source.path(),
            "Invoking transform"
        );

        let request = TransformRequest { id, source, params };
        let result = self.engine.transform(request, reporter).await;
        let duration_ms = elapsed_ms(started);

        match result {
            Ok(_) if reporter.has_fatal() => {
                let fatal = reporter.first_fatal();
                let message = fatal
                    .as_ref()
                    .map_or_else(|| id.to_string(), |d| d.message.clone());
                warn!(transform = %id, duration_ms, "Transform reported a fatal error");
                Err(StageFailure::recoverable(stage, message)
                    .with_location(fatal.and_then(|d| d.location)))
            }
            Ok(output) => {
                debug!(transform = %id, duration_ms, "Transform completed");
                Ok(output)
            }
            Err(err) => {
                warn!(transform = %id, duration_ms, error = %err, "Transform failed");
                Err(StageFailure::recoverable(stage, err.message).with_location(err.location))
            }
        }
    }
}

impl fmt::Debug for TransformInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformInvoker")
            .field("engine", &self.engine.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Document, DocumentKind, SourceLocation, StageKind};
    use crate::params::{DocumentationParams, LoadParams};
    use crate::transform::EngineError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::{Path, PathBuf};

    #[derive(Default)]
    struct FixedEngine {
        fail_with: Option<EngineError>,
        report_fatal: bool,
        calls: Mutex<Vec<TransformId>>,
    }

    #[async_trait]
    impl TransformEngine for FixedEngine {
        async fn transform(
            &self,
            request: TransformRequest<'_>,
            reporter: &StageReporter,
        ) -> Result<TransformOutput, EngineError> {
            self.calls.lock().push(request.id);
            if self.report_fatal {
                reporter.fatal("engine gave up", None);
            }
            match self.fail_with {
                Some(ref err) => Err(err.clone()),
                None => Ok(TransformOutput::Document(Document::new(
                    DocumentKind::Documentation,
                    "<TEI/>",
                ))),
            }
        }
    }

    fn docs_params() -> StageParams {
        StageParams::Documentation(DocumentationParams {
            locale: "en".to_string(),
        })
    }

    #[tokio::test]
    async fn test_invoke_success() {
        let engine = Arc::new(FixedEngine::default());
        let invoker = TransformInvoker::new(engine.clone());
        let doc = Document::new(DocumentKind::NormalizedSchema, "<schemaSpec/>");
        let reporter = StageReporter::new(StageKind::DocumentationAssembly);

        let output = invoker
            .invoke(TransformSource::Document(&doc), &docs_params(), &reporter)
            .await
            .unwrap();

        assert!(output.into_document().is_some());
        assert_eq!(*engine.calls.lock(), vec![TransformId::GenerateDocumentation]);
    }

    #[tokio::test]
    async fn test_invoke_maps_engine_error() {
        let engine = Arc::new(FixedEngine {
            fail_with: Some(
                EngineError::new("not well-formed")
                    .with_location(SourceLocation::new("in.odd").at(1, 2)),
            ),
            ..FixedEngine::default()
        });
        let invoker = TransformInvoker::new(engine.clone());
        let params = StageParams::Load(LoadParams {
            input: PathBuf::from("in.odd"),
        });
        let reporter = StageReporter::new(StageKind::Load);

        let failure = invoker
            .invoke(TransformSource::File(Path::new("in.odd")), &params, &reporter)
            .await
            .unwrap_err();

        assert_eq!(failure.stage, StageKind::Load);
        assert_eq!(failure.message, "not well-formed");
        assert!(!failure.fatal);
        assert_eq!(failure.location.unwrap().column, Some(2));
        // never retried
        assert_eq!(engine.calls.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_reported_fatal_fails_the_call() {
        let engine = Arc::new(FixedEngine {
            report_fatal: true,
            ..FixedEngine::default()
        });
        let invoker = TransformInvoker::new(engine);
        let doc = Document::new(DocumentKind::NormalizedSchema, "<schemaSpec/>");
        let reporter = StageReporter::new(StageKind::DocumentationAssembly);

        let failure = invoker
            .invoke(TransformSource::Document(&doc), &docs_params(), &reporter)
            .await
            .unwrap_err();

        assert_eq!(failure.message, "engine gave up");
        assert_eq!(reporter.len(), 1);
    }
}
