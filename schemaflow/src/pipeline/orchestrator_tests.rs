//! Tests for stage sequencing, gating and failure propagation.

#[cfg(test)]
mod tests {
    use crate::config::{DtdFailurePolicy, RunConfiguration};
    use crate::core::{RunOutcome, RunStatus, Severity, StageKind, StageStatus};
    use crate::diagnostics::CollectingDiagnosticSink;
    use crate::params::StageParams;
    use crate::pipeline::SchemaPipeline;
    use crate::testing::{SchemaWorkspace, ScriptedEngine};
    use crate::transform::TransformId;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn workspace() -> (TempDir, SchemaWorkspace) {
        let dir = TempDir::new().unwrap();
        let workspace = SchemaWorkspace::create(dir.path()).unwrap();
        (dir, workspace)
    }

    async fn run(engine: ScriptedEngine, config: &RunConfiguration) -> (RunOutcome, Arc<ScriptedEngine>) {
        let engine = Arc::new(engine);
        let outcome = SchemaPipeline::new(engine.clone()).execute(config).await;
        (outcome, engine)
    }

    fn info_messages(outcome: &RunOutcome) -> Vec<String> {
        outcome
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Info)
            .map(|d| d.message.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_default_run_order_and_progress() {
        let (_dir, ws) = workspace();
        let config = ws.config("x");

        let (outcome, engine) = run(ScriptedEngine::new(), &config).await;

        assert_eq!(outcome.status, RunStatus::Success);
        assert_eq!(
            engine.call_ids(),
            vec![
                TransformId::Load,
                TransformId::Normalize,
                TransformId::GenerateGrammar,
                TransformId::GenerateDtd,
                TransformId::ConvertCompact,
                TransformId::ConvertStructured,
            ]
        );
        assert_eq!(
            info_messages(&outcome),
            vec![
                format!("Start processing {}", ws.input().display()),
                "Create compiled odd".to_string(),
                "Create Relax NG".to_string(),
                "Create DTD".to_string(),
                "Create Compact Relax NG".to_string(),
                "Create XSD".to_string(),
                "done".to_string(),
            ]
        );
        assert_eq!(
            ws.output_files().unwrap(),
            vec!["x.dtd", "x.rnc", "x.rng", "x.xsd"]
        );
        assert_eq!(
            outcome.stage(StageKind::DocumentationAssembly).unwrap().status,
            StageStatus::Skipped
        );
    }

    #[tokio::test]
    async fn test_load_failure_aborts_run() {
        let (_dir, ws) = workspace();
        let config = ws.config("x");

        let engine = ScriptedEngine::new().fail_on(TransformId::Load, "not well-formed");
        let (outcome, engine) = run(engine, &config).await;

        assert_eq!(outcome.status, RunStatus::Failure);
        assert_eq!(engine.call_ids(), vec![TransformId::Load]);
        assert_eq!(
            outcome.fatal_message.as_deref(),
            Some("Stage load failed: not well-formed")
        );
        assert!(outcome.stage(StageKind::Load).unwrap().fatal);
        assert!(!info_messages(&outcome).contains(&"done".to_string()));
        assert!(ws.output_files().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_normalize_failure_aborts_run() {
        let (_dir, ws) = workspace();
        let config = ws.config("x").with_formats(["html"]);

        let engine = ScriptedEngine::new().fail_on(TransformId::Normalize, "unresolved module");
        let (outcome, engine) = run(engine, &config).await;

        assert_eq!(outcome.status, RunStatus::Failure);
        assert_eq!(
            engine.call_ids(),
            vec![TransformId::Load, TransformId::Normalize]
        );
        assert!(outcome.has_fatal());
        assert!(ws.output_files().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dtd_failure_fatal_after_grammar_is_partial() {
        let (_dir, ws) = workspace();
        let config = ws.config("x").with_formats(["html"]);

        let engine = ScriptedEngine::new().fail_on(TransformId::GenerateDtd, "boom");
        let (outcome, engine) = run(engine, &config).await;

        assert_eq!(outcome.status, RunStatus::PartialFailure);
        assert_eq!(
            outcome.fatal_message.as_deref(),
            Some("Stage dtd-generation failed: boom")
        );
        assert!(!engine.was_called(TransformId::ConvertCompact));
        assert!(!engine.was_called(TransformId::Export));
        // no rollback of what was already written
        assert!(ws.output("x.rng").exists());
    }

    #[tokio::test]
    async fn test_dtd_failure_fatal_without_validation_artifact_is_failure() {
        let (_dir, ws) = workspace();
        let config = ws.config("x").with_validation(false, false, true);

        let engine = ScriptedEngine::new().fail_on(TransformId::GenerateDtd, "boom");
        let (outcome, _engine) = run(engine, &config).await;

        assert_eq!(outcome.status, RunStatus::Failure);
    }

    #[tokio::test]
    async fn test_dtd_failure_recoverable_policy_continues() {
        let (_dir, ws) = workspace();
        let config = ws
            .config("x")
            .with_formats(["html"])
            .with_dtd_failure_policy(DtdFailurePolicy::Recoverable);

        let engine = ScriptedEngine::new().fail_on(TransformId::GenerateDtd, "boom");
        let (outcome, engine) = run(engine, &config).await;

        assert_eq!(outcome.status, RunStatus::PartialFailure);
        assert!(outcome.fatal_message.is_none());
        let dtd = outcome.stage(StageKind::DtdGeneration).unwrap();
        assert!(dtd.is_failure());
        assert!(!dtd.fatal);
        assert!(engine.was_called(TransformId::ConvertStructured));
        assert_eq!(engine.exported_formats(), vec!["html"]);
        assert!(ws.documentation("x.html").exists());
    }

    #[tokio::test]
    async fn test_grammar_failure_skips_conversions_only() {
        let (_dir, ws) = workspace();
        let config = ws.config("x").with_formats(["html"]);

        let engine = ScriptedEngine::new().fail_on(TransformId::GenerateGrammar, "no start");
        let (outcome, engine) = run(engine, &config).await;

        assert_eq!(outcome.status, RunStatus::PartialFailure);
        for kind in [StageKind::CompactConversion, StageKind::StructuredConversion] {
            let result = outcome.stage(kind).unwrap();
            assert_eq!(result.status, StageStatus::Skipped);
            assert_eq!(result.skip_reason.as_deref(), Some("grammar unavailable"));
        }
        assert!(engine.was_called(TransformId::GenerateDtd));
        assert!(outcome.export("html").unwrap().is_success());
    }

    #[tokio::test]
    async fn test_engine_reported_fatal_fails_documentation() {
        let (_dir, ws) = workspace();
        let config = ws.config("x").with_formats(["html", "pdf"]);

        let engine = ScriptedEngine::new()
            .report_fatal_on(TransformId::GenerateDocumentation, "broken reference");
        let (outcome, engine) = run(engine, &config).await;

        assert_eq!(outcome.status, RunStatus::PartialFailure);
        assert!(outcome.stage(StageKind::DocumentationAssembly).unwrap().is_failure());
        assert!(!engine.was_called(TransformId::Export));
        for format in ["html", "pdf"] {
            assert_eq!(
                outcome.export(format).unwrap().skip_reason.as_deref(),
                Some("documentation source unavailable")
            );
        }
    }

    #[tokio::test]
    async fn test_export_failure_is_isolated() {
        let (_dir, ws) = workspace();
        let config = ws.config("x").with_formats(["pdf", "html", "epub"]);

        let engine = ScriptedEngine::new().fail_on_format("html", "renderer crashed");
        let (outcome, engine) = run(engine, &config).await;

        assert_eq!(outcome.status, RunStatus::PartialFailure);
        assert_eq!(engine.exported_formats(), vec!["pdf", "html", "epub"]);
        assert!(outcome.export("pdf").unwrap().is_success());
        assert!(outcome.export("html").unwrap().is_failure());
        assert!(outcome.export("epub").unwrap().is_success());
        assert!(!ws.documentation("x.html").exists());
    }

    #[tokio::test]
    async fn test_export_params_reach_engine() {
        let (_dir, ws) = workspace();
        let config = ws
            .config("x")
            .with_locale("de")
            .with_profile("plain")
            .with_formats(["html", "pdf"]);

        let (_outcome, engine) = run(ScriptedEngine::new(), &config).await;

        let exports: Vec<_> = engine
            .calls()
            .into_iter()
            .filter_map(|call| match call.params {
                StageParams::Export(params) => Some(params),
                _ => None,
            })
            .collect();
        assert_eq!(exports.len(), 2);
        assert_eq!(exports[0].stylesheet_param("lang"), Some("de"));
        assert_eq!(exports[0].profile.as_deref(), Some("plain"));
        assert!(exports[1].stylesheet_params.is_empty());
        assert_eq!(exports[1].output_file, ws.documentation("x.pdf"));
    }

    #[tokio::test]
    async fn test_invalid_configuration_invokes_nothing() {
        let (_dir, ws) = workspace();
        let config = ws.config("x").with_formats(["docx"]);

        let (outcome, engine) = run(ScriptedEngine::new(), &config).await;

        assert_eq!(outcome.status, RunStatus::Failure);
        assert_eq!(engine.call_count(), 0);
        assert!(outcome.stages.is_empty());
        assert!(outcome
            .fatal_message
            .as_deref()
            .unwrap()
            .contains("profile_name"));
    }

    #[tokio::test]
    async fn test_occupied_documentation_dir_is_fatal() {
        let (_dir, ws) = workspace();
        std::fs::write(ws.output("documentation"), "in the way").unwrap();
        let config = ws.config("x").with_formats(["html"]);

        let (outcome, engine) = run(ScriptedEngine::new(), &config).await;

        assert_eq!(outcome.status, RunStatus::PartialFailure);
        assert!(outcome
            .fatal_message
            .as_deref()
            .unwrap()
            .contains("not a directory"));
        assert!(!engine.was_called(TransformId::GenerateDocumentation));
        assert!(!engine.was_called(TransformId::Export));
    }

    #[tokio::test]
    async fn test_existing_documentation_dir_is_accepted() {
        let (_dir, ws) = workspace();
        std::fs::create_dir(ws.output("documentation")).unwrap();
        let config = ws.config("x").with_documentation_source(true);

        let (outcome, _engine) = run(ScriptedEngine::new(), &config).await;

        assert_eq!(outcome.status, RunStatus::Success);
        assert!(ws.documentation("x.xml").exists());
    }

    #[tokio::test]
    async fn test_compiled_dump_when_verbose() {
        let (_dir, ws) = workspace();
        let config = ws.config("x").with_verbose(true);

        let (outcome, _engine) = run(ScriptedEngine::new(), &config).await;

        let normalize = outcome.stage(StageKind::Normalize).unwrap();
        let dump = ws.output("x.compiled.odd");
        assert!(dump.exists());
        assert!(normalize.artifact.as_ref().unwrap().file_at(&dump).is_some());
    }

    #[tokio::test]
    async fn test_no_compiled_dump_by_default() {
        let (_dir, ws) = workspace();
        let config = ws.config("x");

        let (_outcome, _engine) = run(ScriptedEngine::new(), &config).await;

        assert!(!ws.output("x.compiled.odd").exists());
    }

    #[tokio::test]
    async fn test_missing_support_file_is_a_warning() {
        let (_dir, ws) = workspace();
        std::fs::remove_file(ws.resources().css_dir.join("odd.css")).unwrap();
        let config = ws.config("x").with_formats(["html"]);

        let (outcome, _engine) = run(ScriptedEngine::new(), &config).await;

        assert_eq!(outcome.status, RunStatus::Success);
        assert!(ws.documentation("x.html").exists());
        assert!(ws.documentation("tei.css").exists());
        let warnings: Vec<_> = outcome.diagnostics_at_least(Severity::Warning).collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.starts_with("Unable to copy odd.css"));
    }

    #[tokio::test]
    async fn test_engine_warnings_are_recorded_in_stage() {
        let (_dir, ws) = workspace();
        let config = ws.config("x");

        let engine = ScriptedEngine::new().warn_on(TransformId::GenerateGrammar, "unused macro");
        let (outcome, _engine) = run(engine, &config).await;

        assert_eq!(outcome.status, RunStatus::Success);
        let grammar = outcome.stage(StageKind::GrammarGeneration).unwrap();
        let messages: Vec<_> = grammar.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["Create Relax NG", "unused macro"]);
    }

    #[tokio::test]
    async fn test_sink_receives_every_diagnostic_in_order() {
        let (_dir, ws) = workspace();
        let config = ws.config("x").with_formats(["html"]);
        let sink = Arc::new(CollectingDiagnosticSink::new());

        let outcome = SchemaPipeline::new(Arc::new(ScriptedEngine::new()))
            .with_sink(sink.clone())
            .execute(&config)
            .await;

        assert_eq!(sink.diagnostics(), outcome.diagnostics);
    }

    #[tokio::test]
    async fn test_concurrent_conversions_merge_by_stage() {
        let (_dir, ws) = workspace();
        let config = ws.config("x").with_concurrent_conversions(true);

        let engine =
            ScriptedEngine::new().delay(TransformId::ConvertCompact, Duration::from_millis(30));
        let (outcome, _engine) = run(engine, &config).await;

        assert_eq!(outcome.status, RunStatus::Success);
        let kinds: Vec<_> = outcome
            .stages
            .iter()
            .filter(|s| s.stage.is_grammar_conversion())
            .map(|s| s.stage)
            .collect();
        assert_eq!(
            kinds,
            vec![StageKind::CompactConversion, StageKind::StructuredConversion]
        );
        assert!(ws.output("x.rnc").exists());
        assert!(ws.output("x.xsd").exists());
    }

    #[tokio::test]
    async fn test_documentation_progress_follows_requests() {
        let (_dir, ws) = workspace();
        let exports_only = ws
            .config("x")
            .with_validation(false, false, false)
            .with_documentation_source(false)
            .with_formats(["html"]);

        let (outcome, _) = run(ScriptedEngine::new(), &exports_only).await;
        let messages = info_messages(&outcome);
        assert!(messages.contains(&"Generate Output".to_string()));
        assert!(messages.contains(&"Generate Documentation (html)".to_string()));
        assert!(!messages.contains(&"Generate Documentation (TEI)".to_string()));

        let with_source = exports_only.clone().with_documentation_source(true);
        let (outcome, _) = run(ScriptedEngine::new(), &with_source).await;
        let messages = info_messages(&outcome);
        let position = |m: &str| messages.iter().position(|x| x == m).unwrap();
        assert!(position("Generate Output") < position("Generate Documentation (TEI)"));
        assert!(position("Generate Documentation (TEI)") < position("Generate Documentation (html)"));
    }

    #[tokio::test]
    async fn test_direct_exports_skip_output_banner() {
        let (_dir, ws) = workspace();
        let config = ws.config("x").with_compiled_form(false).with_formats(["html"]);

        let (outcome, engine) = run(ScriptedEngine::new(), &config).await;

        assert!(engine.was_called(TransformId::Export));
        let messages = info_messages(&outcome);
        assert!(!messages.contains(&"Generate Output".to_string()));
        assert!(messages.contains(&"Generate html file".to_string()));
    }
}
