//! Diagnostic delivery and run reports.

use schemaflow::prelude::*;
use schemaflow::testing::{SchemaWorkspace, ScriptedEngine};
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn channel_sink_streams_progress_to_another_task() {
    let dir = TempDir::new().unwrap();
    let ws = SchemaWorkspace::create(dir.path()).unwrap();
    let config = ws.config("x").with_formats(["html"]);
    let (sink, mut receiver) = ChannelDiagnosticSink::channel();

    let consumer = tokio::spawn(async move {
        let mut messages = Vec::new();
        while let Some(diagnostic) = receiver.recv().await {
            messages.push(diagnostic.message);
        }
        messages
    });

    let outcome = SchemaPipeline::new(Arc::new(ScriptedEngine::new()))
        .with_sink(Arc::new(sink))
        .execute(&config)
        .await;
    // the pipeline was a temporary, so its sender is gone and the channel closed

    let expected: Vec<String> = outcome.diagnostics.iter().map(|d| d.message.clone()).collect();
    let received = consumer.await.unwrap();
    assert_eq!(received, expected);
    assert_eq!(received.last().map(String::as_str), Some("done"));
}

#[tokio::test]
async fn report_names_failed_and_skipped_stages() {
    let dir = TempDir::new().unwrap();
    let ws = SchemaWorkspace::create(dir.path()).unwrap();
    let config = ws.config("x").with_formats(["html", "pdf"]);
    let engine = ScriptedEngine::new()
        .fail_on(TransformId::GenerateGrammar, "no start pattern")
        .warn_on(TransformId::Export, "image not found");

    let outcome = SchemaPipeline::new(Arc::new(engine)).execute(&config).await;
    let report = summarize(&outcome);
    let text = report.to_string();

    assert_eq!(report.status, RunStatus::PartialFailure);
    assert_eq!(report.warnings, 2);
    assert_eq!(report.errors, 1);
    assert!(text.starts_with("Run partial failure"));
    assert!(text.contains("grammar-generation (Stage grammar-generation failed: no start pattern)"));
    assert!(text.contains("compact-conversion (grammar unavailable)"));
    assert!(text.contains("format-export[pdf]"));

    let error_at = text.find("[error] grammar-generation").unwrap();
    let warning_at = text.find("[warning] format-export: image not found").unwrap();
    assert!(error_at < warning_at);
}

#[tokio::test]
async fn report_for_rejected_run_carries_cause() {
    let dir = TempDir::new().unwrap();
    let ws = SchemaWorkspace::create(dir.path()).unwrap();
    let config = ws.config("../escape");

    let outcome = SchemaPipeline::new(Arc::new(ScriptedEngine::new()))
        .execute(&config)
        .await;
    let text = summarize(&outcome).to_string();

    assert_eq!(outcome.status, RunStatus::Failure);
    assert!(text.contains("Aborted: Invalid schema_name '../escape'"));
}

#[tokio::test]
async fn outcome_round_trips_through_json() {
    let dir = TempDir::new().unwrap();
    let ws = SchemaWorkspace::create(dir.path()).unwrap();
    let outcome = SchemaPipeline::new(Arc::new(ScriptedEngine::new()))
        .execute(&ws.config("x"))
        .await;

    let json = outcome.to_json().unwrap();
    let parsed: RunOutcome = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.run_id, outcome.run_id);
    assert_eq!(parsed.status, outcome.status);
    assert_eq!(parsed.stages.len(), outcome.stages.len());
    assert_eq!(parsed.diagnostics, outcome.diagnostics);
}
