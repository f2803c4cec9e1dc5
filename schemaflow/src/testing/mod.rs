//! Testing utilities for schemaflow pipelines.
//!
//! This module provides:
//! - A scripted, recording transform engine with fault injection
//! - A workspace fixture laying out an input document, an output
//!   directory and the support resources

mod fixtures;
mod mocks;

pub use fixtures::{SchemaWorkspace, SAMPLE_SCHEMA};
pub use mocks::{RecordedCall, ScriptedEngine};
