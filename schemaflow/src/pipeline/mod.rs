//! Pipeline orchestration.
//!
//! [`SchemaPipeline`] walks the fixed stage graph:
//!
//! 1. load (fatal)
//! 2. normalize (fatal; gated by the compiled form)
//! 3. grammar generation, then its two conversions
//! 4. DTD generation (fatal or recoverable, by policy)
//! 5. documentation assembly
//! 6. one export per requested format, then the binary export

mod orchestrator;
#[cfg(test)]
mod orchestrator_tests;
mod persist;

pub use orchestrator::SchemaPipeline;
