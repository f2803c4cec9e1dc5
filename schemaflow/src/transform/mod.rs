//! The external-engine seam.
//!
//! Schemaflow never transforms documents itself. Every transformation goes
//! through a [`TransformEngine`], called exactly once per stage through the
//! [`TransformInvoker`], which turns engine errors into [`StageFailure`]s.

mod engine;
mod failure;
mod invoker;
mod reporter;

pub use engine::{
    EngineError, TransformEngine, TransformId, TransformOutput, TransformRequest, TransformSource,
};
pub use failure::StageFailure;
pub use invoker::TransformInvoker;
pub use reporter::StageReporter;
