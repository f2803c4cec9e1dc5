//! Stage configuration builder.
//!
//! Each stage receives one named, immutable parameter record derived from
//! the [`RunConfiguration`](crate::config::RunConfiguration). Deriving a
//! record is pure: no I/O and no side effects.

mod builder;
mod records;

pub use builder::StageConfigBuilder;
pub use records::{
    BinaryExportParams, ConversionParams, ConversionTarget, DocumentationParams, DtdParams,
    ExportParams, GrammarParams, LoadParams, NormalizeParams, StageParams,
};
