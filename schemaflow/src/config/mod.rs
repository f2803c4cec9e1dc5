//! Run configuration.
//!
//! This module provides:
//! - The immutable [`RunConfiguration`] consumed by the orchestrator
//! - The [`ResourceLayout`] locating support files and templates
//! - The [`OutputLayout`] deriving every output path from the configuration

mod layout;
mod resources;
mod run;

pub use layout::OutputLayout;
pub use resources::{ResourceLayout, SUPPORT_FILES};
pub use run::{
    is_binary_format, DtdFailurePolicy, RunConfiguration, BINARY_DOCUMENT_FORMAT, REFLOWABLE_FORMAT,
    SOURCE_DOCUMENT_FORMAT,
};
