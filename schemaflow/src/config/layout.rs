//! Output path derivation.

use super::{RunConfiguration, BINARY_DOCUMENT_FORMAT, SOURCE_DOCUMENT_FORMAT};
use std::path::{Path, PathBuf};

/// Every output path of a run, derived from its configuration.
///
/// All names follow `{schema_name}.{ext}`. The one possible clash, an
/// `xml` export next to the documentation source, is rejected by
/// [`RunConfiguration::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    output_dir: PathBuf,
    documentation_dir: PathBuf,
    schema_name: String,
    compiled: bool,
}

impl OutputLayout {
    /// Derives the layout from a configuration.
    #[must_use]
    pub fn new(config: &RunConfiguration) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            documentation_dir: config.documentation_dir(),
            schema_name: config.schema_name.clone(),
            compiled: config.use_compiled_form,
        }
    }

    /// Returns the output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns the documentation directory.
    #[must_use]
    pub fn documentation_dir(&self) -> &Path {
        &self.documentation_dir
    }

    fn in_output(&self, ext: &str) -> PathBuf {
        self.output_dir.join(format!("{}.{ext}", self.schema_name))
    }

    /// `O/{schema}.compiled.odd`
    #[must_use]
    pub fn compiled_dump(&self) -> PathBuf {
        self.in_output("compiled.odd")
    }

    /// `O/{schema}.rng`
    #[must_use]
    pub fn grammar(&self) -> PathBuf {
        self.in_output("rng")
    }

    /// `O/{schema}.rnc`
    #[must_use]
    pub fn compact_grammar(&self) -> PathBuf {
        self.in_output("rnc")
    }

    /// `O/{schema}.xsd`
    #[must_use]
    pub fn structured_schema(&self) -> PathBuf {
        self.in_output("xsd")
    }

    /// `O/{schema}.dtd`
    #[must_use]
    pub fn dtd(&self) -> PathBuf {
        self.in_output("dtd")
    }

    /// `D/{schema}.xml`
    #[must_use]
    pub fn documentation_source(&self) -> PathBuf {
        self.documentation_dir
            .join(format!("{}.{SOURCE_DOCUMENT_FORMAT}", self.schema_name))
    }

    /// Directory receiving exports: `D` in compiled form, otherwise `O`.
    #[must_use]
    pub fn export_dir(&self) -> &Path {
        if self.compiled {
            &self.documentation_dir
        } else {
            &self.output_dir
        }
    }

    /// `{export_dir}/{schema}.{format}`
    #[must_use]
    pub fn export(&self, format: &str) -> PathBuf {
        self.export_dir()
            .join(format!("{}.{format}", self.schema_name))
    }

    /// `{export_dir}/{schema}.docx`
    #[must_use]
    pub fn binary_document(&self) -> PathBuf {
        self.export(BINARY_DOCUMENT_FORMAT)
    }
}
