//! The immutable input to a pipeline execution.

use super::ResourceLayout;
use crate::errors::{ConfigError, PreconditionError, SchemaflowError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Format identifier of the binary document export, matched case-insensitively.
pub const BINARY_DOCUMENT_FORMAT: &str = "docx";

/// Extension of the documentation source written next to the exports.
pub const SOURCE_DOCUMENT_FORMAT: &str = "xml";

/// Format identifier that receives the extra reflowable-text parameters.
pub const REFLOWABLE_FORMAT: &str = "html";

#[allow(clippy::expect_used)]
static FILE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-][A-Za-z0-9._-]*$").expect("file-name token pattern is valid")
});

/// How a DTD generation failure affects the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DtdFailurePolicy {
    /// Abort the remaining stages (default).
    #[default]
    Fatal,
    /// Record the failure and continue, like grammar generation.
    Recoverable,
}

/// Configuration for one pipeline run.
///
/// Constructed once per invocation and never mutated during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfiguration {
    /// Path of the schema-definition document.
    pub input: PathBuf,
    /// Directory receiving every output.
    pub output_dir: PathBuf,
    /// Base name of every output file.
    #[serde(default = "default_schema_name")]
    pub schema_name: String,
    /// Locale / language tag passed to every transformation.
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Produce `{schema}.xsd`.
    #[serde(default = "default_true")]
    pub generate_validation_xsd: bool,
    /// Produce `{schema}.dtd`.
    #[serde(default = "default_true")]
    pub generate_validation_dtd: bool,
    /// Produce `{schema}.rng` / `{schema}.rnc`.
    #[serde(default = "default_true")]
    pub generate_validation_rng: bool,
    /// Produce the compiled intermediate at all; gates every derived stage.
    #[serde(default = "default_true")]
    pub use_compiled_form: bool,
    /// Persist the documentation-source document as `{schema}.xml`.
    #[serde(default)]
    pub produce_documentation_in_source_format: bool,
    /// Requested export formats, in processing order.
    #[serde(default)]
    pub requested_documentation_formats: Vec<String>,
    /// Strip the compiled document (also dumps it to disk).
    #[serde(default)]
    pub strip_when_compiling: bool,
    /// Verbose transformations; dumps intermediates and keeps the grammar file.
    #[serde(default)]
    pub verbose_diagnostics: bool,
    /// Take the schema version from the source document.
    #[serde(default = "default_true")]
    pub preserve_version_from_source: bool,
    /// Emit a parameterized DTD.
    #[serde(default)]
    pub parameterize_dtd_output: bool,
    /// Prefix applied to generated grammar pattern names.
    #[serde(default)]
    pub pattern_prefix: String,
    /// Documentation / export template set.
    #[serde(default)]
    pub profile_name: Option<String>,
    /// Where support files and templates live.
    #[serde(default)]
    pub resources: ResourceLayout,
    /// How DTD generation failures are handled.
    #[serde(default)]
    pub dtd_failure_policy: DtdFailurePolicy,
    /// Run the two grammar conversions concurrently.
    #[serde(default)]
    pub concurrent_conversions: bool,
}

fn default_schema_name() -> String {
    "default".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

impl RunConfiguration {
    /// Creates a configuration with defaults for everything but the paths.
    #[must_use]
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            schema_name: default_schema_name(),
            locale: default_locale(),
            generate_validation_xsd: true,
            generate_validation_dtd: true,
            generate_validation_rng: true,
            use_compiled_form: true,
            produce_documentation_in_source_format: false,
            requested_documentation_formats: Vec::new(),
            strip_when_compiling: false,
            verbose_diagnostics: false,
            preserve_version_from_source: true,
            parameterize_dtd_output: false,
            pattern_prefix: String::new(),
            profile_name: None,
            resources: ResourceLayout::default(),
            dtd_failure_policy: DtdFailurePolicy::default(),
            concurrent_conversions: false,
        }
    }

    /// Parses a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, SchemaflowError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()).into())
    }

    /// Reads a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SchemaflowError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Sets the schema name.
    #[must_use]
    pub fn with_schema_name(mut self, name: impl Into<String>) -> Self {
        self.schema_name = name.into();
        self
    }

    /// Sets the locale.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Enables or disables the three validation outputs.
    #[must_use]
    pub fn with_validation(mut self, rng: bool, xsd: bool, dtd: bool) -> Self {
        self.generate_validation_rng = rng;
        self.generate_validation_xsd = xsd;
        self.generate_validation_dtd = dtd;
        self
    }

    /// Enables or disables the compiled form.
    #[must_use]
    pub fn with_compiled_form(mut self, enabled: bool) -> Self {
        self.use_compiled_form = enabled;
        self
    }

    /// Enables or disables the documentation-source dump.
    #[must_use]
    pub fn with_documentation_source(mut self, enabled: bool) -> Self {
        self.produce_documentation_in_source_format = enabled;
        self
    }

    /// Sets the requested export formats.
    #[must_use]
    pub fn with_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested_documentation_formats = formats.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the strip-when-compiling flag.
    #[must_use]
    pub fn with_strip(mut self, enabled: bool) -> Self {
        self.strip_when_compiling = enabled;
        self
    }

    /// Sets the verbose flag.
    #[must_use]
    pub fn with_verbose(mut self, enabled: bool) -> Self {
        self.verbose_diagnostics = enabled;
        self
    }

    /// Sets the version-preservation flag.
    #[must_use]
    pub fn with_preserve_version(mut self, enabled: bool) -> Self {
        self.preserve_version_from_source = enabled;
        self
    }

    /// Sets the DTD-parameterization flag.
    #[must_use]
    pub fn with_parameterized_dtd(mut self, enabled: bool) -> Self {
        self.parameterize_dtd_output = enabled;
        self
    }

    /// Sets the grammar pattern prefix.
    #[must_use]
    pub fn with_pattern_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.pattern_prefix = prefix.into();
        self
    }

    /// Sets the profile name.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile_name = Some(profile.into());
        self
    }

    /// Sets the resource layout.
    #[must_use]
    pub fn with_resources(mut self, resources: ResourceLayout) -> Self {
        self.resources = resources;
        self
    }

    /// Sets the DTD failure policy.
    #[must_use]
    pub fn with_dtd_failure_policy(mut self, policy: DtdFailurePolicy) -> Self {
        self.dtd_failure_policy = policy;
        self
    }

    /// Enables concurrent grammar conversions.
    #[must_use]
    pub fn with_concurrent_conversions(mut self, enabled: bool) -> Self {
        self.concurrent_conversions = enabled;
        self
    }

    /// Returns the documentation output directory (`output_dir/documentation`).
    #[must_use]
    pub fn documentation_dir(&self) -> PathBuf {
        self.output_dir.join("documentation")
    }

    /// Returns the requested formats with duplicates removed, first occurrence wins.
    #[must_use]
    pub fn documentation_formats(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::with_capacity(self.requested_documentation_formats.len());
        for format in &self.requested_documentation_formats {
            if !seen.contains(&format.as_str()) {
                seen.push(format);
            }
        }
        seen
    }

    /// Returns the non-binary formats, in request order.
    #[must_use]
    pub fn export_formats(&self) -> Vec<&str> {
        self.documentation_formats()
            .into_iter()
            .filter(|f| !is_binary_format(f))
            .collect()
    }

    /// Returns true if the binary document format was requested.
    #[must_use]
    pub fn wants_binary_export(&self) -> bool {
        self.requested_documentation_formats
            .iter()
            .any(|f| is_binary_format(f))
    }

    /// Returns true if any documentation output was requested.
    #[must_use]
    pub fn wants_documentation(&self) -> bool {
        self.produce_documentation_in_source_format
            || !self.requested_documentation_formats.is_empty()
    }

    /// Returns true if grammar generation is enabled.
    #[must_use]
    pub fn wants_grammar(&self) -> bool {
        self.use_compiled_form && (self.generate_validation_rng || self.generate_validation_xsd)
    }

    /// Returns true if the compiled document should be written to disk.
    #[must_use]
    pub fn dumps_compiled_form(&self) -> bool {
        self.strip_when_compiling || self.verbose_diagnostics
    }

    /// Returns true if the intermediate grammar file is removed after conversion.
    #[must_use]
    pub fn discards_grammar_file(&self) -> bool {
        !self.verbose_diagnostics && !self.generate_validation_xsd
    }

    /// Checks the shape of the configuration without touching the filesystem.
    ///
    /// Names that become part of output paths must be plain file-name tokens,
    /// no export may overwrite the documentation source, and the binary
    /// export needs a profile.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_token("schema_name", &self.schema_name)?;
        for format in &self.requested_documentation_formats {
            check_token("format", format)?;
        }
        if self.use_compiled_form && self.produce_documentation_in_source_format {
            if let Some(format) = self
                .export_formats()
                .into_iter()
                .find(|f| *f == SOURCE_DOCUMENT_FORMAT)
            {
                return Err(ConfigError::OutputCollision {
                    format: format.to_string(),
                    path: self
                        .documentation_dir()
                        .join(format!("{}.{SOURCE_DOCUMENT_FORMAT}", self.schema_name)),
                });
            }
        }
        match self.profile_name {
            Some(ref profile) => check_token("profile_name", profile)?,
            None if self.wants_binary_export() => {
                return Err(ConfigError::missing(
                    crate::core::StageKind::BinaryDocumentExport.as_str(),
                    "profile_name",
                ));
            }
            None => {}
        }
        Ok(())
    }

    /// Checks the filesystem preconditions of a run.
    ///
    /// The input document must exist and be a readable file; the output
    /// directory must exist and be a directory.
    pub fn check_preconditions(&self) -> Result<(), PreconditionError> {
        let input = std::fs::metadata(&self.input)
            .map_err(|_| PreconditionError::InputMissing(self.input.clone()))?;
        if !input.is_file() || std::fs::File::open(&self.input).is_err() {
            return Err(PreconditionError::InputUnreadable(self.input.clone()));
        }

        match std::fs::metadata(&self.output_dir) {
            Ok(meta) if meta.is_dir() => Ok(()),
            _ => Err(PreconditionError::OutputDirInvalid(self.output_dir.clone())),
        }
    }
}

/// Returns true if `format` names the binary document format.
#[must_use]
pub fn is_binary_format(format: &str) -> bool {
    format.eq_ignore_ascii_case(BINARY_DOCUMENT_FORMAT)
}

fn check_token(field: &str, value: &str) -> Result<(), ConfigError> {
    if FILE_TOKEN.is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::invalid_name(field, value))
    }
}
