//! Derives stage parameter records from a run configuration.

use super::records::{
    BinaryExportParams, ConversionParams, ConversionTarget, DocumentationParams, DtdParams,
    ExportParams, GrammarParams, LoadParams, NormalizeParams, StageParams,
};
use crate::config::{OutputLayout, RunConfiguration, REFLOWABLE_FORMAT, SUPPORT_FILES};
use crate::core::StageKind;
use crate::errors::ConfigError;
use std::collections::BTreeMap;

const CONVERSION_ENCODING: &str = "UTF-8";
const CONVERSION_LINE_LENGTH: u32 = 72;
const CONVERSION_INDENT: u32 = 2;
const DISABLE_ABSTRACT_ELEMENTS: &str = "disable-abstract-elements";

/// Builds the parameter record of each stage.
///
/// Borrows the configuration; every method is a pure function of it.
#[derive(Debug, Clone)]
pub struct StageConfigBuilder<'a> {
    config: &'a RunConfiguration,
    layout: OutputLayout,
}

impl<'a> StageConfigBuilder<'a> {
    /// Creates a builder for a configuration.
    #[must_use]
    pub fn new(config: &'a RunConfiguration) -> Self {
        Self {
            config,
            layout: OutputLayout::new(config),
        }
    }

    /// Returns the output layout the records point into.
    #[must_use]
    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Parameters of the load stage.
    #[must_use]
    pub fn load(&self) -> LoadParams {
        LoadParams {
            input: self.config.input.clone(),
        }
    }

    /// Parameters of the normalize stage.
    #[must_use]
    pub fn normalize(&self) -> NormalizeParams {
        NormalizeParams {
            schema_name: self.config.schema_name.clone(),
            stripped: self.config.strip_when_compiling,
            verbose: self.config.verbose_diagnostics,
            locale: self.config.locale.clone(),
            use_version_from_source: self.config.preserve_version_from_source,
        }
    }

    /// Parameters of grammar generation.
    #[must_use]
    pub fn grammar(&self) -> GrammarParams {
        GrammarParams {
            schema_name: self.config.schema_name.clone(),
            verbose: self.config.verbose_diagnostics,
            locale: self.config.locale.clone(),
            pattern_prefix: self.config.pattern_prefix.clone(),
            parameterized_dtd: self.config.parameterize_dtd_output,
        }
    }

    /// Parameters of DTD generation.
    #[must_use]
    pub fn dtd(&self) -> DtdParams {
        DtdParams {
            output_file: self.layout.dtd(),
            schema_name: self.config.schema_name.clone(),
            verbose: self.config.verbose_diagnostics,
            locale: self.config.locale.clone(),
            parameterized_dtd: self.config.parameterize_dtd_output,
        }
    }

    /// Parameters of documentation assembly.
    #[must_use]
    pub fn documentation(&self) -> DocumentationParams {
        DocumentationParams {
            locale: self.config.locale.clone(),
        }
    }

    /// Builds the export parameters of one format.
    ///
    /// The reflowable format additionally receives locale and companion
    /// stylesheet references; every other format gets only format, profile
    /// and locale.
    #[must_use]
    pub fn export(&self, format: &str) -> ExportParams {
        let mut stylesheet_params = BTreeMap::new();
        if format == REFLOWABLE_FORMAT {
            let locale = &self.config.locale;
            let [css, secondary_css] = SUPPORT_FILES;
            for (name, value) in [
                ("STDOUT", "true"),
                ("splitLevel", "-1"),
                ("lang", locale.as_str()),
                ("doclang", locale.as_str()),
                ("documentationLanguage", locale.as_str()),
                ("cssFile", css),
                ("cssSecondaryFile", secondary_css),
            ] {
                stylesheet_params.insert(name.to_string(), value.to_string());
            }
        }

        ExportParams {
            format: format.to_string(),
            profile: self.config.profile_name.clone(),
            locale: self.config.locale.clone(),
            output_file: self.layout.export(format),
            stylesheet_params,
        }
    }

    /// Builds the binary export parameters.
    ///
    /// Fails if no profile is configured, since the template set is
    /// profile-scoped.
    pub fn binary_export(&self) -> Result<BinaryExportParams, ConfigError> {
        let profile = self.config.profile_name.as_deref().ok_or_else(|| {
            ConfigError::missing(StageKind::BinaryDocumentExport.as_str(), "profile_name")
        })?;
        let resources = &self.config.resources;

        Ok(BinaryExportParams {
            output_file: self.layout.binary_document(),
            template_file: resources.binary_template(profile),
            stylesheet: resources.binary_export_stylesheet(profile),
        })
    }

    /// Builds the parameters of one grammar conversion.
    #[must_use]
    pub fn conversion(&self, target: ConversionTarget) -> ConversionParams {
        let (output_file, output_params) = match target {
            ConversionTarget::Compact => (self.layout.compact_grammar(), Vec::new()),
            ConversionTarget::Structured => (
                self.layout.structured_schema(),
                vec![DISABLE_ABSTRACT_ELEMENTS.to_string()],
            ),
        };

        ConversionParams {
            target,
            input_file: self.layout.grammar(),
            output_file,
            encoding: CONVERSION_ENCODING.to_string(),
            line_length: CONVERSION_LINE_LENGTH,
            indent: CONVERSION_INDENT,
            input_params: Vec::new(),
            output_params,
        }
    }

    /// Builds the record of any stage.
    ///
    /// `format` is required for [`StageKind::FormatExport`] and ignored
    /// elsewhere.
    pub fn for_stage(
        &self,
        stage: StageKind,
        format: Option<&str>,
    ) -> Result<StageParams, ConfigError> {
        let params = match stage {
            StageKind::Load => StageParams::Load(self.load()),
            StageKind::Normalize => StageParams::Normalize(self.normalize()),
            StageKind::GrammarGeneration => StageParams::Grammar(self.grammar()),
            StageKind::DtdGeneration => StageParams::Dtd(self.dtd()),
            StageKind::CompactConversion => {
                StageParams::Conversion(self.conversion(ConversionTarget::Compact))
            }
            StageKind::StructuredConversion => {
                StageParams::Conversion(self.conversion(ConversionTarget::Structured))
            }
            StageKind::DocumentationAssembly => StageParams::Documentation(self.documentation()),
            StageKind::FormatExport => {
                let format =
                    format.ok_or_else(|| ConfigError::missing(stage.as_str(), "format"))?;
                StageParams::Export(self.export(format))
            }
            StageKind::BinaryDocumentExport => StageParams::BinaryExport(self.binary_export()?),
        };
        Ok(params)
    }
}
