//! Parameter records, one type per stage.

use crate::core::StageKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Parameters of the load stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadParams {
    /// The input document.
    pub input: PathBuf,
}

/// Parameters of the normalize stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeParams {
    /// Base name of the outputs.
    pub schema_name: String,
    /// Strip the compiled document down to what was selected.
    pub stripped: bool,
    /// Verbose engine output.
    pub verbose: bool,
    /// Language of generated text.
    pub locale: String,
    /// Carry the source document's version into the compiled document.
    pub use_version_from_source: bool,
}

/// Parameters of the grammar generation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarParams {
    /// Base name of the outputs.
    pub schema_name: String,
    /// Verbose engine output.
    pub verbose: bool,
    /// Language of generated text.
    pub locale: String,
    /// Prefix applied to generated pattern names.
    pub pattern_prefix: String,
    /// Shape patterns for a parameterized DTD.
    pub parameterized_dtd: bool,
}

/// Parameters of the DTD generation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DtdParams {
    /// Where the engine writes the DTD.
    pub output_file: PathBuf,
    /// Base name of the outputs.
    pub schema_name: String,
    /// Verbose engine output.
    pub verbose: bool,
    /// Language of generated text.
    pub locale: String,
    /// Emit parameter entities.
    pub parameterized_dtd: bool,
}

/// Parameters of the documentation assembly stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationParams {
    /// Documentation language.
    pub locale: String,
}

/// Parameters of one format export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportParams {
    /// The format identifier, as requested.
    pub format: String,
    /// The active template profile, if any.
    pub profile: Option<String>,
    /// Documentation language.
    pub locale: String,
    /// Where the export is written.
    pub output_file: PathBuf,
    /// Extra stylesheet parameters; only the reflowable format has any.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stylesheet_params: BTreeMap<String, String>,
}

impl ExportParams {
    /// Returns a stylesheet parameter.
    #[must_use]
    pub fn stylesheet_param(&self, name: &str) -> Option<&str> {
        self.stylesheet_params.get(name).map(String::as_str)
    }
}

/// Parameters of the binary document export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryExportParams {
    /// Where the document is written.
    pub output_file: PathBuf,
    /// The profile's document template.
    pub template_file: PathBuf,
    /// The profile's export stylesheet.
    pub stylesheet: PathBuf,
}

/// Which grammar serialization a conversion produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionTarget {
    /// Compact-notation grammar (`.rnc`).
    Compact,
    /// Structured schema (`.xsd`).
    Structured,
}

impl ConversionTarget {
    /// Returns the stage that runs this conversion.
    #[must_use]
    pub fn stage(&self) -> StageKind {
        match self {
            Self::Compact => StageKind::CompactConversion,
            Self::Structured => StageKind::StructuredConversion,
        }
    }
}

/// Parameters of a grammar conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionParams {
    /// Which serialization to produce.
    pub target: ConversionTarget,
    /// The persisted grammar file.
    pub input_file: PathBuf,
    /// Where the converted grammar is written.
    pub output_file: PathBuf,
    /// Output character encoding.
    pub encoding: String,
    /// Maximum output line length.
    pub line_length: u32,
    /// Spaces per indentation level.
    pub indent: u32,
    /// Reader options.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_params: Vec<String>,
    /// Writer options.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_params: Vec<String>,
}

/// The parameter record of any stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum StageParams {
    /// Load stage.
    Load(LoadParams),
    /// Normalize stage.
    Normalize(NormalizeParams),
    /// Grammar generation.
    Grammar(GrammarParams),
    /// DTD generation.
    Dtd(DtdParams),
    /// Documentation assembly.
    Documentation(DocumentationParams),
    /// One format export.
    Export(ExportParams),
    /// Binary document export.
    BinaryExport(BinaryExportParams),
    /// Either grammar conversion.
    Conversion(ConversionParams),
}

impl StageParams {
    /// Returns the stage these parameters belong to.
    #[must_use]
    pub fn stage(&self) -> StageKind {
        match self {
            Self::Load(_) => StageKind::Load,
            Self::Normalize(_) => StageKind::Normalize,
            Self::Grammar(_) => StageKind::GrammarGeneration,
            Self::Dtd(_) => StageKind::DtdGeneration,
            Self::Documentation(_) => StageKind::DocumentationAssembly,
            Self::Export(_) => StageKind::FormatExport,
            Self::BinaryExport(_) => StageKind::BinaryDocumentExport,
            Self::Conversion(params) => params.target.stage(),
        }
    }

    /// Returns the file the engine writes directly, if the stage has one.
    #[must_use]
    pub fn output_file(&self) -> Option<&PathBuf> {
        match self {
            Self::Dtd(params) => Some(&params.output_file),
            Self::Export(params) => Some(&params.output_file),
            Self::BinaryExport(params) => Some(&params.output_file),
            Self::Conversion(params) => Some(&params.output_file),
            Self::Load(_) | Self::Normalize(_) | Self::Grammar(_) | Self::Documentation(_) => None,
        }
    }
}
