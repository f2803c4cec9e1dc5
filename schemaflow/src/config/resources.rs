//! Locations of the fixed support files and profile templates.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Stylesheet assets copied next to every successful format export.
pub const SUPPORT_FILES: [&str; 2] = ["tei.css", "odd.css"];

/// Where the support files and the profile-scoped templates live.
///
/// Discovering these directories is the caller's concern; the pipeline only
/// joins names onto them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLayout {
    /// Directory holding the support stylesheets.
    #[serde(default = "default_css_dir")]
    pub css_dir: PathBuf,
    /// Root of the transformation stylesheets and profiles.
    #[serde(default = "default_stylesheet_dir")]
    pub stylesheet_dir: PathBuf,
}

fn default_css_dir() -> PathBuf {
    PathBuf::from("resources/css")
}

fn default_stylesheet_dir() -> PathBuf {
    PathBuf::from("resources/stylesheet")
}

impl Default for ResourceLayout {
    fn default() -> Self {
        Self {
            css_dir: default_css_dir(),
            stylesheet_dir: default_stylesheet_dir(),
        }
    }
}

impl ResourceLayout {
    /// Creates a layout from explicit directories.
    #[must_use]
    pub fn new(css_dir: impl Into<PathBuf>, stylesheet_dir: impl Into<PathBuf>) -> Self {
        Self {
            css_dir: css_dir.into(),
            stylesheet_dir: stylesheet_dir.into(),
        }
    }

    /// Creates a layout rooted at one resource directory.
    #[must_use]
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self::new(root.join("css"), root.join("stylesheet"))
    }

    /// Returns the source paths of the support files, by file name.
    #[must_use]
    pub fn support_files(&self) -> Vec<(&'static str, PathBuf)> {
        SUPPORT_FILES
            .iter()
            .map(|name| (*name, self.css_dir.join(name)))
            .collect()
    }

    /// Returns the binary-document template directory of a profile.
    #[must_use]
    pub fn profile_template_dir(&self, profile: &str) -> PathBuf {
        self.stylesheet_dir
            .join("profiles")
            .join(profile)
            .join(super::BINARY_DOCUMENT_FORMAT)
    }

    /// Returns the binary-document template file of a profile.
    #[must_use]
    pub fn binary_template(&self, profile: &str) -> PathBuf {
        self.profile_template_dir(profile).join("template.docx")
    }

    /// Returns the template-export stylesheet of a profile.
    #[must_use]
    pub fn binary_export_stylesheet(&self, profile: &str) -> PathBuf {
        self.profile_template_dir(profile).join("to.xsl")
    }
}
