//! Filesystem fixtures for pipeline testing.

use std::io;
use std::path::{Path, PathBuf};

use crate::config::{ResourceLayout, RunConfiguration, SUPPORT_FILES};

/// A minimal schema-definition document.
pub const SAMPLE_SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader><fileDesc><titleStmt><title>Sample</title></titleStmt></fileDesc></teiHeader>
  <text><body>
    <schemaSpec ident="x" start="TEI">
      <moduleRef key="core"/>
      <moduleRef key="tei"/>
    </schemaSpec>
  </body></text>
</TEI>
"#;

/// A directory tree holding an input document, an output directory and the
/// support resources.
///
/// The caller owns the root (typically a temporary directory).
#[derive(Debug, Clone)]
pub struct SchemaWorkspace {
    root: PathBuf,
    input: PathBuf,
    output_dir: PathBuf,
    resources: ResourceLayout,
}

impl SchemaWorkspace {
    /// Lays out a workspace under `root`.
    pub fn create(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        let input = root.join("valid.odd");
        let output_dir = root.join("out");
        let resources = ResourceLayout::rooted_at(root.join("resources"));

        std::fs::write(&input, SAMPLE_SCHEMA)?;
        std::fs::create_dir_all(&output_dir)?;
        std::fs::create_dir_all(&resources.css_dir)?;
        for name in SUPPORT_FILES {
            std::fs::write(resources.css_dir.join(name), format!("/* {name} */\n"))?;
        }

        Ok(Self {
            root,
            input,
            output_dir,
            resources,
        })
    }

    /// Returns a configuration for this workspace with every default kept.
    #[must_use]
    pub fn config(&self, schema_name: &str) -> RunConfiguration {
        RunConfiguration::new(&self.input, &self.output_dir)
            .with_schema_name(schema_name)
            .with_resources(self.resources.clone())
    }

    /// Returns the workspace root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the input document path.
    #[must_use]
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Returns the output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns the resource layout.
    #[must_use]
    pub fn resources(&self) -> &ResourceLayout {
        &self.resources
    }

    /// Returns `{output_dir}/{name}`.
    #[must_use]
    pub fn output(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    /// Returns `{output_dir}/documentation/{name}`.
    #[must_use]
    pub fn documentation(&self, name: &str) -> PathBuf {
        self.output_dir.join("documentation").join(name)
    }

    /// Lists every file under the output directory, relative and sorted.
    pub fn output_files(&self) -> io::Result<Vec<String>> {
        let mut files = Vec::new();
        collect_files(&self.output_dir, &self.output_dir, &mut files)?;
        files.sort();
        Ok(files)
    }
}

fn collect_files(base: &Path, dir: &Path, files: &mut Vec<String>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(base, &path, files)?;
        } else if let Ok(relative) = path.strip_prefix(base) {
            files.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}
