//! Source definition loading from TOML files.
//!
//! This module handles loading source definitions from the `source-definitions/` directory.

use crate::{
    definition::SourceDefinition,
    error::{Result, SourceError},
};
use jobhound_core::SourceId;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Loader for source definitions from TOML files.
pub struct SourceLoader {
    /// Base directory containing source definitions
    definitions_dir: PathBuf,
}

impl SourceLoader {
    /// Create a new loader with the given definitions directory.
    ///
    /// # Errors
    /// Returns error if the directory doesn't exist.
    pub fn new(definitions_dir: impl Into<PathBuf>) -> Result<Self> {
        let definitions_dir = definitions_dir.into();

        if !definitions_dir.exists() || !definitions_dir.is_dir() {
            return Err(SourceError::DirectoryNotFound {
                path: definitions_dir.display().to_string(),
            });
        }

        Ok(Self { definitions_dir })
    }

    /// Create a loader using the default definitions directory.
    ///
    /// Looks for `source-definitions/` relative to the workspace root.
    ///
    /// # Errors
    /// Returns error if the default directory doesn't exist.
    pub fn with_default_dir() -> Result<Self> {
        // Find workspace root by looking for Cargo.toml with [workspace]
        let mut current_dir = std::env::current_dir()?;

        loop {
            let cargo_toml = current_dir.join("Cargo.toml");
            if cargo_toml.exists() {
                if let Ok(contents) = std::fs::read_to_string(&cargo_toml) {
                    if contents.contains("[workspace]") {
                        let definitions_dir = current_dir.join("source-definitions");
                        return Self::new(definitions_dir);
                    }
                }
            }

            if let Some(parent) = current_dir.parent() {
                current_dir = parent.to_path_buf();
            } else {
                break;
            }
        }

        // Fallback: try relative path
        let definitions_dir = PathBuf::from("source-definitions");
        Self::new(definitions_dir)
    }

    /// Load a single source definition by ID.
    ///
    /// The definition file is named `<id>.toml` and may sit anywhere
    /// under the definitions directory.
    ///
    /// # Errors
    /// Returns error if the definition file doesn't exist, can't be read, or is invalid.
    pub fn load(&self, source_id: &SourceId) -> Result<SourceDefinition> {
        let mut files = Vec::new();
        Self::toml_files(&self.definitions_dir, &mut files)?;

        let wanted = format!("{}.toml", source_id.as_str());
        let path = files
            .iter()
            .find(|p| p.file_name().and_then(|n| n.to_str()) == Some(wanted.as_str()))
            .ok_or_else(|| SourceError::NotFound {
                source_id: source_id.to_string(),
            })?;

        let definition = Self::load_from_path(path)?;
        definition.validate()?;

        debug!(
            source_id = %source_id,
            name = %definition.name(),
            "loaded source definition"
        );
        Ok(definition)
    }

    /// Load all source definitions from the definitions directory.
    ///
    /// Unparseable or invalid definitions are logged and skipped.
    ///
    /// # Errors
    /// Returns error if the directory can't be read.
    pub fn load_all(&self) -> Result<Vec<SourceDefinition>> {
        let mut files = Vec::new();
        Self::toml_files(&self.definitions_dir, &mut files)?;

        let mut definitions = Vec::new();
        for path in files {
            let definition = match Self::load_from_path(&path) {
                Ok(definition) => definition,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to load source definition"
                    );
                    continue;
                }
            };
            if let Err(e) = definition.validate() {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "skipping invalid source definition"
                );
                continue;
            }
            definitions.push(definition);
        }

        info!(
            count = definitions.len(),
            dir = %self.definitions_dir.display(),
            "loaded source definitions"
        );
        Ok(definitions)
    }

    /// Collect every `.toml` file under `dir`, descending into
    /// subdirectories.
    fn toml_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                Self::toml_files(&path, out)?;
            } else if path.extension().and_then(|s| s.to_str()) == Some("toml") {
                out.push(path);
            }
        }
        Ok(())
    }

    /// Load a source definition from a specific file path.
    fn load_from_path(path: &Path) -> Result<SourceDefinition> {
        let contents = std::fs::read_to_string(path).map_err(|e| SourceError::LoadError {
            path: path.display().to_string(),
            source: Box::new(e),
        })?;

        toml::from_str(&contents).map_err(|e| SourceError::ParseError {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::RenderChoice;
    use tempfile::TempDir;

    fn create_test_definition_file(dir: &Path, source_id: &str) -> PathBuf {
        std::fs::create_dir_all(dir).expect("create definitions dir");
        let file_path = dir.join(format!("{source_id}.toml"));

        let content = format!(
            r#"
[source]
id = "{source_id}"
name = "Test Source"
url = "https://test.com"
domain = "test.com"
render = "http"
last_verified = "2025-08-01"

[search]
method = "url-template"
template = "https://test.com/jobs?q={{term}}&l={{location}}"

[selectors.list]
item = "li.job"
link = "a.job-link"

[selectors.detail]
title = ["h1.title"]
company = [".company"]
location = [".location"]
description = [".description"]
posted_date = ["time"]
date_attr = "datetime"
"#
        );

        std::fs::write(&file_path, content).expect("write test file");
        file_path
    }

    #[test]
    fn test_loader_new_with_existing_dir() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let loader = SourceLoader::new(temp_dir.path());
        assert!(loader.is_ok());
    }

    #[test]
    fn test_loader_new_with_nonexistent_dir() {
        let loader = SourceLoader::new("/nonexistent/path/to/definitions");
        assert!(loader.is_err());
    }

    #[test]
    fn test_load_single_source() {
        let temp_dir = TempDir::new().expect("create temp dir");
        create_test_definition_file(temp_dir.path(), "test-source");

        let loader = SourceLoader::new(temp_dir.path()).expect("create loader");
        let source_id = SourceId::new("test-source").expect("valid source ID");
        let definition = loader.load(&source_id).expect("load source definition");

        assert_eq!(definition.id(), &source_id);
        assert_eq!(definition.name(), "Test Source");
        assert_eq!(definition.render(), RenderChoice::Http);
    }

    #[test]
    fn test_load_nonexistent_source() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let loader = SourceLoader::new(temp_dir.path()).expect("create loader");
        let source_id = SourceId::new("nonexistent").expect("valid source ID");

        let result = loader.load(&source_id);
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), SourceError::NotFound { .. }));
    }

    #[test]
    fn test_load_all_sources() {
        let temp_dir = TempDir::new().expect("create temp dir");

        create_test_definition_file(temp_dir.path(), "source-1");
        create_test_definition_file(temp_dir.path(), "source-2");
        create_test_definition_file(&temp_dir.path().join("boards"), "source-3");

        let loader = SourceLoader::new(temp_dir.path()).expect("create loader");
        let definitions = loader.load_all().expect("load all definitions");

        assert_eq!(definitions.len(), 3);

        // Verify all source IDs are unique
        let ids: std::collections::HashSet<_> =
            definitions.iter().map(SourceDefinition::id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_load_all_skips_invalid() {
        let temp_dir = TempDir::new().expect("create temp dir");

        create_test_definition_file(temp_dir.path(), "valid-source");

        // Create an invalid TOML file
        let invalid_path = temp_dir.path().join("invalid.toml");
        std::fs::write(&invalid_path, "invalid toml content [[[").expect("write invalid file");

        let loader = SourceLoader::new(temp_dir.path()).expect("create loader");
        let definitions = loader.load_all().expect("load all definitions");

        // Should only load the valid one
        assert_eq!(definitions.len(), 1);
    }
}
