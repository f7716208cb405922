//! Model loader for reading model definitions from disk
//!
//! A model file is JSON holding either one model definition or an array of
//! them. A model directory holds any number of `*.json` model files, loaded
//! in file name order.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::errors::{SchemaError, SchemaResult};
use super::registry::SchemaRegistry;
use super::types::ModelDef;
use crate::observability::{log_event_with_fields, Event};

#[derive(Deserialize)]
#[serde(untagged)]
enum ModelFile {
    One(ModelDef),
    Many(Vec<ModelDef>),
}

/// Reads model definitions from a file or directory.
pub struct SchemaLoader {
    path: PathBuf,
}

impl SchemaLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every model into a fresh registry.
    pub fn load(&self) -> SchemaResult<SchemaRegistry> {
        let mut registry = SchemaRegistry::new();
        self.load_into(&mut registry)?;
        Ok(registry)
    }

    /// Loads every model into `registry`, returning how many were registered.
    pub fn load_into(&self, registry: &mut SchemaRegistry) -> SchemaResult<usize> {
        let models = if self.path.is_dir() {
            self.read_dir()?
        } else {
            Self::read_file(&self.path)?
        };

        let count = models.len();
        for model in models {
            let name = model.name.clone();
            registry.register_model(model)?;
            log_event_with_fields(
                Event::SchemaLoaded,
                &[("model", &name), ("path", &self.path.display().to_string())],
            );
        }
        Ok(count)
    }

    fn read_dir(&self) -> SchemaResult<Vec<ModelDef>> {
        let entries = fs::read_dir(&self.path).map_err(|e| {
            SchemaError::malformed_model(
                self.path.display().to_string(),
                format!("Failed to read model directory: {}", e),
            )
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SchemaError::malformed_model(
                    self.path.display().to_string(),
                    format!("Failed to read directory entry: {}", e),
                )
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut models = Vec::new();
        for path in paths {
            models.extend(Self::read_file(&path)?);
        }
        Ok(models)
    }

    /// Reads the model definitions held by one file.
    pub fn read_file(path: &Path) -> SchemaResult<Vec<ModelDef>> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed_model(
                path.display().to_string(),
                format!("Failed to read file: {}", e),
            )
        })?;

        let file: ModelFile = serde_json::from_str(&content).map_err(|e| {
            SchemaError::malformed_model(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;

        let models = match file {
            ModelFile::One(model) => vec![model],
            ModelFile::Many(models) => models,
        };

        for model in &models {
            model.validate_structure()?;
        }
        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const USERS: &str = r#"{
        "name": "users",
        "fields": {
            "id": {"type": "string", "required": false, "primary_key": true},
            "name": {"type": "string", "required": true}
        },
        "relations": {
            "orders": {"target": "orders", "cardinality": "many", "local_key": "id", "foreign_key": "userId"}
        }
    }"#;

    const ORDERS: &str = r#"[{
        "name": "orders",
        "fields": {
            "id": {"type": "string", "required": false, "primary_key": true},
            "userId": {"type": "string", "required": true}
        }
    }]"#;

    #[test]
    fn test_load_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("users.json"), USERS).unwrap();
        fs::write(dir.path().join("orders.json"), ORDERS).unwrap();
        fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let registry = SchemaLoader::new(dir.path()).load().unwrap();
        assert_eq!(registry.names(), vec!["orders", "users"]);
        assert_eq!(registry.get_relations("users").len(), 1);
    }

    #[test]
    fn test_load_single_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        fs::write(&path, USERS).unwrap();

        let mut registry = SchemaRegistry::new();
        let count = SchemaLoader::new(&path).load_into(&mut registry).unwrap();
        assert_eq!(count, 1);
        assert_eq!(registry.primary_key("users"), Some("id"));
    }

    #[test]
    fn test_malformed_file_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

        let err = SchemaLoader::new(dir.path()).load().unwrap_err();
        assert_eq!(err.code().code(), "AEROKV_MALFORMED_MODEL");
    }

    #[test]
    fn test_missing_path_rejected() {
        let dir = TempDir::new().unwrap();
        let err = SchemaLoader::new(dir.path().join("absent.json"))
            .load()
            .unwrap_err();
        assert!(err.message().contains("Failed to read file"));
    }
}
