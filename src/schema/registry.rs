//! In-memory model registry
//!
//! Registration happens during warm-up; afterwards the registry is shared
//! read-only by every namespace. Relation targets are not checked here, a
//! dangling target only surfaces when the relation is traversed.

use std::collections::HashMap;

use super::errors::{SchemaError, SchemaResult};
use super::types::{ModelDef, ModelSchema, Relations};

static EMPTY_RELATIONS: Relations = Relations::new();

/// Per-collection schemas and relation declarations.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    models: HashMap<String, ModelDef>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a bulk registration.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Registers (or replaces) the model for `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        schema: ModelSchema,
        relations: Relations,
    ) -> SchemaResult<()> {
        self.register_model(ModelDef::new(name, schema, relations))
    }

    /// Registers a complete model definition. Last write wins per name.
    pub fn register_model(&mut self, model: ModelDef) -> SchemaResult<()> {
        model.validate_structure()?;
        self.models.insert(model.name.clone(), model);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ModelDef> {
        self.models.get(name)
    }

    /// Looks up a model, failing with AEROKV_UNKNOWN_MODEL.
    pub fn require(&self, name: &str) -> SchemaResult<&ModelDef> {
        self.get(name).ok_or_else(|| SchemaError::unknown_model(name))
    }

    pub fn get_schema(&self, name: &str) -> Option<&ModelSchema> {
        self.get(name).map(|model| &model.fields)
    }

    /// Returns the relations of `name`, empty when unknown or undeclared.
    pub fn get_relations(&self, name: &str) -> &Relations {
        self.get(name)
            .map(|model| &model.relations)
            .unwrap_or(&EMPTY_RELATIONS)
    }

    pub fn primary_key(&self, name: &str) -> Option<&str> {
        self.get(name).map(ModelDef::primary_key)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Registered collection names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Chained registration of several models.
///
/// ```ignore
/// let registry = SchemaRegistry::builder()
///     .model("users", user_fields, user_relations)
///     .model("orders", order_fields, order_relations)
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: SchemaRegistry,
    error: Option<SchemaError>,
}

impl RegistryBuilder {
    pub fn model(
        mut self,
        name: impl Into<String>,
        schema: ModelSchema,
        relations: Relations,
    ) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.registry.register(name, schema, relations) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn model_def(mut self, model: ModelDef) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.registry.register_model(model) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Finishes registration, reporting the first structural error.
    pub fn build(self) -> SchemaResult<SchemaRegistry> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.registry),
        }
    }
}
