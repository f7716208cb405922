//! Model type definitions
//!
//! Supported field types:
//! - string: UTF-8 string
//! - int: 64-bit signed integer
//! - float: 64-bit floating point (integers accepted)
//! - bool: Boolean
//! - timestamp: RFC 3339 string
//! - object: Nested object with field schema
//! - array: Homogeneous array with element type
//! - any: Any non-null JSON value

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::{SchemaError, SchemaResult};

/// A stored record: field name to value, in field order.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Field name used for the primary key when a model marks none.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Name-keyed collection that keeps declaration order.
///
/// Serializes as a JSON object; duplicate names keep the last value in the
/// position of the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts or replaces the value for `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: V) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of names to definitions")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OrderedMap::new();
        while let Some((k, v)) = access.next_entry::<String, V>()? {
            map.insert(k, v);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// Supported field types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// Boolean
    Bool,
    /// RFC 3339 date-time string
    Timestamp,
    /// Nested object with its own field schema
    Object {
        /// Nested field definitions
        fields: OrderedMap<FieldDef>,
    },
    /// Homogeneous array with single element type
    Array {
        /// Element type (boxed to allow recursive types)
        element_type: Box<FieldType>,
    },
    /// Any non-null value
    Any,
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Timestamp => "timestamp",
            FieldType::Object { .. } => "object",
            FieldType::Array { .. } => "array",
            FieldType::Any => "any",
        }
    }

    /// Whether values of this type can address a record in the store.
    pub fn is_key_type(&self) -> bool {
        matches!(self, FieldType::String | FieldType::Int | FieldType::Any)
    }
}

/// Field descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field data type
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Whether field must be present
    pub required: bool,
    /// Whether this field identifies the record
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub primary_key: bool,
}

impl FieldDef {
    pub fn new(field_type: FieldType, required: bool) -> Self {
        Self {
            field_type,
            required,
            primary_key: false,
        }
    }

    /// Marks this field as the model's primary key
    pub fn primary(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn required_string() -> Self {
        Self::new(FieldType::String, true)
    }

    pub fn optional_string() -> Self {
        Self::new(FieldType::String, false)
    }

    pub fn required_int() -> Self {
        Self::new(FieldType::Int, true)
    }

    pub fn optional_int() -> Self {
        Self::new(FieldType::Int, false)
    }

    pub fn required_bool() -> Self {
        Self::new(FieldType::Bool, true)
    }

    pub fn optional_bool() -> Self {
        Self::new(FieldType::Bool, false)
    }

    pub fn required_float() -> Self {
        Self::new(FieldType::Float, true)
    }

    pub fn optional_float() -> Self {
        Self::new(FieldType::Float, false)
    }

    pub fn optional_timestamp() -> Self {
        Self::new(FieldType::Timestamp, false)
    }

    pub fn required_object(fields: OrderedMap<FieldDef>) -> Self {
        Self::new(FieldType::Object { fields }, true)
    }

    pub fn optional_object(fields: OrderedMap<FieldDef>) -> Self {
        Self::new(FieldType::Object { fields }, false)
    }

    pub fn required_array(element_type: FieldType) -> Self {
        Self::new(
            FieldType::Array {
                element_type: Box::new(element_type),
            },
            true,
        )
    }

    pub fn optional_array(element_type: FieldType) -> Self {
        Self::new(
            FieldType::Array {
                element_type: Box::new(element_type),
            },
            false,
        )
    }
}

/// How many target records a relation resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

/// Declared link between two collections
///
/// Resolution looks up target records whose `foreign_key` equals the source
/// record's `local_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSpec {
    /// Target collection name
    pub target: String,
    pub cardinality: Cardinality,
    /// Field on the source record
    pub local_key: String,
    /// Field on the target record
    pub foreign_key: String,
}

impl RelationSpec {
    pub fn one(
        target: impl Into<String>,
        local_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            cardinality: Cardinality::One,
            local_key: local_key.into(),
            foreign_key: foreign_key.into(),
        }
    }

    pub fn many(
        target: impl Into<String>,
        local_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            target: target.into(),
            cardinality: Cardinality::Many,
            local_key: local_key.into(),
            foreign_key: foreign_key.into(),
        }
    }

    pub fn is_many(&self) -> bool {
        self.cardinality == Cardinality::Many
    }
}

/// Field schema of one model
pub type ModelSchema = OrderedMap<FieldDef>;

/// Relation declarations of one model
pub type Relations = OrderedMap<RelationSpec>;

/// Complete model definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDef {
    /// Collection identifier, also the store key-space prefix
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Field definitions in declaration order
    pub fields: ModelSchema,
    /// Relation declarations
    #[serde(default, skip_serializing_if = "OrderedMap::is_empty")]
    pub relations: Relations,
}

impl ModelDef {
    pub fn new(name: impl Into<String>, fields: ModelSchema, relations: Relations) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields,
            relations,
        }
    }

    /// Returns the primary key field name.
    ///
    /// Falls back to [`DEFAULT_PRIMARY_KEY`] when no field is marked.
    pub fn primary_key(&self) -> &str {
        self.fields
            .iter()
            .find(|(_, def)| def.primary_key)
            .map(|(name, _)| name)
            .unwrap_or(DEFAULT_PRIMARY_KEY)
    }

    /// Whether the primary key is a declared field rather than the implicit one
    pub fn declares_primary_key(&self) -> bool {
        self.fields.iter().any(|(_, def)| def.primary_key)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    pub fn relation(&self, name: &str) -> Option<&RelationSpec> {
        self.relations.get(name)
    }

    /// Validates the model structure itself (not a record)
    pub fn validate_structure(&self) -> SchemaResult<()> {
        if self.name.is_empty() {
            return Err(SchemaError::malformed_model(
                "<unnamed>",
                "model name must not be empty",
            ));
        }

        let marked: Vec<&str> = self
            .fields
            .iter()
            .filter(|(_, def)| def.primary_key)
            .map(|(name, _)| name)
            .collect();

        if marked.len() > 1 {
            return Err(SchemaError::multiple_primary_keys(&self.name, &marked));
        }

        if let Some(name) = marked.first() {
            if let Some(def) = self.fields.get(name) {
                if !def.field_type.is_key_type() {
                    return Err(SchemaError::malformed_model(
                        &self.name,
                        format!(
                            "primary key '{}' must be string, int or any, not {}",
                            name,
                            def.field_type.type_name()
                        ),
                    ));
                }
            }
        }

        for (relation, spec) in self.relations.iter() {
            if self.fields.contains_key(relation) {
                return Err(SchemaError::malformed_model(
                    &self.name,
                    format!("relation '{}' shadows a field of the same name", relation),
                ));
            }
            if spec.target.is_empty() {
                return Err(SchemaError::malformed_model(
                    &self.name,
                    format!("relation '{}' has no target collection", relation),
                ));
            }
        }

        Ok(())
    }
}
