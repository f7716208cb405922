//! Record validation against a model schema
//!
//! Validation semantics:
//! - Input must be an object
//! - All required fields are present
//! - No undeclared fields exist (the implicit primary key excepted)
//! - Field types exactly match schema types, no coercion
//! - Null values are rejected
//!
//! The validator never mutates the input; `parse` returns a validated copy.

use chrono::DateTime;
use serde_json::{Map, Value};

use super::errors::{SchemaError, SchemaResult, ValidationDetails};
use super::types::{FieldDef, FieldType, ModelDef, OrderedMap, Record};

/// Validates records for a single model.
pub struct SchemaValidator<'a> {
    model: &'a ModelDef,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(model: &'a ModelDef) -> Self {
        Self { model }
    }

    /// Validates `input` and returns it as a record.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` (AEROKV_SCHEMA_VALIDATION_FAILED) naming the
    /// first offending field path.
    pub fn parse(&self, input: &Value) -> SchemaResult<Record> {
        let obj = input.as_object().ok_or_else(|| {
            SchemaError::validation_failed(
                &self.model.name,
                ValidationDetails::type_mismatch("$root", "object", json_type_name(input)),
            )
        })?;

        self.validate_record(obj)?;
        Ok(obj.clone())
    }

    /// Validates an already-materialized record.
    pub fn validate_record(&self, record: &Record) -> SchemaResult<()> {
        if !self.model.declares_primary_key() {
            let pk = self.model.primary_key();
            if let Some(value) = record.get(pk) {
                if !(value.is_string() || value.is_i64()) {
                    return Err(self.type_error(pk, "string or int", value));
                }
            }
        }

        self.validate_object(record, &self.model.fields, "", true)
    }

    fn validate_object(
        &self,
        obj: &Map<String, Value>,
        fields: &OrderedMap<FieldDef>,
        path_prefix: &str,
        root: bool,
    ) -> SchemaResult<()> {
        let implicit_pk = if root && !self.model.declares_primary_key() {
            Some(self.model.primary_key())
        } else {
            None
        };

        for key in obj.keys() {
            if !fields.contains_key(key) && implicit_pk != Some(key.as_str()) {
                return Err(SchemaError::validation_failed(
                    &self.model.name,
                    ValidationDetails::extra_field(make_path(path_prefix, key)),
                ));
            }
        }

        for (field_name, field_def) in fields.iter() {
            let field_path = make_path(path_prefix, field_name);

            match obj.get(field_name) {
                Some(Value::Null) => {
                    return Err(SchemaError::validation_failed(
                        &self.model.name,
                        ValidationDetails::null_value(&field_path),
                    ));
                }
                Some(value) => self.validate_value(value, &field_def.field_type, &field_path)?,
                None if field_def.required => {
                    return Err(SchemaError::validation_failed(
                        &self.model.name,
                        ValidationDetails::missing_field(field_path),
                    ));
                }
                None => {}
            }
        }

        Ok(())
    }

    fn validate_value(
        &self,
        value: &Value,
        expected_type: &FieldType,
        field_path: &str,
    ) -> SchemaResult<()> {
        match expected_type {
            FieldType::String => {
                if !value.is_string() {
                    return Err(self.type_error(field_path, "string", value));
                }
            }
            FieldType::Int => {
                // 64-bit signed only; larger integers cannot address records
                if !value.is_i64() {
                    return Err(self.type_error(field_path, "int", value));
                }
            }
            FieldType::Float => {
                // Integers are acceptable floats
                if !value.is_number() {
                    return Err(self.type_error(field_path, "float", value));
                }
            }
            FieldType::Bool => {
                if !value.is_boolean() {
                    return Err(self.type_error(field_path, "bool", value));
                }
            }
            FieldType::Timestamp => {
                let parsed = value.as_str().map(DateTime::parse_from_rfc3339);
                match parsed {
                    Some(Ok(_)) => {}
                    Some(Err(_)) => {
                        return Err(SchemaError::validation_failed(
                            &self.model.name,
                            ValidationDetails::type_mismatch(
                                field_path,
                                "timestamp",
                                "malformed date-time string",
                            ),
                        ));
                    }
                    None => return Err(self.type_error(field_path, "timestamp", value)),
                }
            }
            FieldType::Object { fields } => {
                let obj = value
                    .as_object()
                    .ok_or_else(|| self.type_error(field_path, "object", value))?;
                self.validate_object(obj, fields, field_path, false)?;
            }
            FieldType::Array { element_type } => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| self.type_error(field_path, "array", value))?;

                for (i, elem) in arr.iter().enumerate() {
                    let elem_path = format!("{}[{}]", field_path, i);
                    if elem.is_null() {
                        return Err(SchemaError::validation_failed(
                            &self.model.name,
                            ValidationDetails::null_value(&elem_path),
                        ));
                    }
                    self.validate_value(elem, element_type, &elem_path)?;
                }
            }
            FieldType::Any => {}
        }

        Ok(())
    }

    fn type_error(&self, field_path: &str, expected: &str, actual: &Value) -> SchemaError {
        SchemaError::validation_failed(
            &self.model.name,
            ValidationDetails::type_mismatch(field_path, expected, json_type_name(actual)),
        )
    }
}

/// Returns the JSON type name for error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) => {
            if n.is_i64() {
                "int"
            } else if n.is_u64() {
                "uint64"
            } else {
                "float"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}
