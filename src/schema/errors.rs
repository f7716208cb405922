//! Schema error types
//!
//! Error codes:
//! - AEROKV_SCHEMA_VALIDATION_FAILED
//! - AEROKV_UNKNOWN_MODEL
//! - AEROKV_MALFORMED_MODEL
//! - AEROKV_MULTIPLE_PRIMARY_KEYS

use std::fmt;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Record violates the model schema
    SchemaValidationFailed,
    /// Model name not registered
    UnknownModel,
    /// Model definition cannot be loaded or is structurally invalid
    MalformedModel,
    /// More than one field marked as primary key
    MultiplePrimaryKeys,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::SchemaValidationFailed => "AEROKV_SCHEMA_VALIDATION_FAILED",
            SchemaErrorCode::UnknownModel => "AEROKV_UNKNOWN_MODEL",
            SchemaErrorCode::MalformedModel => "AEROKV_MALFORMED_MODEL",
            SchemaErrorCode::MultiplePrimaryKeys => "AEROKV_MULTIPLE_PRIMARY_KEYS",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Validation failure details
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDetails {
    /// Field path (e.g., "address.city" or "tags[2]")
    pub field: String,
    /// Expected type or condition
    pub expected: String,
    /// Actual value or type found
    pub actual: String,
}

impl ValidationDetails {
    pub fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::new(field, "field to be present", "missing")
    }

    pub fn extra_field(field: impl Into<String>) -> Self {
        Self::new(field, "no undeclared fields", "extra field present")
    }

    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(field, expected, actual)
    }

    pub fn null_value(field: impl Into<String>) -> Self {
        Self::new(field, "non-null value", "null")
    }
}

impl fmt::Display for ValidationDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field '{}': expected {}, got {}",
            self.field, self.expected, self.actual
        )
    }
}

/// Schema error type with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    model: Option<String>,
    details: Option<ValidationDetails>,
}

impl SchemaError {
    /// Create a validation failed error
    pub fn validation_failed(model: impl Into<String>, details: ValidationDetails) -> Self {
        Self {
            code: SchemaErrorCode::SchemaValidationFailed,
            message: format!("Record validation failed: {}", details),
            model: Some(model.into()),
            details: Some(details),
        }
    }

    /// Create an unknown model error
    pub fn unknown_model(model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            code: SchemaErrorCode::UnknownModel,
            message: format!("Model '{}' not registered", model),
            model: Some(model),
            details: None,
        }
    }

    /// Create an error for a malformed model definition
    pub fn malformed_model(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::MalformedModel,
            message: format!("Malformed model '{}': {}", source.into(), reason.into()),
            model: None,
            details: None,
        }
    }

    /// Create an error for a model declaring several primary keys
    pub fn multiple_primary_keys(model: impl Into<String>, fields: &[&str]) -> Self {
        let model = model.into();
        Self {
            code: SchemaErrorCode::MultiplePrimaryKeys,
            message: format!(
                "Model '{}' marks more than one primary key: {}",
                model,
                fields.join(", ")
            ),
            model: Some(model),
            details: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the model name if applicable
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Returns validation details if applicable
    pub fn details(&self) -> Option<&ValidationDetails> {
        self.details.as_ref()
    }

    /// Returns whether this error came from validating a record
    pub fn is_validation(&self) -> bool {
        self.code == SchemaErrorCode::SchemaValidationFailed
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
