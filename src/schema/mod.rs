//! Schema subsystem for aerokv
//!
//! Holds per-collection field schemas and relation declarations, and
//! validates records against them before any write.
//!
//! # Design Principles
//!
//! - Validation happens before the store is touched
//! - No coercion, no defaults, no nulls
//! - At most one primary key per model; `id` when none is marked
//! - Registry is read-only once queries start

mod errors;
mod loader;
mod registry;
mod types;
mod validator;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, ValidationDetails};
pub use loader::SchemaLoader;
pub use registry::{RegistryBuilder, SchemaRegistry};
pub use types::{
    Cardinality, FieldDef, FieldType, ModelDef, ModelSchema, OrderedMap, Record, RelationSpec,
    Relations, DEFAULT_PRIMARY_KEY,
};
pub use validator::SchemaValidator;
pub(crate) use validator::json_type_name;
