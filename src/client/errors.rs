//! # Client Errors
//!
//! Lifecycle errors of the client and the public error of every namespace
//! operation.

use std::fmt;

use thiserror::Error;

use crate::schema::SchemaError;
use crate::store::StoreError;

/// Result type for namespace operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Result type for client lifecycle operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Façade operation an error happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    FindUnique,
    FindMany,
    Update,
    Delete,
    DeleteMany,
    Upsert,
    Count,
    /// Materializing a namespace
    Namespace,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::FindUnique => "findUnique",
            Operation::FindMany => "findMany",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::DeleteMany => "deleteMany",
            Operation::Upsert => "upsert",
            Operation::Count => "count",
            Operation::Namespace => "namespace",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client lifecycle errors
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// No initialization was started
    #[error("Client is not initialized; call init() first")]
    NotInitialized,

    /// Terminal state; the client never reconnects
    #[error("Client is closed")]
    Closed,

    #[error("Store connection failed: {0}")]
    Connect(#[source] StoreError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::NotInitialized => "AEROKV_CLIENT_NOT_INITIALIZED",
            ClientError::Closed => "AEROKV_CLIENT_CLOSED",
            ClientError::Connect(_) => "AEROKV_CLIENT_CONNECT_FAILED",
            ClientError::InvalidConfig(_) => "AEROKV_CLIENT_INVALID_CONFIG",
            ClientError::Internal(_) => "AEROKV_CLIENT_INTERNAL",
        }
    }
}

/// Error returned by namespace operations.
///
/// Every variant names the collection and the operation involved.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Schema rejected the input; nothing was written for the primary record
    #[error("{operation} on '{collection}' failed validation: {source}")]
    Validation {
        collection: String,
        operation: Operation,
        #[source]
        source: SchemaError,
    },

    /// Client not ready, or an unknown collection or relation
    #[error("{operation} on '{collection}': {message}")]
    Configuration {
        collection: String,
        operation: Operation,
        message: String,
    },

    /// Store failure, propagated unchanged
    #[error("{operation} on '{collection}': store error: {source}")]
    Store {
        collection: String,
        operation: Operation,
        #[source]
        source: StoreError,
    },

    /// Malformed query descriptor
    #[error("{operation} on '{collection}': invalid query: {message}")]
    InvalidQuery {
        collection: String,
        operation: Operation,
        message: String,
    },
}

impl QueryError {
    pub fn validation(collection: &str, operation: Operation, source: SchemaError) -> Self {
        QueryError::Validation {
            collection: collection.to_string(),
            operation,
            source,
        }
    }

    pub fn configuration(
        collection: &str,
        operation: Operation,
        message: impl Into<String>,
    ) -> Self {
        QueryError::Configuration {
            collection: collection.to_string(),
            operation,
            message: message.into(),
        }
    }

    pub fn invalid_query(collection: &str, operation: Operation, message: impl Into<String>) -> Self {
        QueryError::InvalidQuery {
            collection: collection.to_string(),
            operation,
            message: message.into(),
        }
    }

    /// Wraps a store error. Key encoding failures are query errors, not
    /// store failures.
    pub fn store(collection: &str, operation: Operation, source: StoreError) -> Self {
        match source {
            StoreError::InvalidKey(message) => {
                Self::invalid_query(collection, operation, format!("invalid key: {}", message))
            }
            source => QueryError::Store {
                collection: collection.to_string(),
                operation,
                source,
            },
        }
    }

    /// Maps a lifecycle failure seen while acquiring the store
    pub fn lifecycle(collection: &str, operation: Operation, error: ClientError) -> Self {
        match error {
            ClientError::Connect(source) => QueryError::Store {
                collection: collection.to_string(),
                operation,
                source,
            },
            other => Self::configuration(collection, operation, other.to_string()),
        }
    }

    pub fn collection(&self) -> &str {
        match self {
            QueryError::Validation { collection, .. }
            | QueryError::Configuration { collection, .. }
            | QueryError::Store { collection, .. }
            | QueryError::InvalidQuery { collection, .. } => collection,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            QueryError::Validation { operation, .. }
            | QueryError::Configuration { operation, .. }
            | QueryError::Store { operation, .. }
            | QueryError::InvalidQuery { operation, .. } => *operation,
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Validation { .. } => "AEROKV_VALIDATION_ERROR",
            QueryError::Configuration { .. } => "AEROKV_CONFIGURATION_ERROR",
            QueryError::Store { .. } => "AEROKV_STORE_ERROR",
            QueryError::InvalidQuery { .. } => "AEROKV_INVALID_QUERY",
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, QueryError::Validation { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, QueryError::Configuration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValidationDetails;

    #[test]
    fn test_messages_name_collection_and_operation() {
        let err = QueryError::validation(
            "users",
            Operation::Create,
            SchemaError::validation_failed("users", ValidationDetails::missing_field("email")),
        );
        let text = err.to_string();
        assert!(text.contains("create"));
        assert!(text.contains("'users'"));
        assert_eq!(err.code(), "AEROKV_VALIDATION_ERROR");
        assert_eq!(err.collection(), "users");
    }

    #[test]
    fn test_invalid_key_becomes_invalid_query() {
        let err = QueryError::store(
            "users",
            Operation::FindUnique,
            StoreError::InvalidKey("null".into()),
        );
        assert!(matches!(err, QueryError::InvalidQuery { .. }));

        let err = QueryError::store("users", Operation::FindUnique, StoreError::Closed);
        assert!(matches!(err, QueryError::Store { .. }));
    }

    #[test]
    fn test_lifecycle_mapping() {
        let err = QueryError::lifecycle("users", Operation::Count, ClientError::NotInitialized);
        assert!(err.is_configuration());
        assert_eq!(err.operation(), Operation::Count);

        let err = QueryError::lifecycle(
            "users",
            Operation::Count,
            ClientError::Connect(StoreError::ConnectionFailed("refused".into())),
        );
        assert!(matches!(err, QueryError::Store { .. }));
    }
}
