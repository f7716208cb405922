//! Observable events for aerokv
//!
//! Events are explicit and typed. Each one carries a stable code and the
//! level it is emitted at.

use std::fmt;

use tracing::Level;

/// Observable events in aerokv
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Client lifecycle
    /// Store connection attempt begins
    ClientInitStart,
    /// Store connected, client ready
    ClientInitComplete,
    /// Store connection failed
    ClientInitFailed,
    /// Client closed (terminal)
    ClientClosed,
    /// A store handle could not be released
    StoreCloseFailed,

    // Namespaces and schemas
    /// A collection façade was built for the first time
    NamespaceMaterialized,
    /// Model definitions loaded
    SchemaLoaded,

    // Writes
    /// Record persisted by create
    RecordCreated,
    /// Record persisted by update
    RecordUpdated,
    /// Record removed by delete or deleteMany
    RecordDeleted,
    /// Related records removed by a delete cascade
    CascadeDelete,
    /// Nested relation payload written on a target collection
    NestedWrite,

    // Relation traversal
    /// Relation target collection is not registered
    RelationDangling,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ClientInitStart => "CLIENT_INIT_START",
            Event::ClientInitComplete => "CLIENT_INIT_COMPLETE",
            Event::ClientInitFailed => "CLIENT_INIT_FAILED",
            Event::ClientClosed => "CLIENT_CLOSED",
            Event::StoreCloseFailed => "STORE_CLOSE_FAILED",
            Event::NamespaceMaterialized => "NAMESPACE_MATERIALIZED",
            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::RecordCreated => "RECORD_CREATED",
            Event::RecordUpdated => "RECORD_UPDATED",
            Event::RecordDeleted => "RECORD_DELETED",
            Event::CascadeDelete => "CASCADE_DELETE",
            Event::NestedWrite => "NESTED_WRITE",
            Event::RelationDangling => "RELATION_DANGLING",
        }
    }

    /// Level the event is emitted at
    pub fn level(&self) -> Level {
        match self {
            Event::ClientInitFailed => Level::ERROR,
            Event::RelationDangling | Event::StoreCloseFailed => Level::WARN,
            Event::ClientInitStart
            | Event::ClientInitComplete
            | Event::ClientClosed
            | Event::SchemaLoaded => Level::INFO,
            Event::NamespaceMaterialized
            | Event::RecordCreated
            | Event::RecordUpdated
            | Event::RecordDeleted
            | Event::CascadeDelete
            | Event::NestedWrite => Level::DEBUG,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
