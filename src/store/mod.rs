//! Store collaborator boundary for aerokv
//!
//! The query layer never owns persistence. It addresses an ordered
//! key-value store through four primitives:
//!
//! - `get(key)`
//! - `set(key, value)`
//! - `delete(key)`
//! - `list(prefix)`, ascending in key order
//!
//! [`MemoryStore`] is the in-process reference implementation.

mod backend;
mod errors;
mod key;
mod memory;

pub use backend::{Connector, KvEntry, KvStore};
pub use errors::{StoreError, StoreResult};
pub use key::{KeyPart, StoreKey};
pub use memory::{MemoryConnector, MemoryStats, MemoryStore};
