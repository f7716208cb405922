//! # Store Backend Traits
//!
//! The query layer drives any ordered key-value store through these two
//! seams: [`Connector`] opens a handle, [`KvStore`] serves point and prefix
//! operations on it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde_json::Value;

use super::errors::StoreResult;
use super::key::StoreKey;
use crate::client::ClientConfig;

/// One key/value pair produced by a prefix scan
#[derive(Debug, Clone, PartialEq)]
pub struct KvEntry {
    pub key: StoreKey,
    pub value: Value,
}

/// Ordered key-value store collaborator
#[async_trait]
pub trait KvStore: Send + Sync + fmt::Debug {
    /// Point read
    async fn get(&self, key: &StoreKey) -> StoreResult<Option<Value>>;

    /// Point write (last write wins)
    async fn set(&self, key: &StoreKey, value: Value) -> StoreResult<()>;

    /// Point delete; deleting an absent key succeeds
    async fn delete(&self, key: &StoreKey) -> StoreResult<()>;

    /// Lazily enumerates every entry whose key starts with `prefix`,
    /// ascending in key order.
    fn list<'a>(&'a self, prefix: &StoreKey) -> BoxStream<'a, StoreResult<KvEntry>>;

    /// Releases the handle; later calls fail with `StoreError::Closed`.
    async fn close(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Opens store handles for a client
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, config: &ClientConfig) -> StoreResult<Arc<dyn KvStore>>;
}
