//! # In-Memory Ordered Store
//!
//! Reference implementation of the store collaborator, backed by a
//! `BTreeMap` so prefix scans come out in key order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use tokio::sync::RwLock;

use super::backend::{Connector, KvEntry, KvStore};
use super::errors::{StoreError, StoreResult};
use super::key::StoreKey;
use crate::client::ClientConfig;

/// Operation counters, for inspecting access patterns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    pub gets: u64,
    pub sets: u64,
    pub deletes: u64,
    pub scans: u64,
}

#[derive(Debug, Default)]
struct Counters {
    gets: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    scans: AtomicU64,
}

/// Ordered in-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<StoreKey, Value>>,
    closed: AtomicBool,
    counters: Counters,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats {
            gets: self.counters.gets.load(Ordering::Relaxed),
            sets: self.counters.sets.load(Ordering::Relaxed),
            deletes: self.counters.deletes.load(Ordering::Relaxed),
            scans: self.counters.scans.load(Ordering::Relaxed),
        }
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    async fn snapshot(&self, prefix: &StoreKey) -> StoreResult<Vec<KvEntry>> {
        self.ensure_open()?;
        self.counters.scans.fetch_add(1, Ordering::Relaxed);

        let entries = self.entries.read().await;
        Ok(entries
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| KvEntry {
                key: key.clone(),
                value: value.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &StoreKey) -> StoreResult<Option<Value>> {
        self.ensure_open()?;
        self.counters.gets.fetch_add(1, Ordering::Relaxed);
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &StoreKey, value: Value) -> StoreResult<()> {
        self.ensure_open()?;
        self.counters.sets.fetch_add(1, Ordering::Relaxed);
        self.entries.write().await.insert(key.clone(), value);
        Ok(())
    }

    async fn delete(&self, key: &StoreKey) -> StoreResult<()> {
        self.ensure_open()?;
        self.counters.deletes.fetch_add(1, Ordering::Relaxed);
        self.entries.write().await.remove(key);
        Ok(())
    }

    // Entries are snapshotted on first poll, so writes made while a scan is
    // being consumed are not observed by that scan.
    fn list<'a>(&'a self, prefix: &StoreKey) -> BoxStream<'a, StoreResult<KvEntry>> {
        let prefix = prefix.clone();
        stream::once(async move { self.snapshot(&prefix).await })
            .flat_map(|batch| {
                let items: Vec<StoreResult<KvEntry>> = match batch {
                    Ok(entries) => entries.into_iter().map(Ok).collect(),
                    Err(e) => vec![Err(e)],
                };
                stream::iter(items)
            })
            .boxed()
    }

    async fn close(&self) -> StoreResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Connector handing out a shared [`MemoryStore`]
#[derive(Debug, Default)]
pub struct MemoryConnector {
    store: Arc<MemoryStore>,
    required_token: Option<String>,
    delay: Option<Duration>,
    connects: AtomicUsize,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves an existing store
    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            ..Self::default()
        }
    }

    /// Rejects connections whose access token differs
    pub fn require_token(mut self, token: impl Into<String>) -> Self {
        self.required_token = Some(token.into());
        self
    }

    /// Delays every connection attempt
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.store)
    }

    /// Number of connection attempts made so far
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, config: &ClientConfig) -> StoreResult<Arc<dyn KvStore>> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(required) = &self.required_token {
            if config.access_token.as_deref() != Some(required.as_str()) {
                return Err(StoreError::Unauthorized("access token rejected".into()));
            }
        }

        if self.store.is_closed() {
            return Err(StoreError::Closed);
        }

        let store: Arc<dyn KvStore> = self.store.clone();
        Ok(store)
    }
}
