//! The client: owns the store connection and the namespace cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use super::config::ClientConfig;
use super::errors::{ClientError, ClientResult, Operation, QueryError, QueryResult};
use super::lifecycle::{Begin, Lifecycle, LifecycleState, Settled};
use super::namespace::{Namespace, NamespaceState};
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::schema::SchemaRegistry;
use crate::store::{Connector, KvStore, MemoryConnector};

/// Entry point of the query layer.
///
/// Cloning is cheap; clones share the connection, the registry and the
/// namespace cache.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) config: ClientConfig,
    registry: SchemaRegistry,
    connector: Arc<dyn Connector>,
    pub(crate) lifecycle: Lifecycle,
    namespaces: Mutex<HashMap<String, Arc<NamespaceState>>>,
}

impl Client {
    pub fn new(registry: SchemaRegistry, connector: Arc<dyn Connector>) -> Self {
        Self::with_config(registry, connector, ClientConfig::default())
    }

    pub fn with_config(
        registry: SchemaRegistry,
        connector: Arc<dyn Connector>,
        config: ClientConfig,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                registry,
                connector,
                lifecycle: Lifecycle::new(),
                namespaces: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Client over a fresh in-memory store
    pub fn in_memory(registry: SchemaRegistry) -> Self {
        Self::new(registry, Arc::new(MemoryConnector::new()))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.inner.registry
    }

    pub fn state(&self) -> ClientResult<LifecycleState> {
        self.inner.lifecycle.state()
    }

    /// Connects to the store.
    ///
    /// Idempotent: concurrent calls await the same attempt and a call on a
    /// ready client returns immediately. A failed attempt leaves the client
    /// uninitialized so `init` can be retried.
    pub async fn init(&self) -> ClientResult<()> {
        let inner = Arc::clone(&self.inner);
        match self.inner.lifecycle.begin(move || connect(inner))? {
            Begin::Ready => Ok(()),
            Begin::Pending(pending) => pending.await.map(|_| ()),
        }
    }

    /// Closes the client. Later operations fail fast; there is no reopening.
    pub async fn close(&self) -> ClientResult<()> {
        if let Some(store) = self.inner.lifecycle.close()? {
            store
                .close()
                .await
                .map_err(|e| ClientError::Internal(format!("store close failed: {}", e)))?;
        }
        log_event(Event::ClientClosed);
        Ok(())
    }

    /// Façade for `name`, built on first access and cached.
    ///
    /// Fails with a configuration error when no model is registered under
    /// `name`.
    pub fn namespace(&self, name: &str) -> QueryResult<Namespace> {
        self.inner.namespace(name)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state().ok())
            .field("collections", &self.inner.registry.names())
            .finish()
    }
}

impl ClientInner {
    pub(crate) fn namespace(self: &Arc<Self>, name: &str) -> QueryResult<Namespace> {
        let mut cache = self.namespaces.lock().map_err(|_| {
            QueryError::lifecycle(
                name,
                Operation::Namespace,
                ClientError::Internal("namespace cache lock poisoned".into()),
            )
        })?;

        if let Some(state) = cache.get(name) {
            return Ok(Namespace::new(Arc::clone(self), Arc::clone(state)));
        }

        let model = self.registry.get(name).ok_or_else(|| {
            QueryError::configuration(
                name,
                Operation::Namespace,
                format!("collection '{}' is not registered", name),
            )
        })?;

        let state = Arc::new(NamespaceState::new(model.clone()));
        cache.insert(name.to_string(), Arc::clone(&state));
        log_event_with_fields(Event::NamespaceMaterialized, &[("collection", name)]);

        Ok(Namespace::new(Arc::clone(self), state))
    }
}

fn connect(inner: Arc<ClientInner>) -> BoxFuture<'static, ClientResult<Arc<dyn KvStore>>> {
    async move {
        log_event_with_fields(
            Event::ClientInitStart,
            &[("url", inner.config.url.as_deref().unwrap_or("<none>"))],
        );

        let outcome = inner.connector.connect(&inner.config).await;

        match inner.lifecycle.settle(outcome) {
            Settled::Ready(store) => {
                log_event(Event::ClientInitComplete);
                Ok(store)
            }
            Settled::Failed(e) => {
                log_event_with_fields(
                    Event::ClientInitFailed,
                    &[("code", e.code()), ("error", &e.to_string())],
                );
                Err(e)
            }
            Settled::Closed(store) => {
                if let Some(store) = store {
                    release_abandoned(&*store).await;
                }
                Err(ClientError::Closed)
            }
        }
    }
    .boxed()
}

/// Closes a store opened after the client was closed. The caller already
/// gets `Closed`, so a failure here is only reported.
async fn release_abandoned(store: &dyn KvStore) {
    if let Err(e) = store.close().await {
        log_event_with_fields(
            Event::StoreCloseFailed,
            &[("code", e.code()), ("error", &e.to_string())],
        );
    }
}
