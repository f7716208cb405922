//! Client Lifecycle Tests
//!
//! Tests for the connection lifecycle seen through namespace operations:
//! - Concurrent init connects once
//! - Operations before init fail fast
//! - Operations issued during init wait for it
//! - Closed clients reject everything

use std::sync::Arc;
use std::time::Duration;

use aerokv::client::{Client, ClientConfig, ClientError, LifecycleState, Operation};
use aerokv::query::{CountArgs, CreateArgs, FindManyArgs};
use aerokv::schema::{FieldDef, ModelSchema, Relations, SchemaRegistry};
use aerokv::store::{MemoryConnector, MemoryStore};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn registry() -> SchemaRegistry {
    let notes: ModelSchema = [
        ("id", FieldDef::required_string().primary()),
        ("body", FieldDef::required_string()),
    ]
    .into_iter()
    .collect();

    SchemaRegistry::builder()
        .model("notes", notes, Relations::new())
        .build()
        .unwrap()
}

fn slow_connector() -> Arc<MemoryConnector> {
    Arc::new(MemoryConnector::new().with_delay(Duration::from_millis(25)))
}

// =============================================================================
// Initialization Tests
// =============================================================================

/// Many concurrent init calls share one connection attempt.
#[tokio::test]
async fn test_concurrent_init_connects_once() {
    let connector = slow_connector();
    let client = Client::new(registry(), connector.clone());

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.init().await })
        })
        .collect();
    for attempt in attempts {
        attempt.await.unwrap().unwrap();
    }

    assert_eq!(connector.connect_count(), 1);
    assert_eq!(client.state().unwrap(), LifecycleState::Ready);
}

/// Operations before init are configuration errors and touch nothing.
#[tokio::test]
async fn test_operation_before_init_fails_fast() {
    let connector = slow_connector();
    let client = Client::new(registry(), connector.clone());
    let notes = client.namespace("notes").unwrap();

    let err = notes.count(CountArgs::default()).await.unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.operation(), Operation::Count);
    assert_eq!(connector.connect_count(), 0);
}

/// An operation issued while init is pending waits and then succeeds.
#[tokio::test]
async fn test_operation_during_init_waits() {
    let connector = slow_connector();
    let client = Client::new(registry(), connector.clone());
    let notes = client.namespace("notes").unwrap();

    let (init, created) = tokio::join!(
        client.init(),
        notes.create(CreateArgs::new(json!({"id": "n1", "body": "hello"})))
    );
    init.unwrap();
    assert_eq!(created.unwrap()["body"], "hello");
    assert_eq!(connector.connect_count(), 1);
}

/// Namespaces obtained before init work once the client is ready.
#[tokio::test]
async fn test_namespace_survives_init() {
    let client = Client::in_memory(registry());
    let early = client.namespace("notes").unwrap();
    client.init().await.unwrap();

    early
        .create(CreateArgs::new(json!({"id": "n1", "body": "x"})))
        .await
        .unwrap();
    let late = client.namespace("notes").unwrap();
    assert!(early.same_as(&late));
    assert_eq!(late.count(CountArgs::default()).await.unwrap(), 1);
}

/// A rejected connection leaves the client retryable.
#[tokio::test]
async fn test_rejected_token_is_retryable() {
    let store = Arc::new(MemoryStore::new());
    let connector = Arc::new(MemoryConnector::with_store(store).require_token("s3cret"));

    let client = Client::with_config(
        registry(),
        connector.clone(),
        ClientConfig::default().with_access_token("wrong"),
    );
    assert!(matches!(
        client.init().await,
        Err(ClientError::Connect(_))
    ));
    assert_eq!(client.state().unwrap(), LifecycleState::Uninitialized);

    let client = Client::with_config(
        registry(),
        connector.clone(),
        ClientConfig::default().with_access_token("s3cret"),
    );
    client.init().await.unwrap();
    assert_eq!(connector.connect_count(), 2);
}

// =============================================================================
// Close Tests
// =============================================================================

/// After close every operation fails without reaching the store.
#[tokio::test]
async fn test_closed_client_rejects_operations() {
    let connector = Arc::new(MemoryConnector::new());
    let client = Client::new(registry(), connector.clone());
    client.init().await.unwrap();
    let notes = client.namespace("notes").unwrap();
    notes
        .create(CreateArgs::new(json!({"id": "n1", "body": "x"})))
        .await
        .unwrap();

    client.close().await.unwrap();
    assert_eq!(client.state().unwrap(), LifecycleState::Closed);
    assert!(connector.store().is_closed());

    let err = notes.find_many(FindManyArgs::new()).await.unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(client.init().await, Err(ClientError::Closed)));
}

/// Clients sharing a store see each other's writes.
#[tokio::test]
async fn test_clients_share_store() {
    let store = Arc::new(MemoryStore::new());
    let first = Client::new(registry(), Arc::new(MemoryConnector::with_store(store.clone())));
    let second = Client::new(registry(), Arc::new(MemoryConnector::with_store(store)));
    first.init().await.unwrap();
    second.init().await.unwrap();

    first
        .namespace("notes")
        .unwrap()
        .create(CreateArgs::new(json!({"id": "n1", "body": "shared"})))
        .await
        .unwrap();

    let seen = second
        .namespace("notes")
        .unwrap()
        .count(CountArgs::default())
        .await
        .unwrap();
    assert_eq!(seen, 1);
}
