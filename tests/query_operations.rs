//! Query Operation Tests
//!
//! End-to-end behaviour of the namespace operations over the in-memory store:
//! - Round trips between create, findUnique and findMany
//! - Operator predicates
//! - Pagination with take, skip, cursor and orderBy
//! - Relation inclusion, projection and cascade delete

use aerokv::client::{Client, QueryError};
use aerokv::query::{
    CountArgs, CreateArgs, DeleteArgs, DeleteManyArgs, FindManyArgs, FindUniqueArgs, Include,
    Operator, OrderBy, Select, UpdateArgs, UpsertArgs, WhereClause,
};
use aerokv::schema::{FieldDef, FieldType, ModelSchema, Record, RelationSpec, Relations, SchemaRegistry};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn registry() -> SchemaRegistry {
    let users: ModelSchema = [
        ("id", FieldDef::required_string().primary()),
        ("name", FieldDef::required_string()),
        ("email", FieldDef::optional_string()),
        ("age", FieldDef::optional_int()),
        ("tags", FieldDef::optional_array(FieldType::String)),
    ]
    .into_iter()
    .collect();
    let user_relations: Relations = [("orders", RelationSpec::many("orders", "id", "userId"))]
        .into_iter()
        .collect();

    let orders: ModelSchema = [
        ("id", FieldDef::required_string().primary()),
        ("userId", FieldDef::required_string()),
        ("total", FieldDef::required_float()),
    ]
    .into_iter()
    .collect();
    let order_relations: Relations = [("user", RelationSpec::one("users", "userId", "id"))]
        .into_iter()
        .collect();

    let items: ModelSchema = [
        ("id", FieldDef::required_string().primary()),
        ("n", FieldDef::required_int()),
    ]
    .into_iter()
    .collect();

    SchemaRegistry::builder()
        .model("users", users, user_relations)
        .model("orders", orders, order_relations)
        .model("items", items, Relations::new())
        .build()
        .unwrap()
}

async fn ready_client() -> Client {
    let client = Client::in_memory(registry());
    client.init().await.unwrap();
    client
}

async fn seed_users(client: &Client) {
    let users = client.namespace("users").unwrap();
    for data in [
        json!({"id": "u1", "name": "Alice", "age": 31, "email": "alice@example.com"}),
        json!({"id": "u2", "name": "Bob", "age": 17}),
        json!({"id": "u3", "name": "Carol", "age": 65, "tags": ["admin"]}),
        json!({"id": "u4", "name": "Dave"}),
    ] {
        users.create(CreateArgs::new(data)).await.unwrap();
    }
}

/// Items "a".."e" with n = 1..5
async fn seed_items(client: &Client) {
    let items = client.namespace("items").unwrap();
    for (n, id) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
        items
            .create(CreateArgs::new(json!({"id": id, "n": n + 1})))
            .await
            .unwrap();
    }
}

fn ids(records: &[Record]) -> Vec<&str> {
    records
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect()
}

fn by_id(id: &str) -> WhereClause {
    WhereClause::new().eq("id", id)
}

// =============================================================================
// Round Trip Tests
// =============================================================================

/// A created record is returned unchanged by findUnique on its key.
#[tokio::test]
async fn test_create_then_find_unique() {
    let client = ready_client().await;
    let users = client.namespace("users").unwrap();

    let created = users
        .create(CreateArgs::new(
            json!({"id": "u1", "name": "Alice", "tags": ["a", "b"]}),
        ))
        .await
        .unwrap();
    let found = users
        .find_unique(FindUniqueArgs::new(by_id("u1")))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found, created);
    assert_eq!(found["tags"], json!(["a", "b"]));
}

/// findUnique on an absent key is None, not an error.
#[tokio::test]
async fn test_find_unique_absent() {
    let client = ready_client().await;
    let users = client.namespace("users").unwrap();

    let found = users
        .find_unique(FindUniqueArgs::new(by_id("nobody")))
        .await
        .unwrap();
    assert!(found.is_none());
}

/// Applying the same update twice leaves the same record.
#[tokio::test]
async fn test_update_is_idempotent() {
    let client = ready_client().await;
    seed_users(&client).await;
    let users = client.namespace("users").unwrap();

    let patch = json!({"email": "bob@example.com", "age": 18});
    let first = users
        .update(UpdateArgs::new(by_id("u2"), patch.clone()))
        .await
        .unwrap()
        .unwrap();
    let second = users
        .update(UpdateArgs::new(by_id("u2"), patch))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(second["name"], "Bob");
    assert_eq!(second["age"], 18);
}

/// An update that breaks the schema writes nothing.
#[tokio::test]
async fn test_invalid_update_keeps_stored_record() {
    let client = ready_client().await;
    seed_users(&client).await;
    let users = client.namespace("users").unwrap();

    let err = users
        .update(UpdateArgs::new(by_id("u1"), json!({"age": "old"})))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let stored = users
        .find_unique(FindUniqueArgs::new(by_id("u1")))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["age"], 31);
}

/// A deleted record disappears from findUnique and findMany.
#[tokio::test]
async fn test_delete_removes_record() {
    let client = ready_client().await;
    seed_users(&client).await;
    let users = client.namespace("users").unwrap();

    let deleted = users
        .delete(DeleteArgs::new(by_id("u2")))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(deleted["name"], "Bob");

    assert!(users
        .find_unique(FindUniqueArgs::new(by_id("u2")))
        .await
        .unwrap()
        .is_none());
    let all = users.find_many(FindManyArgs::new()).await.unwrap();
    assert_eq!(ids(&all.data), vec!["u1", "u3", "u4"]);

    // Deleting again is a no-op
    assert!(users
        .delete(DeleteArgs::new(by_id("u2")))
        .await
        .unwrap()
        .is_none());
}

/// upsert creates on the first call and merges on the second.
#[tokio::test]
async fn test_upsert() {
    let client = ready_client().await;
    let users = client.namespace("users").unwrap();

    let args = || {
        UpsertArgs::new(
            by_id("u9"),
            json!({"id": "u9", "name": "Zed", "age": 20}),
            json!({"age": 21}),
        )
    };

    let created = users.upsert(args()).await.unwrap();
    assert_eq!(created["age"], 20);

    let updated = users.upsert(args()).await.unwrap();
    assert_eq!(updated["age"], 21);
    assert_eq!(updated["name"], "Zed");
    assert_eq!(users.count(CountArgs::default()).await.unwrap(), 1);
}

// =============================================================================
// Predicate Tests
// =============================================================================

async fn matching_ids(client: &Client, filter: WhereClause) -> Vec<String> {
    let users = client.namespace("users").unwrap();
    let page = users
        .find_many(FindManyArgs::new().filter(filter))
        .await
        .unwrap();
    ids(&page.data).into_iter().map(String::from).collect()
}

/// Each operator selects the expected users.
#[tokio::test]
async fn test_operator_table() {
    let client = ready_client().await;
    seed_users(&client).await;

    let cases: Vec<(Value, Vec<&str>)> = vec![
        (json!({"age": {"gt": 18, "lte": 65}}), vec!["u1", "u3"]),
        (json!({"age": {"lt": 18}}), vec!["u2"]),
        (json!({"age": {"gte": 65}}), vec!["u3"]),
        (json!({"name": {"in": ["Bob", "Dave"]}}), vec!["u2", "u4"]),
        (json!({"name": {"notIn": ["Bob", "Dave"]}}), vec!["u1", "u3"]),
        (json!({"name": {"not": "Alice"}}), vec!["u2", "u3", "u4"]),
        (json!({"name": {"startsWith": "Ca"}}), vec!["u3"]),
        (json!({"name": {"endsWith": "e"}}), vec!["u1", "u4"]),
        (json!({"name": {"contains": "o"}}), vec!["u2", "u3"]),
        // contains is a substring test; arrays never match
        (json!({"tags": {"contains": "admin"}}), vec![]),
        (json!({"name": "Bob", "age": 17}), vec!["u2"]),
        // Missing fields fail comparisons and pass negations
        (json!({"age": {"not": 31}}), vec!["u2", "u3", "u4"]),
        (json!({"email": {"equals": "alice@example.com"}}), vec!["u1"]),
        // Unknown operators never match
        (json!({"age": {"between": [1, 99]}}), vec![]),
    ];

    for (filter, expected) in cases {
        let clause: WhereClause = serde_json::from_value(filter.clone()).unwrap();
        assert_eq!(
            matching_ids(&client, clause).await,
            expected,
            "filter {}",
            filter
        );
    }
}

/// An empty where matches everything, and count agrees with findMany.
#[tokio::test]
async fn test_count_matches_find_many() {
    let client = ready_client().await;
    seed_users(&client).await;
    let users = client.namespace("users").unwrap();

    for filter in [
        WhereClause::new(),
        WhereClause::new().op("age", Operator::Gte, 18),
        WhereClause::new().eq("name", "Nobody"),
    ] {
        let found = users
            .find_many(FindManyArgs::new().filter(filter.clone()))
            .await
            .unwrap();
        let counted = users.count(CountArgs::new(filter)).await.unwrap();
        assert_eq!(counted, found.data.len());
    }
}

/// Operator objects cannot address a single record.
#[tokio::test]
async fn test_point_operations_reject_operators() {
    let client = ready_client().await;
    seed_users(&client).await;
    let users = client.namespace("users").unwrap();
    let filter = WhereClause::new().op("id", Operator::In, json!(["u1"]));

    let err = users
        .delete(DeleteArgs::new(filter.clone()))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidQuery { .. }));

    let err = users
        .update(UpdateArgs::new(filter, json!({"age": 1})))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidQuery { .. }));

    let err = users
        .find_unique(FindUniqueArgs::new(WhereClause::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidQuery { .. }));
}

// =============================================================================
// Pagination Tests
// =============================================================================

/// take=2, skip=1 over a..e yields b and c.
#[tokio::test]
async fn test_take_and_skip() {
    let client = ready_client().await;
    seed_items(&client).await;
    let items = client.namespace("items").unwrap();

    let page = items
        .find_many(FindManyArgs::new().take(2).skip(1))
        .await
        .unwrap();
    assert_eq!(ids(&page.data), vec!["b", "c"]);
    assert!(page.has_more);

    let tail = items
        .find_many(FindManyArgs::new().take(10).skip(3))
        .await
        .unwrap();
    assert_eq!(ids(&tail.data), vec!["d", "e"]);
    assert!(!tail.has_more);
}

/// skip counts matching records only.
#[tokio::test]
async fn test_skip_counts_matches() {
    let client = ready_client().await;
    seed_items(&client).await;
    let items = client.namespace("items").unwrap();

    let page = items
        .find_many(
            FindManyArgs::new()
                .filter(WhereClause::new().op("n", Operator::Gte, 3))
                .skip(1),
        )
        .await
        .unwrap();
    assert_eq!(ids(&page.data), vec!["d", "e"]);
}

/// Following the returned cursor walks the collection once.
#[tokio::test]
async fn test_cursor_resumes_after_last_entry() {
    let client = ready_client().await;
    seed_items(&client).await;
    let items = client.namespace("items").unwrap();

    let mut seen = Vec::new();
    let mut args = FindManyArgs::new().take(2);
    loop {
        let page = items.find_many(args.clone()).await.unwrap();
        seen.extend(ids(&page.data).into_iter().map(String::from));
        if !page.has_more {
            break;
        }
        args = FindManyArgs::new().take(2).cursor(page.cursor.unwrap());
    }

    assert_eq!(seen, vec!["a", "b", "c", "d", "e"]);
}

/// orderBy sorts the page that pagination produced.
#[tokio::test]
async fn test_order_by_sorts_page() {
    let client = ready_client().await;
    seed_items(&client).await;
    let items = client.namespace("items").unwrap();

    let page = items
        .find_many(FindManyArgs::new().take(3).order_by(OrderBy::desc("n")))
        .await
        .unwrap();
    assert_eq!(ids(&page.data), vec!["c", "b", "a"]);

    let args: FindManyArgs =
        serde_json::from_value(json!({"orderBy": {"n": "desc"}, "where": {"n": {"lt": 3}}}))
            .unwrap();
    let page = items.find_many(args).await.unwrap();
    assert_eq!(ids(&page.data), vec!["b", "a"]);
    assert!(!page.has_more);
}

// =============================================================================
// Relation Tests
// =============================================================================

async fn seed_orders(client: &Client) {
    let orders = client.namespace("orders").unwrap();
    for (id, user, total) in [("o1", "u1", 10.0), ("o2", "u1", 20.5), ("o3", "u2", 5.0)] {
        orders
            .create(CreateArgs::new(
                json!({"id": id, "userId": user, "total": total}),
            ))
            .await
            .unwrap();
    }
}

/// A many relation equals findMany on the foreign key.
#[tokio::test]
async fn test_include_many_matches_find_many() {
    let client = ready_client().await;
    seed_users(&client).await;
    seed_orders(&client).await;
    let users = client.namespace("users").unwrap();
    let orders = client.namespace("orders").unwrap();

    let user = users
        .find_unique(FindUniqueArgs::new(by_id("u1")).include(Include::new().with("orders")))
        .await
        .unwrap()
        .unwrap();
    let direct = orders
        .find_many(FindManyArgs::new().filter(WhereClause::new().eq("userId", "u1")))
        .await
        .unwrap();

    let included: Vec<Value> = user["orders"].as_array().unwrap().clone();
    let expected: Vec<Value> = direct.data.into_iter().map(Value::Object).collect();
    assert_eq!(included, expected);

    let lonely = users
        .find_unique(FindUniqueArgs::new(by_id("u4")).include(Include::new().with("orders")))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(lonely["orders"], json!([]));
}

/// include applies to every record of a findMany page.
#[tokio::test]
async fn test_find_many_includes_per_record() {
    let client = ready_client().await;
    seed_users(&client).await;
    seed_orders(&client).await;
    let orders = client.namespace("orders").unwrap();

    let page = orders
        .find_many(
            FindManyArgs::new()
                .include(Include::new().with("user"))
                .select(Select::new().with("id").with("user")),
        )
        .await
        .unwrap();

    let owners: Vec<&Value> = page.data.iter().map(|o| &o["user"]["name"]).collect();
    assert_eq!(owners, vec!["Alice", "Alice", "Bob"]);
    assert!(page.data.iter().all(|o| o.len() == 2));
}

/// select keeps exactly the selected fields.
#[tokio::test]
async fn test_select_projection() {
    let client = ready_client().await;
    seed_users(&client).await;
    let users = client.namespace("users").unwrap();

    let select: Select = serde_json::from_value(json!({"name": true, "age": true, "email": false}))
        .unwrap();
    let user = users
        .find_unique(FindUniqueArgs::new(by_id("u1")).select(select))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(Value::Object(user), json!({"name": "Alice", "age": 31}));
}

/// Deleting a user deletes the orders pointing at it.
#[tokio::test]
async fn test_delete_cascades_to_related() {
    let client = ready_client().await;
    seed_users(&client).await;
    seed_orders(&client).await;
    let users = client.namespace("users").unwrap();
    let orders = client.namespace("orders").unwrap();

    users.delete(DeleteArgs::new(by_id("u1"))).await.unwrap();

    let left = orders.find_many(FindManyArgs::new()).await.unwrap();
    assert_eq!(ids(&left.data), vec!["o3"]);

    // Deleting an order never touches its user
    orders.delete(DeleteArgs::new(by_id("o3"))).await.unwrap();
    assert!(users
        .find_unique(FindUniqueArgs::new(by_id("u2")))
        .await
        .unwrap()
        .is_some());
}

/// deleteMany removes matches only and does not cascade.
#[tokio::test]
async fn test_delete_many() {
    let client = ready_client().await;
    seed_users(&client).await;
    seed_orders(&client).await;
    let users = client.namespace("users").unwrap();
    let orders = client.namespace("orders").unwrap();

    let removed = users
        .delete_many(DeleteManyArgs::new(
            WhereClause::new().op("age", Operator::Lt, 40),
        ))
        .await
        .unwrap();
    assert_eq!(removed.count, 2);
    assert_eq!(users.count(CountArgs::default()).await.unwrap(), 2);
    assert_eq!(orders.count(CountArgs::default()).await.unwrap(), 3);
}

/// Nested records are created in the related collection with the link set.
#[tokio::test]
async fn test_nested_create() {
    let client = ready_client().await;
    let users = client.namespace("users").unwrap();
    let orders = client.namespace("orders").unwrap();

    let created = users
        .create(CreateArgs::new(json!({
            "id": "u1",
            "name": "Alice",
            "orders": [{"id": "o1", "total": 12.5}, {"id": "o2", "total": 3.0}]
        })))
        .await
        .unwrap();
    assert_eq!(created["orders"].as_array().unwrap().len(), 2);

    let stored = orders
        .find_many(FindManyArgs::new().filter(WhereClause::new().eq("userId", "u1")))
        .await
        .unwrap();
    assert_eq!(ids(&stored.data), vec!["o1", "o2"]);

    // The relation payload is not stored on the parent
    let user = users
        .find_unique(FindUniqueArgs::new(by_id("u1")))
        .await
        .unwrap()
        .unwrap();
    assert!(!user.contains_key("orders"));
}
