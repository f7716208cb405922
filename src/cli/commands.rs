//! CLI command implementations
//!
//! `check` is synchronous: it only loads model definitions. `demo` drives a
//! client against the in-memory store on a dedicated tokio runtime.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{write_step, write_value};
use crate::client::{Client, ClientConfig};
use crate::observability::logging;
use crate::query::{
    CountArgs, CreateArgs, DeleteArgs, DeleteManyArgs, FindManyArgs, FindUniqueArgs, Include,
    Operator, OrderBy, Select, UpdateArgs, UpsertArgs, WhereClause,
};
use crate::schema::{
    FieldDef, ModelDef, ModelSchema, Record, RelationSpec, Relations, SchemaLoader,
    SchemaRegistry,
};
use crate::store::MemoryConnector;

/// Collections the walkthrough writes to
const DEMO_COLLECTIONS: [&str; 2] = ["users", "orders"];

/// Run the CLI
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    logging::init();
    run_command(cli.command)
}

/// Run a specific command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Check { models } => check(&models),
        Command::Demo { models } => demo(models.as_deref()),
    }
}

/// Load model definitions and print one JSON line per collection
pub fn check(models: &Path) -> CliResult<()> {
    let registry = SchemaLoader::new(models).load()?;

    for name in registry.names() {
        if let Some(model) = registry.get(name) {
            write_value(&describe_model(model)?)?;
        }
    }
    Ok(())
}

fn describe_model(model: &ModelDef) -> CliResult<Value> {
    let fields: Vec<&str> = model.fields.keys().collect();
    let mut relations = serde_json::Map::new();
    for (name, spec) in model.relations.iter() {
        relations.insert(name.to_string(), serde_json::to_value(spec)?);
    }

    Ok(json!({
        "collection": model.name,
        "primaryKey": model.primary_key(),
        "fields": fields,
        "relations": relations,
    }))
}

/// Run the users/orders walkthrough
pub fn demo(models: Option<&Path>) -> CliResult<()> {
    let registry = match models {
        Some(path) => {
            let registry = SchemaLoader::new(path).load()?;
            for collection in DEMO_COLLECTIONS {
                if !registry.contains(collection) {
                    return Err(CliError::model_error(format!(
                        "demo needs a '{}' collection in {}",
                        collection,
                        path.display()
                    )));
                }
            }
            registry
        }
        None => demo_registry()?,
    };

    let config = ClientConfig::from_env();
    let client = Client::with_config(registry, Arc::new(MemoryConnector::new()), config);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::io_error(format!("Failed to create tokio runtime: {}", e)))?;
    rt.block_on(walkthrough(client))
}

fn demo_registry() -> CliResult<SchemaRegistry> {
    let users: ModelSchema = [
        ("id", FieldDef::required_string().primary()),
        ("name", FieldDef::required_string()),
        ("email", FieldDef::optional_string()),
        ("age", FieldDef::optional_int()),
        ("createdAt", FieldDef::optional_timestamp()),
        ("updatedAt", FieldDef::optional_timestamp()),
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
        ("createdAt", FieldDef::optional_timestamp()),
    ]
    .into_iter()
    .collect();
    let order_relations: Relations = [("user", RelationSpec::one("users", "userId", "id"))]
        .into_iter()
        .collect();

    Ok(SchemaRegistry::builder()
        .model("users", users, user_relations)
        .model("orders", orders, order_relations)
        .build()?)
}

async fn walkthrough(client: Client) -> CliResult<()> {
    client.init().await?;
    let users = client.namespace("users")?;
    let orders = client.namespace("orders")?;

    let alice = users
        .create(CreateArgs::new(json!({
            "id": "u1",
            "name": "Alice",
            "email": "alice@example.com",
            "age": 31,
            "orders": [{"id": "o1", "total": 12.5}, {"id": "o2", "total": 40.0}]
        })))
        .await?;
    write_step("create", Value::Object(alice))?;

    users
        .create(CreateArgs::new(json!({"id": "u2", "name": "Bob", "age": 17})))
        .await?;
    orders
        .create(CreateArgs::new(json!({"id": "o3", "userId": "u2", "total": 7.25})))
        .await?;

    let found = users
        .find_unique(
            FindUniqueArgs::new(WhereClause::new().eq("id", "u1"))
                .include(Include::new().with("orders"))
                .select(Select::new().with("name").with("orders")),
        )
        .await?;
    write_step("findUnique", optional(found))?;

    let page = orders
        .find_many(
            FindManyArgs::new()
                .filter(WhereClause::new().op("total", Operator::Gte, 10))
                .order_by(OrderBy::desc("total"))
                .take(1),
        )
        .await?;
    write_step("findMany", serde_json::to_value(&page)?)?;

    let updated = users
        .update(UpdateArgs::new(
            WhereClause::new().eq("id", "u1"),
            json!({"email": "alice@aerokv.dev"}),
        ))
        .await?;
    write_step("update", optional(updated))?;

    let upserted = users
        .upsert(UpsertArgs::new(
            WhereClause::new().eq("id", "u3"),
            json!({"id": "u3", "name": "Carol", "age": 45}),
            json!({"age": 46}),
        ))
        .await?;
    write_step("upsert", Value::Object(upserted))?;

    let adults = users
        .count(CountArgs::new(
            WhereClause::new().op("age", Operator::Gte, 18),
        ))
        .await?;
    write_step("count", json!(adults))?;

    let deleted = users
        .delete(DeleteArgs::new(WhereClause::new().eq("id", "u1")))
        .await?;
    write_step("delete", optional(deleted))?;
    let remaining = orders.count(CountArgs::default()).await?;
    write_step("count", json!(remaining))?;

    let removed = users
        .delete_many(DeleteManyArgs::new(
            WhereClause::new().op("age", Operator::Lt, 18),
        ))
        .await?;
    write_step("deleteMany", serde_json::to_value(&removed)?)?;

    client.close().await?;
    Ok(())
}

fn optional(record: Option<Record>) -> Value {
    record.map(Value::Object).unwrap_or(Value::Null)
}
