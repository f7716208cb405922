//! Collection façade
//!
//! One [`Namespace`] per collection, built on first access and cached by the
//! client. Every operation:
//!
//! 1. acquires the store handle, awaiting an in-flight `init`
//! 2. addresses records through the key codec
//! 3. filters scans with the predicate engine
//! 4. shapes results with `include` then `select`
//!
//! Cascades (nested writes, cascade deletes) are not transactional. A
//! failure partway through leaves earlier steps persisted.

use std::fmt;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use futures_util::future::{try_join_all, BoxFuture};
use futures_util::{FutureExt, TryStreamExt};
use serde_json::Value;
use uuid::Uuid;

use super::client::ClientInner;
use super::errors::{Operation, QueryError, QueryResult};
use crate::observability::{event_enabled, log_event_with_fields, Event};
use crate::query::{
    CountArgs, CreateArgs, DeleteArgs, DeleteManyArgs, DeleteManyResult, FindManyArgs,
    FindManyResult, FindUniqueArgs, KeyCodec, PredicateFilter, ResultSorter, UpdateArgs,
    UpsertArgs, WhereClause,
};
use crate::schema::{
    json_type_name, FieldDef, FieldType, ModelDef, Record, RelationSpec, SchemaError,
    SchemaValidator, ValidationDetails,
};
use crate::store::{KvStore, StoreError, StoreKey};

/// Cached per-collection state
pub(crate) struct NamespaceState {
    model: ModelDef,
}

impl NamespaceState {
    pub(crate) fn new(model: ModelDef) -> Self {
        Self { model }
    }
}

/// CRUD façade over one collection
#[derive(Clone)]
pub struct Namespace {
    pub(super) client: Arc<ClientInner>,
    state: Arc<NamespaceState>,
}

/// Relation payload split out of `data`
struct NestedPayload {
    relation: String,
    spec: RelationSpec,
    items: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NestedMode {
    Create,
    Upsert,
}

impl Namespace {
    pub(crate) fn new(client: Arc<ClientInner>, state: Arc<NamespaceState>) -> Self {
        Self { client, state }
    }

    /// Collection name
    pub fn name(&self) -> &str {
        &self.state.model.name
    }

    pub fn model(&self) -> &ModelDef {
        &self.state.model
    }

    pub fn primary_key(&self) -> &str {
        self.state.model.primary_key()
    }

    /// Whether both handles are the same cached façade
    pub fn same_as(&self, other: &Namespace) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Validates `data`, assigns a primary key and creation timestamp when
    /// missing, and persists the record.
    ///
    /// Array payloads under `many` relations are created on the target
    /// collection with the foreign key injected, and attached to the
    /// returned record.
    pub fn create(&self, args: CreateArgs) -> BoxFuture<'_, QueryResult<Record>> {
        async move {
            let op = Operation::Create;
            let store = self.store(op).await?;

            let (mut record, nested) = self.split_payload(args.data, op)?;
            self.fill_generated(&mut record);
            self.validate(&record, op)?;

            let key = KeyCodec::record_key(self.name(), self.primary_key(), &record)
                .map_err(|e| self.store_error(op, e))?;
            store
                .set(&key, Value::Object(record.clone()))
                .await
                .map_err(|e| self.store_error(op, e))?;
            if event_enabled(Event::RecordCreated) {
                log_event_with_fields(
                    Event::RecordCreated,
                    &[("collection", self.name()), ("key", &key.to_string())],
                );
            }

            let mut result = record;
            let attached = self
                .write_nested(&result, nested, NestedMode::Create, op)
                .await?;
            for (relation, written) in attached {
                result.insert(relation, written);
            }

            self.shape(result, &args.select, &args.include, op).await
        }
        .boxed()
    }

    /// Point lookup by the key the `where` clause addresses
    pub fn find_unique(&self, args: FindUniqueArgs) -> BoxFuture<'_, QueryResult<Option<Record>>> {
        async move {
            let op = Operation::FindUnique;
            let store = self.store(op).await?;
            let key = self.key_for(&args.filter, op)?;

            let record = match store.get(&key).await.map_err(|e| self.store_error(op, e))? {
                Some(value) => self.to_record(value, op)?,
                None => return Ok(None),
            };

            self.shape(record, &args.select, &args.include, op)
                .await
                .map(Some)
        }
        .boxed()
    }

    /// Scans the collection in key order and returns one page.
    ///
    /// `skip` counts matching records. `orderBy` sorts the page after
    /// pagination. `hasMore` is true when the page holds exactly `take`
    /// records. Without a `take`, the client's `default_take` (if any)
    /// bounds the page.
    pub fn find_many(&self, args: FindManyArgs) -> BoxFuture<'_, QueryResult<FindManyResult>> {
        let take = args.take.or(self.client.config.default_take);
        self.find_page(args, take)
    }

    /// `find_many` with an explicit page size, ignoring `default_take`
    pub(super) fn find_page(
        &self,
        args: FindManyArgs,
        take: Option<usize>,
    ) -> BoxFuture<'_, QueryResult<FindManyResult>> {
        async move {
            let op = Operation::FindMany;
            let store = self.store(op).await?;

            let (mut page, cursor) = self.scan_page(&*store, &args, take, op).await?;
            if let Some(order) = &args.order_by {
                ResultSorter::sort(&mut page, order);
            }

            let data = try_join_all(
                page.into_iter()
                    .map(|record| self.shape(record, &args.select, &args.include, op)),
            )
            .await?;

            let has_more = take.is_some_and(|t| data.len() == t);
            Ok(FindManyResult {
                data,
                has_more,
                cursor,
            })
        }
        .boxed()
    }

    /// Merges `data` over the stored record and persists it at the same key.
    ///
    /// Returns `None` when nothing is stored at the addressed key. The
    /// primary key never changes.
    pub fn update(&self, args: UpdateArgs) -> BoxFuture<'_, QueryResult<Option<Record>>> {
        async move {
            let op = Operation::Update;
            let store = self.store(op).await?;
            let key = self.key_for(&args.filter, op)?;

            let current = match store.get(&key).await.map_err(|e| self.store_error(op, e))? {
                Some(value) => self.to_record(value, op)?,
                None => return Ok(None),
            };

            let (patch, nested) = self.split_payload(args.data, op)?;
            let mut merged = current.clone();
            for (field, value) in patch {
                merged.insert(field, value);
            }

            let updated_at = &self.client.config.updated_at_field;
            if let Some(def) = self.model().field(updated_at) {
                merged.insert(updated_at.clone(), timestamp_value(def));
            }

            let pk = self.primary_key();
            if let Some(id) = current.get(pk) {
                merged.insert(pk.to_string(), id.clone());
            }

            self.validate(&merged, op)?;
            store
                .set(&key, Value::Object(merged.clone()))
                .await
                .map_err(|e| self.store_error(op, e))?;
            if event_enabled(Event::RecordUpdated) {
                log_event_with_fields(
                    Event::RecordUpdated,
                    &[("collection", self.name()), ("key", &key.to_string())],
                );
            }

            let mut result = merged;
            let attached = self
                .write_nested(&result, nested, NestedMode::Upsert, op)
                .await?;
            for (relation, written) in attached {
                result.insert(relation, written);
            }

            self.shape(result, &args.select, &args.include, op)
                .await
                .map(Some)
        }
        .boxed()
    }

    /// Deletes one record and every related record pointing at it.
    ///
    /// Only relations whose `local_key` is this model's primary key cascade:
    /// their target records hold this record's key in `foreign_key` and are
    /// removed with `delete_many`. A relation keyed by a field of this record
    /// (a `one` link to a parent, say) leaves the target untouched. The
    /// cascade is not recursive.
    ///
    /// Returns the projected pre-deletion record, or `None` when absent.
    pub fn delete(&self, args: DeleteArgs) -> BoxFuture<'_, QueryResult<Option<Record>>> {
        async move {
            let op = Operation::Delete;
            let store = self.store(op).await?;
            let key = self.key_for(&args.filter, op)?;

            let record = match store.get(&key).await.map_err(|e| self.store_error(op, e))? {
                Some(value) => self.to_record(value, op)?,
                None => return Ok(None),
            };

            self.cascade_delete(&record).await?;

            store
                .delete(&key)
                .await
                .map_err(|e| self.store_error(op, e))?;
            if event_enabled(Event::RecordDeleted) {
                log_event_with_fields(
                    Event::RecordDeleted,
                    &[("collection", self.name()), ("key", &key.to_string())],
                );
            }

            Ok(Some(args.select.project(record)))
        }
        .boxed()
    }

    /// Deletes every matching record. No cascade.
    pub fn delete_many(&self, args: DeleteManyArgs) -> BoxFuture<'_, QueryResult<DeleteManyResult>> {
        async move {
            let op = Operation::DeleteMany;
            let store = self.store(op).await?;

            let mut keys: Vec<StoreKey> = Vec::new();
            self.scan_matches(&*store, &args.filter, op, |key, _| keys.push(key))
                .await?;

            for key in &keys {
                store.delete(key).await.map_err(|e| self.store_error(op, e))?;
            }

            if !keys.is_empty() {
                log_event_with_fields(
                    Event::RecordDeleted,
                    &[("collection", self.name()), ("count", &keys.len().to_string())],
                );
            }

            Ok(DeleteManyResult { count: keys.len() })
        }
        .boxed()
    }

    /// Updates the addressed record if it exists, creates it otherwise
    pub fn upsert(&self, args: UpsertArgs) -> BoxFuture<'_, QueryResult<Record>> {
        async move {
            let op = Operation::Upsert;
            self.store(op).await?;
            self.key_for(&args.filter, op)?;

            let UpsertArgs {
                filter,
                create,
                update,
                select,
                include,
            } = args;

            let updated = self
                .update(UpdateArgs {
                    filter,
                    data: update,
                    select: select.clone(),
                    include: include.clone(),
                })
                .await?;

            match updated {
                Some(record) => Ok(record),
                None => {
                    self.create(CreateArgs {
                        data: create,
                        select,
                        include,
                    })
                    .await
                }
            }
        }
        .boxed()
    }

    /// Number of matching records.
    ///
    /// Counts every match; the client's `default_take` does not apply, so
    /// the result can exceed a `find_many` page that relied on it.
    pub fn count(&self, args: CountArgs) -> BoxFuture<'_, QueryResult<usize>> {
        async move {
            let op = Operation::Count;
            let store = self.store(op).await?;

            let mut count = 0;
            self.scan_matches(&*store, &args.filter, op, |_, _| count += 1)
                .await?;
            Ok(count)
        }
        .boxed()
    }

    async fn store(&self, op: Operation) -> QueryResult<Arc<dyn KvStore>> {
        self.client
            .lifecycle
            .store()
            .await
            .map_err(|e| QueryError::lifecycle(self.name(), op, e))
    }

    pub(super) fn store_error(&self, op: Operation, e: StoreError) -> QueryError {
        QueryError::store(self.name(), op, e)
    }

    fn key_for(&self, filter: &WhereClause, op: Operation) -> QueryResult<StoreKey> {
        KeyCodec::key_from_where(self.name(), filter).map_err(|e| self.store_error(op, e))
    }

    fn to_record(&self, value: Value, op: Operation) -> QueryResult<Record> {
        match value {
            Value::Object(record) => Ok(record),
            other => Err(self.store_error(
                op,
                StoreError::Serialization(format!(
                    "stored value is {}, expected object",
                    json_type_name(&other)
                )),
            )),
        }
    }

    fn validate(&self, record: &Record, op: Operation) -> QueryResult<()> {
        SchemaValidator::new(self.model())
            .validate_record(record)
            .map_err(|e| QueryError::validation(self.name(), op, e))
    }

    fn fill_generated(&self, record: &mut Record) {
        let pk = self.primary_key();
        let int_key = matches!(
            self.model().field(pk).map(|def| &def.field_type),
            Some(FieldType::Int)
        );
        if !int_key && !record.contains_key(pk) {
            record.insert(pk.to_string(), Value::String(Uuid::new_v4().to_string()));
        }

        let created_at = &self.client.config.created_at_field;
        if let Some(def) = self.model().field(created_at) {
            if !record.contains_key(created_at) {
                record.insert(created_at.clone(), timestamp_value(def));
            }
        }
    }

    /// Separates relation payloads from plain fields
    fn split_payload(
        &self,
        data: Value,
        op: Operation,
    ) -> QueryResult<(Record, Vec<NestedPayload>)> {
        let object = match data {
            Value::Object(object) => object,
            other => {
                return Err(QueryError::validation(
                    self.name(),
                    op,
                    SchemaError::validation_failed(
                        self.name(),
                        ValidationDetails::type_mismatch("$root", "object", json_type_name(&other)),
                    ),
                ))
            }
        };

        let mut record = Record::new();
        let mut nested = Vec::new();
        for (field, value) in object {
            let spec = match self.model().relation(&field) {
                Some(spec) => spec.clone(),
                None => {
                    record.insert(field, value);
                    continue;
                }
            };
            match value {
                Value::Array(items) if spec.is_many() => nested.push(NestedPayload {
                    relation: field,
                    spec,
                    items,
                }),
                _ => {
                    return Err(QueryError::invalid_query(
                        self.name(),
                        op,
                        format!(
                            "relation '{}' accepts only an array of records on a many relation",
                            field
                        ),
                    ))
                }
            }
        }
        Ok((record, nested))
    }

    /// Writes relation payloads on their targets, in order.
    ///
    /// Returns the written records per relation, for attaching to the parent.
    async fn write_nested(
        &self,
        parent: &Record,
        nested: Vec<NestedPayload>,
        mode: NestedMode,
        op: Operation,
    ) -> QueryResult<Vec<(String, Value)>> {
        let mut attached = Vec::with_capacity(nested.len());

        for payload in nested {
            let NestedPayload {
                relation,
                spec,
                items,
            } = payload;
            let target = self.require_related(&relation, &spec, op)?;
            let link = parent.get(&spec.local_key).cloned().ok_or_else(|| {
                QueryError::invalid_query(
                    self.name(),
                    op,
                    format!(
                        "record has no '{}' to link relation '{}'",
                        spec.local_key, relation
                    ),
                )
            })?;

            let mut written = Vec::with_capacity(items.len());
            for item in items {
                let mut item = match item {
                    Value::Object(item) => item,
                    other => {
                        return Err(QueryError::invalid_query(
                            self.name(),
                            op,
                            format!(
                                "items of relation '{}' must be objects, got {}",
                                relation,
                                json_type_name(&other)
                            ),
                        ))
                    }
                };
                item.insert(spec.foreign_key.clone(), link.clone());

                let target_pk = item.get(target.primary_key()).cloned();
                let record = match (mode, target_pk) {
                    (NestedMode::Upsert, Some(id)) => {
                        let data = Value::Object(item);
                        let filter = WhereClause::new().eq(target.primary_key(), id);
                        target
                            .upsert(UpsertArgs::new(filter, data.clone(), data))
                            .await?
                    }
                    _ => target.create(CreateArgs::new(Value::Object(item))).await?,
                };
                written.push(Value::Object(record));
            }

            log_event_with_fields(
                Event::NestedWrite,
                &[
                    ("collection", self.name()),
                    ("relation", &relation),
                    ("target", target.name()),
                    ("count", &written.len().to_string()),
                ],
            );
            attached.push((relation, Value::Array(written)));
        }

        Ok(attached)
    }

    /// Deletes records of related collections whose foreign key points at
    /// this record's primary key
    async fn cascade_delete(&self, record: &Record) -> QueryResult<()> {
        let pk = self.primary_key();
        let id = match record.get(pk) {
            Some(id) => id,
            None => return Ok(()),
        };

        for (relation, spec) in self.model().relations.iter() {
            if spec.local_key != pk {
                continue;
            }
            let target = match self.related(relation, spec) {
                Some(target) => target,
                None => continue,
            };

            let filter = WhereClause::new().eq(spec.foreign_key.clone(), id.clone());
            let removed = target.delete_many(DeleteManyArgs::new(filter)).await?;
            log_event_with_fields(
                Event::CascadeDelete,
                &[
                    ("collection", self.name()),
                    ("relation", relation),
                    ("target", target.name()),
                    ("count", &removed.count.to_string()),
                ],
            );
        }
        Ok(())
    }

    /// Target façade of a relation, or `None` (with a warning) when the
    /// target collection is not registered
    pub(super) fn related(&self, relation: &str, spec: &RelationSpec) -> Option<Namespace> {
        match self.client.namespace(&spec.target) {
            Ok(target) => Some(target),
            Err(_) => {
                log_event_with_fields(
                    Event::RelationDangling,
                    &[
                        ("collection", self.name()),
                        ("relation", relation),
                        ("target", &spec.target),
                    ],
                );
                None
            }
        }
    }

    fn require_related(
        &self,
        relation: &str,
        spec: &RelationSpec,
        op: Operation,
    ) -> QueryResult<Namespace> {
        self.client.namespace(&spec.target).map_err(|_| {
            QueryError::configuration(
                self.name(),
                op,
                format!(
                    "relation '{}' targets unregistered collection '{}'",
                    relation, spec.target
                ),
            )
        })
    }

    /// One page of matching records, plus the key of the last entry examined
    async fn scan_page(
        &self,
        store: &dyn KvStore,
        args: &FindManyArgs,
        take: Option<usize>,
        op: Operation,
    ) -> QueryResult<(Vec<Record>, Option<StoreKey>)> {
        let mut cursor = args.cursor.clone();
        let mut page = Vec::new();
        if take == Some(0) {
            return Ok((page, cursor));
        }

        let prefix = KeyCodec::encode_prefix(self.name());
        let mut entries = store.list(&prefix);
        let mut skipped = 0;

        while let Some(entry) = entries
            .try_next()
            .await
            .map_err(|e| self.store_error(op, e))?
        {
            if let Some(after) = &args.cursor {
                if entry.key <= *after {
                    continue;
                }
            }
            cursor = Some(entry.key.clone());

            let record = self.to_record(entry.value, op)?;
            if !PredicateFilter::matches(&record, &args.filter) {
                continue;
            }
            if skipped < args.skip {
                skipped += 1;
                continue;
            }

            page.push(record);
            if take.is_some_and(|t| page.len() >= t) {
                break;
            }
        }

        Ok((page, cursor))
    }

    async fn scan_matches<F>(
        &self,
        store: &dyn KvStore,
        filter: &WhereClause,
        op: Operation,
        mut visit: F,
    ) -> QueryResult<()>
    where
        F: FnMut(StoreKey, Record) + Send,
    {
        let prefix = KeyCodec::encode_prefix(self.name());
        let mut entries = store.list(&prefix);

        while let Some(entry) = entries
            .try_next()
            .await
            .map_err(|e| self.store_error(op, e))?
        {
            let record = self.to_record(entry.value, op)?;
            if PredicateFilter::matches(&record, filter) {
                visit(entry.key, record);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name())
            .field("primary_key", &self.primary_key())
            .finish()
    }
}

/// Current time in the representation the field declares
fn timestamp_value(def: &FieldDef) -> Value {
    let now = Utc::now();
    match def.field_type {
        FieldType::Int | FieldType::Float => Value::from(now.timestamp_millis()),
        _ => Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Client, ClientConfig};
    use crate::query::{Include, Select};
    use crate::store::MemoryConnector;
    use crate::schema::{FieldDef, ModelSchema, Relations, SchemaRegistry};
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        let users: ModelSchema = [
            ("id", FieldDef::required_string().primary()),
            ("name", FieldDef::required_string()),
            ("age", FieldDef::optional_int()),
            ("createdAt", FieldDef::optional_timestamp()),
        ]
        .into_iter()
        .collect();
        let user_relations: Relations = [("posts", RelationSpec::many("posts", "id", "authorId"))]
            .into_iter()
            .collect();

        let posts: ModelSchema = [
            ("id", FieldDef::required_string().primary()),
            ("authorId", FieldDef::required_string()),
            ("title", FieldDef::required_string()),
        ]
        .into_iter()
        .collect();

        let post_relations: Relations = [("author", RelationSpec::one("users", "authorId", "id"))]
            .into_iter()
            .collect();

        SchemaRegistry::builder()
            .model("users", users, user_relations)
            .model("posts", posts, post_relations)
            .build()
            .unwrap()
    }

    async fn ready_client() -> Client {
        let client = Client::in_memory(registry());
        client.init().await.unwrap();
        client
    }

    #[tokio::test]
    async fn test_create_synthesizes_id_and_timestamp() {
        let client = ready_client().await;
        let users = client.namespace("users").unwrap();

        let user = users
            .create(CreateArgs::new(json!({"name": "Alice"})))
            .await
            .unwrap();

        let id = user["id"].as_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
        assert!(user["createdAt"].is_string());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_data() {
        let client = ready_client().await;
        let users = client.namespace("users").unwrap();

        let err = users
            .create(CreateArgs::new(json!({"id": "u1", "age": 3})))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.collection(), "users");

        let found = users
            .find_unique(FindUniqueArgs::new(WhereClause::new().eq("id", "u1")))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_update_keeps_primary_key() {
        let client = ready_client().await;
        let users = client.namespace("users").unwrap();
        users
            .create(CreateArgs::new(json!({"id": "u1", "name": "Alice"})))
            .await
            .unwrap();

        let updated = users
            .update(UpdateArgs::new(
                WhereClause::new().eq("id", "u1"),
                json!({"id": "other", "name": "Alicia"}),
            ))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["id"], json!("u1"));
        assert_eq!(updated["name"], json!("Alicia"));

        let missing = users
            .find_unique(FindUniqueArgs::new(WhereClause::new().eq("id", "other")))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_absent_returns_none() {
        let client = ready_client().await;
        let users = client.namespace("users").unwrap();

        let result = users
            .update(UpdateArgs::new(
                WhereClause::new().eq("id", "nobody"),
                json!({"name": "X"}),
            ))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_find_unique_rejects_operator_where() {
        let client = ready_client().await;
        let users = client.namespace("users").unwrap();

        let filter: WhereClause = serde_json::from_value(json!({"id": {"in": ["u1"]}})).unwrap();
        let err = users
            .find_unique(FindUniqueArgs::new(filter))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidQuery { .. }));
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates() {
        let client = ready_client().await;
        let users = client.namespace("users").unwrap();
        let filter = WhereClause::new().eq("id", "u9");

        let created = users
            .upsert(UpsertArgs::new(
                filter.clone(),
                json!({"id": "u9", "name": "Nine"}),
                json!({"name": "Updated"}),
            ))
            .await
            .unwrap();
        assert_eq!(created["name"], json!("Nine"));

        let updated = users
            .upsert(UpsertArgs::new(
                filter,
                json!({"id": "u9", "name": "Nine"}),
                json!({"name": "Updated"}),
            ))
            .await
            .unwrap();
        assert_eq!(updated["name"], json!("Updated"));
        assert_eq!(users.count(CountArgs::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_nested_update_upserts_by_target_key() {
        let client = ready_client().await;
        let users = client.namespace("users").unwrap();
        let posts = client.namespace("posts").unwrap();

        users
            .create(CreateArgs::new(json!({
                "id": "u1",
                "name": "Alice",
                "posts": [{"id": "p1", "title": "First"}]
            })))
            .await
            .unwrap();

        let updated = users
            .update(UpdateArgs::new(
                WhereClause::new().eq("id", "u1"),
                json!({"posts": [{"id": "p1", "title": "Renamed"}, {"title": "Second"}]}),
            ))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated["posts"].as_array().unwrap().len(), 2);

        let p1 = posts
            .find_unique(FindUniqueArgs::new(WhereClause::new().eq("id", "p1")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(p1["title"], json!("Renamed"));
        assert_eq!(p1["authorId"], json!("u1"));
        assert_eq!(posts.count(CountArgs::default()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_relation_payload_must_be_array() {
        let client = ready_client().await;
        let users = client.namespace("users").unwrap();

        let err = users
            .create(CreateArgs::new(json!({
                "id": "u1",
                "name": "Alice",
                "posts": {"title": "not a list"}
            })))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidQuery { .. }));
    }

    #[tokio::test]
    async fn test_delete_returns_projected_record() {
        let client = ready_client().await;
        let users = client.namespace("users").unwrap();
        users
            .create(CreateArgs::new(json!({"id": "u1", "name": "Alice", "age": 30})))
            .await
            .unwrap();

        let deleted = users
            .delete(DeleteArgs::new(WhereClause::new().eq("id", "u1")).select(Select::new().with("name")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(Value::Object(deleted), json!({"name": "Alice"}));

        let again = users
            .delete(DeleteArgs::new(WhereClause::new().eq("id", "u1")))
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_count_ignores_default_take() {
        let client = Client::with_config(
            registry(),
            Arc::new(MemoryConnector::new()),
            ClientConfig::default().with_default_take(2),
        );
        client.init().await.unwrap();
        let users = client.namespace("users").unwrap();
        for id in ["u1", "u2", "u3"] {
            users
                .create(CreateArgs::new(json!({"id": id, "name": id})))
                .await
                .unwrap();
        }

        let page = users.find_many(FindManyArgs::new()).await.unwrap();
        assert_eq!(page.data.len(), 2);
        assert!(page.has_more);
        assert_eq!(users.count(CountArgs::default()).await.unwrap(), 3);

        // An explicit take covering every match agrees with count
        let all = users.find_many(FindManyArgs::new().take(10)).await.unwrap();
        assert_eq!(all.data.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_leaves_parent_of_one_relation() {
        let client = ready_client().await;
        let users = client.namespace("users").unwrap();
        let posts = client.namespace("posts").unwrap();
        users
            .create(CreateArgs::new(json!({"id": "u1", "name": "Alice"})))
            .await
            .unwrap();
        posts
            .create(CreateArgs::new(
                json!({"id": "p1", "authorId": "u1", "title": "Hi"}),
            ))
            .await
            .unwrap();

        posts
            .delete(DeleteArgs::new(WhereClause::new().eq("id", "p1")))
            .await
            .unwrap();
        assert_eq!(users.count(CountArgs::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_take_zero_returns_empty_page() {
        let client = ready_client().await;
        let users = client.namespace("users").unwrap();
        users
            .create(CreateArgs::new(json!({"id": "u1", "name": "Alice"})))
            .await
            .unwrap();

        let page = users.find_many(FindManyArgs::new().take(0)).await.unwrap();
        assert!(page.data.is_empty());
    }

    #[tokio::test]
    async fn test_undeclared_include_is_configuration_error() {
        let client = ready_client().await;
        let users = client.namespace("users").unwrap();
        users
            .create(CreateArgs::new(json!({"id": "u1", "name": "Alice"})))
            .await
            .unwrap();

        let err = users
            .find_unique(
                FindUniqueArgs::new(WhereClause::new().eq("id", "u1"))
                    .include(Include::new().with("friends")),
            )
            .await
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
