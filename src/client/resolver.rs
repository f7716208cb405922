//! Projection and inclusion
//!
//! Shaping runs in a fixed order: `include` first, then `select`. Because
//! projection sees the attached relations, a relation survives a non-empty
//! `select` only when the `select` names it too.

use futures_util::future::try_join_all;
use serde_json::Value;

use super::errors::{Operation, QueryError, QueryResult};
use super::namespace::Namespace;
use crate::query::{FindManyArgs, FindUniqueArgs, Include, Select, WhereClause};
use crate::schema::Record;

impl Namespace {
    /// Applies `include` then `select` to one record.
    ///
    /// Requested relations resolve concurrently. The first failing branch
    /// fails the whole call.
    pub(super) async fn shape(
        &self,
        record: Record,
        select: &Select,
        include: &Include,
        op: Operation,
    ) -> QueryResult<Record> {
        let mut shaped = record;

        let relations: Vec<&str> = include.enabled().collect();
        if !relations.is_empty() {
            let resolved = try_join_all(
                relations
                    .iter()
                    .map(|relation| self.resolve_relation(relation, &shaped, op)),
            )
            .await?;

            for (relation, value) in relations.into_iter().zip(resolved) {
                shaped.insert(relation.to_string(), value);
            }
        }

        Ok(select.project(shaped))
    }

    /// Related records for one relation: an array for `many`, a record or
    /// null for `one`.
    ///
    /// An unregistered target, or a record without the local key, yields
    /// the empty value rather than an error.
    async fn resolve_relation(
        &self,
        relation: &str,
        record: &Record,
        op: Operation,
    ) -> QueryResult<Value> {
        let spec = self.model().relation(relation).ok_or_else(|| {
            QueryError::configuration(
                self.name(),
                op,
                format!("relation '{}' is not declared", relation),
            )
        })?;

        let empty = if spec.is_many() {
            Value::Array(Vec::new())
        } else {
            Value::Null
        };

        let target = match self.related(relation, spec) {
            Some(target) => target,
            None => return Ok(empty),
        };
        let link = match record.get(&spec.local_key) {
            Some(link) => link.clone(),
            None => return Ok(empty),
        };
        let filter = WhereClause::new().eq(spec.foreign_key.clone(), link);

        if spec.is_many() {
            let page = target
                .find_page(FindManyArgs::new().filter(filter), None)
                .await?;
            return Ok(Value::Array(
                page.data.into_iter().map(Value::Object).collect(),
            ));
        }

        // A foreign key that is the target's primary key is a point lookup;
        // anything else scans for the first match.
        let found = if spec.foreign_key == target.primary_key() {
            target.find_unique(FindUniqueArgs::new(filter)).await?
        } else {
            target
                .find_page(FindManyArgs::new().filter(filter), Some(1))
                .await?
                .data
                .into_iter()
                .next()
        };

        Ok(found.map(Value::Object).unwrap_or(Value::Null))
    }
}
