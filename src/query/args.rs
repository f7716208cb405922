//! Query descriptors and results
//!
//! Each façade operation takes one argument struct. All of them deserialize
//! from the JSON descriptor shape (`where`, `select`, `include`, `orderBy`,
//! `take`, `skip`, `cursor`), so callers can build them in code or parse them.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::predicate::WhereClause;
use super::sorter::OrderBy;
use crate::schema::Record;
use crate::store::StoreKey;

/// Ordered field -> flag mapping used by `select` and `include`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldFlags(Vec<(String, bool)>);

impl FieldFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `true`
    pub fn with(self, name: impl Into<String>) -> Self {
        self.set(name, true)
    }

    pub fn set(mut self, name: impl Into<String>, flag: bool) -> Self {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = flag,
            None => self.0.push((name, flag)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.0.iter().any(|(n, flag)| n == name && *flag)
    }

    /// Names whose flag is `true`, in order
    pub fn enabled(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, flag)| *flag)
            .map(|(name, _)| name.as_str())
    }
}

impl<S: Into<String>> FromIterator<S> for FieldFlags {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        iter.into_iter().fold(Self::new(), |flags, name| flags.with(name))
    }
}

struct FlagsVisitor;

impl<'de> Visitor<'de> for FlagsVisitor {
    type Value = FieldFlags;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping names to booleans")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut flags = FieldFlags::new();
        while let Some((name, flag)) = access.next_entry::<String, bool>()? {
            flags = flags.set(name, flag);
        }
        Ok(flags)
    }
}

impl<'de> Deserialize<'de> for FieldFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(FlagsVisitor)
    }
}

/// Field allow-list; empty means every field
pub type Select = FieldFlags;

/// Relations to expand; only names flagged `true` are resolved
pub type Include = FieldFlags;

impl FieldFlags {
    /// Projects a record down to the selected fields.
    ///
    /// An empty selection returns the record unchanged.
    pub fn project(&self, record: Record) -> Record {
        if self.is_empty() {
            return record;
        }
        record
            .into_iter()
            .filter(|(field, _)| self.is_set(field))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateArgs {
    pub data: Value,
    pub select: Select,
    pub include: Include,
}

impl CreateArgs {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    pub fn select(mut self, select: Select) -> Self {
        self.select = select;
        self
    }

    pub fn include(mut self, include: Include) -> Self {
        self.include = include;
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FindUniqueArgs {
    #[serde(rename = "where")]
    pub filter: WhereClause,
    pub select: Select,
    pub include: Include,
}

impl FindUniqueArgs {
    pub fn new(filter: WhereClause) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn select(mut self, select: Select) -> Self {
        self.select = select;
        self
    }

    pub fn include(mut self, include: Include) -> Self {
        self.include = include;
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FindManyArgs {
    #[serde(rename = "where")]
    pub filter: WhereClause,
    pub select: Select,
    pub include: Include,
    pub order_by: Option<OrderBy>,
    pub take: Option<usize>,
    pub skip: usize,
    /// Resume strictly after this key
    pub cursor: Option<StoreKey>,
}

impl FindManyArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: WhereClause) -> Self {
        self.filter = filter;
        self
    }

    pub fn select(mut self, select: Select) -> Self {
        self.select = select;
        self
    }

    pub fn include(mut self, include: Include) -> Self {
        self.include = include;
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn take(mut self, take: usize) -> Self {
        self.take = Some(take);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn cursor(mut self, cursor: StoreKey) -> Self {
        self.cursor = Some(cursor);
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateArgs {
    #[serde(rename = "where")]
    pub filter: WhereClause,
    pub data: Value,
    pub select: Select,
    pub include: Include,
}

impl UpdateArgs {
    pub fn new(filter: WhereClause, data: Value) -> Self {
        Self {
            filter,
            data,
            ..Self::default()
        }
    }

    pub fn select(mut self, select: Select) -> Self {
        self.select = select;
        self
    }

    pub fn include(mut self, include: Include) -> Self {
        self.include = include;
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteArgs {
    #[serde(rename = "where")]
    pub filter: WhereClause,
    pub select: Select,
}

impl DeleteArgs {
    pub fn new(filter: WhereClause) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn select(mut self, select: Select) -> Self {
        self.select = select;
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteManyArgs {
    #[serde(rename = "where")]
    pub filter: WhereClause,
}

impl DeleteManyArgs {
    pub fn new(filter: WhereClause) -> Self {
        Self { filter }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpsertArgs {
    #[serde(rename = "where")]
    pub filter: WhereClause,
    pub create: Value,
    pub update: Value,
    pub select: Select,
    pub include: Include,
}

impl UpsertArgs {
    pub fn new(filter: WhereClause, create: Value, update: Value) -> Self {
        Self {
            filter,
            create,
            update,
            ..Self::default()
        }
    }

    pub fn select(mut self, select: Select) -> Self {
        self.select = select;
        self
    }

    pub fn include(mut self, include: Include) -> Self {
        self.include = include;
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CountArgs {
    #[serde(rename = "where")]
    pub filter: WhereClause,
}

impl CountArgs {
    pub fn new(filter: WhereClause) -> Self {
        Self { filter }
    }
}

/// Page returned by `findMany`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindManyResult {
    pub data: Vec<Record>,
    /// True when the page is exactly `take` long
    pub has_more: bool,
    /// Key of the last entry the scan examined
    pub cursor: Option<StoreKey>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteManyResult {
    pub count: usize,
}
