//! Ordering of a result page
//!
//! `orderBy` sorts the page that pagination already produced. Sorting is
//! stable, so records with equal sort values keep store key order.

use std::cmp::Ordering;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::predicate::compare_scalars;
use crate::schema::Record;

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Sort order for `findMany`.
///
/// Deserializes from either `{"age": "desc"}` or
/// `{"field": "age", "direction": "desc"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

struct OrderByVisitor;

impl<'de> Visitor<'de> for OrderByVisitor {
    type Value = OrderBy;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{\"<field>\": \"asc\"|\"desc\"} or {\"field\", \"direction\"}")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries: Vec<(String, Value)> = Vec::new();
        while let Some(entry) = access.next_entry::<String, Value>()? {
            entries.push(entry);
        }

        let lookup = |name: &str| entries.iter().find(|(k, _)| k == name).map(|(_, v)| v);

        if entries.len() == 2 {
            if let (Some(Value::String(field)), Some(direction)) =
                (lookup("field"), lookup("direction"))
            {
                let direction = SortDirection::deserialize(direction.clone())
                    .map_err(de::Error::custom)?;
                return Ok(OrderBy {
                    field: field.clone(),
                    direction,
                });
            }
        }

        match entries.as_slice() {
            [(field, direction)] => {
                let direction =
                    SortDirection::deserialize(direction.clone()).map_err(de::Error::custom)?;
                Ok(OrderBy {
                    field: field.clone(),
                    direction,
                })
            }
            _ => Err(de::Error::invalid_length(entries.len(), &self)),
        }
    }
}

impl<'de> Deserialize<'de> for OrderBy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderByVisitor)
    }
}

/// Sorts record pages
pub struct ResultSorter;

impl ResultSorter {
    /// Sorts records in place; the sort is stable.
    pub fn sort(records: &mut [Record], order: &OrderBy) {
        records.sort_by(|a, b| {
            let ordering = Self::compare_values(a.get(&order.field), b.get(&order.field));
            match order.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    /// Total order over JSON values.
    ///
    /// Absent sorts first, then null < bool < number < string < array < object.
    /// Arrays and objects of the same kind compare equal.
    pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(a), Some(b)) => {
                let by_type = Self::type_rank(a).cmp(&Self::type_rank(b));
                if by_type != Ordering::Equal {
                    return by_type;
                }
                match (a, b) {
                    (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
                    _ => compare_scalars(a, b).unwrap_or(Ordering::Equal),
                }
            }
        }
    }

    fn type_rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
}
