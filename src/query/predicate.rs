//! Predicate evaluation for `where` clauses
//!
//! A clause maps fields to either a literal (equality) or an operator set.
//! Every field constraint and every operator inside one constraint must hold
//! (AND semantics). There is no OR and no nesting. Unknown operators never
//! match.

use std::cmp::Ordering;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::schema::Record;

/// Comparison operators available inside an operator object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Equals,
    Not,
    In,
    NotIn,
    Lt,
    Lte,
    Gt,
    Gte,
    Contains,
    StartsWith,
    EndsWith,
    /// Unrecognized name, kept so the clause fails closed
    Unknown(String),
}

impl Operator {
    pub fn parse(name: &str) -> Self {
        match name {
            "equals" => Operator::Equals,
            "not" => Operator::Not,
            "in" => Operator::In,
            "notIn" => Operator::NotIn,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "contains" => Operator::Contains,
            "startsWith" => Operator::StartsWith,
            "endsWith" => Operator::EndsWith,
            other => Operator::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::Not => "not",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Contains => "contains",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
            Operator::Unknown(name) => name,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraint on a single field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Literal shorthand: strict equality
    Equals(Value),
    /// Operator object: every entry must pass
    Operators(Vec<(Operator, Value)>),
}

impl Condition {
    fn from_value(value: Value) -> Self {
        match value {
            Value::Object(ops) => Condition::Operators(
                ops.into_iter()
                    .map(|(name, operand)| (Operator::parse(&name), operand))
                    .collect(),
            ),
            literal => Condition::Equals(literal),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Condition::Equals(v) => v.clone(),
            Condition::Operators(ops) => Value::Object(
                ops.iter()
                    .map(|(op, operand)| (op.as_str().to_string(), operand.clone()))
                    .collect(),
            ),
        }
    }
}

/// A `where` clause, in caller order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    conditions: Vec<(String, Condition)>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality constraint
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push((field.into(), Condition::Equals(value.into())));
        self
    }

    /// Adds an operator constraint, joining any operator object already
    /// present for `field`
    pub fn op(mut self, field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        let field = field.into();
        let value = value.into();
        let existing = self.conditions.iter_mut().find(|(name, cond)| {
            *name == field && matches!(cond, Condition::Operators(_))
        });
        match existing {
            Some((_, Condition::Operators(ops))) => ops.push((op, value)),
            _ => self
                .conditions
                .push((field, Condition::Operators(vec![(op, value)]))),
        }
        self
    }

    /// Builds a clause from a JSON object
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self {
            conditions: map
                .into_iter()
                .map(|(field, value)| (field, Condition::from_value(value)))
                .collect(),
        }
    }

    pub fn conditions(&self) -> &[(String, Condition)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Literal values of an equality-only clause, in order.
    ///
    /// Returns the name of the first field constrained by an operator object
    /// as the error.
    pub fn equality_values(&self) -> Result<Vec<(&str, &Value)>, &str> {
        self.conditions
            .iter()
            .map(|(field, cond)| match cond {
                Condition::Equals(v) => Ok((field.as_str(), v)),
                Condition::Operators(_) => Err(field.as_str()),
            })
            .collect()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.conditions
                .iter()
                .map(|(field, cond)| (field.clone(), cond.to_value()))
                .collect(),
        )
    }
}

impl Serialize for WhereClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.conditions.len()))?;
        for (field, cond) in &self.conditions {
            map.serialize_entry(field, &cond.to_value())?;
        }
        map.end()
    }
}

struct WhereVisitor;

impl<'de> Visitor<'de> for WhereVisitor {
    type Value = WhereClause;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping fields to values or operator objects")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut conditions = Vec::new();
        while let Some((field, value)) = access.next_entry::<String, Value>()? {
            conditions.push((field, Condition::from_value(value)));
        }
        Ok(WhereClause { conditions })
    }
}

impl<'de> Deserialize<'de> for WhereClause {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(WhereVisitor)
    }
}

/// Evaluates `where` clauses against records
pub struct PredicateFilter;

impl PredicateFilter {
    /// Checks if a record satisfies every constraint of the clause.
    ///
    /// An empty clause matches every record.
    pub fn matches(record: &Record, clause: &WhereClause) -> bool {
        clause
            .conditions
            .iter()
            .all(|(field, cond)| Self::matches_condition(record.get(field), cond))
    }

    fn matches_condition(actual: Option<&Value>, cond: &Condition) -> bool {
        match cond {
            Condition::Equals(expected) => actual.is_some_and(|a| values_equal(a, expected)),
            Condition::Operators(ops) => ops
                .iter()
                .all(|(op, operand)| Self::apply(op, actual, operand)),
        }
    }

    fn apply(op: &Operator, actual: Option<&Value>, operand: &Value) -> bool {
        match op {
            Operator::Equals => actual.is_some_and(|a| values_equal(a, operand)),
            Operator::Not => !actual.is_some_and(|a| values_equal(a, operand)),
            Operator::In => match operand.as_array() {
                Some(set) => actual.is_some_and(|a| set.iter().any(|v| values_equal(a, v))),
                None => false,
            },
            Operator::NotIn => match operand.as_array() {
                Some(set) => !actual.is_some_and(|a| set.iter().any(|v| values_equal(a, v))),
                None => false,
            },
            Operator::Lt => Self::ordered(actual, operand, |o| o == Ordering::Less),
            Operator::Lte => Self::ordered(actual, operand, |o| o != Ordering::Greater),
            Operator::Gt => Self::ordered(actual, operand, |o| o == Ordering::Greater),
            Operator::Gte => Self::ordered(actual, operand, |o| o != Ordering::Less),
            Operator::Contains => Self::text(actual, operand, |s, p| s.contains(p)),
            Operator::StartsWith => Self::text(actual, operand, |s, p| s.starts_with(p)),
            Operator::EndsWith => Self::text(actual, operand, |s, p| s.ends_with(p)),
            Operator::Unknown(_) => false,
        }
    }

    fn ordered(actual: Option<&Value>, bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
        actual
            .and_then(|a| compare_scalars(a, bound))
            .is_some_and(accept)
    }

    fn text(actual: Option<&Value>, operand: &Value, test: impl Fn(&str, &str) -> bool) -> bool {
        match (actual.and_then(Value::as_str), operand.as_str()) {
            (Some(s), Some(p)) => test(s, p),
            _ => false,
        }
    }
}

/// Strict equality without coercion; integers and floats of equal
/// magnitude are the same number.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(xi), Some(yi)) => xi == yi,
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(xu), Some(yu)) => xu == yu,
                _ => x.as_f64() == y.as_f64(),
            },
        },
        _ => a == b,
    }
}

/// Orders two scalars of the same kind: numbers numerically, strings
/// lexicographically. Mixed or non-scalar pairs are incomparable.
pub fn compare_scalars(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(xi), Some(yi)) = (x.as_i64(), y.as_i64()) {
                return Some(xi.cmp(&yi));
            }
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
