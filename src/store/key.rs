//! Store key model
//!
//! A store key is an ordered sequence of typed parts. Keys order
//! lexicographically part by part, and a key sorts before every key it is a
//! prefix of, so a prefix scan visits one collection's records contiguously.
//!
//! Part ordering: bytes < string < number < bool. Integers and floats share
//! the number class and compare numerically.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{StoreError, StoreResult};

/// One component of a store key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPart {
    Bytes(Vec<u8>),
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl KeyPart {
    fn rank(&self) -> u8 {
        match self {
            KeyPart::Bytes(_) => 0,
            KeyPart::String(_) => 1,
            KeyPart::Int(_) | KeyPart::Float(_) => 2,
            KeyPart::Bool(_) => 3,
        }
    }

    /// Converts a JSON value into a key part.
    ///
    /// Only strings, numbers and booleans address records; anything else is
    /// rejected with `StoreError::InvalidKey`. Integers outside the i64 range
    /// are rejected too.
    pub fn from_value(value: &Value) -> StoreResult<Self> {
        match value {
            Value::String(s) => Ok(KeyPart::String(s.clone())),
            Value::Bool(b) => Ok(KeyPart::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Ok(KeyPart::Int(i));
                }
                // Integers beyond i64 would collide once rounded to f64
                if n.is_u64() {
                    return Err(StoreError::InvalidKey(format!("{} is out of range", n)));
                }
                n.as_f64()
                    .map(KeyPart::Float)
                    .ok_or_else(|| StoreError::InvalidKey(n.to_string()))
            }
            Value::Null => Err(StoreError::InvalidKey("null".into())),
            Value::Array(_) => Err(StoreError::InvalidKey("array".into())),
            Value::Object(_) => Err(StoreError::InvalidKey("object".into())),
        }
    }

    /// JSON form of this part
    pub fn to_value(&self) -> Value {
        match self {
            KeyPart::Bytes(b) => Value::Array(b.iter().map(|byte| Value::from(*byte)).collect()),
            KeyPart::String(s) => Value::String(s.clone()),
            KeyPart::Int(i) => Value::from(*i),
            KeyPart::Float(f) => Value::from(*f),
            KeyPart::Bool(b) => Value::Bool(*b),
        }
    }
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Bytes(a), KeyPart::Bytes(b)) => a.cmp(b),
            (KeyPart::String(a), KeyPart::String(b)) => a.cmp(b),
            (KeyPart::Int(a), KeyPart::Int(b)) => a.cmp(b),
            (KeyPart::Float(a), KeyPart::Float(b)) => cmp_floats(*a, *b),
            (KeyPart::Int(a), KeyPart::Float(b)) => cmp_int_float(*a, *b),
            (KeyPart::Float(a), KeyPart::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (KeyPart::Bool(a), KeyPart::Bool(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Total order on floats with `-0.0 == 0.0`, so it agrees with the
/// integer comparison below.
fn cmp_floats(a: f64, b: f64) -> Ordering {
    if a == b {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

/// Exact comparison of an integer with a float. Casting the integer to f64
/// would round above 2^53 and break transitivity.
fn cmp_int_float(i: i64, f: f64) -> Ordering {
    // 2^63, the first float above i64::MAX
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;

    if f.is_nan() {
        return if f.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if f >= LIMIT {
        return Ordering::Less;
    }
    if f < -LIMIT {
        return Ordering::Greater;
    }

    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal if f > whole => Ordering::Less,
        Ordering::Equal if f < whole => Ordering::Greater,
        other => other,
    }
}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for KeyPart {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyPart {}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        KeyPart::String(s.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        KeyPart::String(s)
    }
}

impl From<i64> for KeyPart {
    fn from(i: i64) -> Self {
        KeyPart::Int(i)
    }
}

impl From<bool> for KeyPart {
    fn from(b: bool) -> Self {
        KeyPart::Bool(b)
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Bytes(b) => write!(f, "{:?}", b),
            KeyPart::String(s) => write!(f, "{:?}", s),
            KeyPart::Int(i) => write!(f, "{}", i),
            KeyPart::Float(x) => write!(f, "{}", x),
            KeyPart::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Address of one value in the store; also used as a scan prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreKey(Vec<KeyPart>);

impl StoreKey {
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Self(parts)
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    pub fn push(&mut self, part: impl Into<KeyPart>) {
        self.0.push(part.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `prefix` is a leading segment of this key
    pub fn starts_with(&self, prefix: &StoreKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.0.iter().map(KeyPart::to_value).collect())
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", part)?;
        }
        write!(f, "]")
    }
}
