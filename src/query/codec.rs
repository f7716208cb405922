//! Key codec
//!
//! Maps (collection, identifying values) to store keys. Keys are write-only
//! addresses: nothing parses them back into records.

use serde_json::Value;

use super::predicate::WhereClause;
use crate::schema::Record;
use crate::store::{KeyPart, StoreError, StoreKey, StoreResult};

/// Builds store keys for collections
pub struct KeyCodec;

impl KeyCodec {
    /// Key for `collection` followed by each identifying value, in the
    /// order given.
    pub fn encode_key<'a, I>(collection: &str, values: I) -> StoreResult<StoreKey>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut key = Self::encode_prefix(collection);
        for value in values {
            key.push(KeyPart::from_value(value)?);
        }
        Ok(key)
    }

    /// Prefix covering every key of `collection`
    pub fn encode_prefix(collection: &str) -> StoreKey {
        StoreKey::new(vec![KeyPart::from(collection)])
    }

    /// Key addressed by an equality-only `where` clause.
    ///
    /// Every supplied value takes part in the key, so a clause naming a
    /// non-key field next to the primary key addresses a different entry.
    pub fn key_from_where(collection: &str, clause: &WhereClause) -> StoreResult<StoreKey> {
        if clause.is_empty() {
            return Err(StoreError::InvalidKey(
                "where clause names no identifying field".into(),
            ));
        }
        let values = clause.equality_values().map_err(|field| {
            StoreError::InvalidKey(format!(
                "field '{}' uses an operator object and cannot address a record",
                field
            ))
        })?;
        Self::encode_key(collection, values.into_iter().map(|(_, v)| v))
    }

    /// Key of a stored record, taken from its primary key field
    pub fn record_key(collection: &str, primary_key: &str, record: &Record) -> StoreResult<StoreKey> {
        let value = record.get(primary_key).ok_or_else(|| {
            StoreError::InvalidKey(format!("record has no primary key field '{}'", primary_key))
        })?;
        Self::encode_key(collection, [value])
    }
}
