//! Dynamic row representation.
//! Records carry a table name, an optional primary key and named columns so
//! that the same store can host any schema the core is configured with.

use std::collections::BTreeMap;
use std::fmt;

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::Error;

/// A single column value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Value {
    /// Signed integer column.
    Int(i64),
    /// UTF-8 text column.
    Text(String),
    /// Opaque byte payload.
    Bytes(Vec<u8>),
    /// Boolean column.
    Bool(bool),
}

impl Value {
    /// Integer content, if this is an [`Value::Int`].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Compares against `other` only when both values are of the same kind.
    pub(crate) fn same_kind_cmp(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(value) => write!(f, "{}", value),
            Value::Text(value) => write!(f, "{}", value),
            Value::Bytes(value) => write!(f, "0x{}", hex::encode(value)),
            Value::Bool(value) => write!(f, "{}", value),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// A row of some table: optional primary key plus named columns.
///
/// A record with `id() == None` exists only in memory; stores assign the key
/// on insert and hand back the persisted copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    table: String,
    id: Option<u64>,
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an unpersisted record of `table` with no columns set.
    pub fn new(table: impl Into<String>) -> Self {
        Record {
            table: table.into(),
            id: None,
            fields: BTreeMap::new(),
        }
    }

    /// Table this record belongs to.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Primary key, when persisted.
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: u64) {
        self.id = Some(id);
    }

    /// Sets `field` and returns the record, builder style.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Column value, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Integer column value, if present and an integer.
    pub fn int(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(Value::as_int)
    }

    /// Sets a column in place.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Removes a column, returning its previous value.
    pub fn unset(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Names of the columns currently set.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Serializes the record for storage.
    pub fn serialize(&self) -> Result<Vec<u8>, Error> {
        bincode::DefaultOptions::default()
            .with_varint_encoding()
            .reject_trailing_bytes()
            .serialize(self)
            .map_err(|_| Error::CorruptedData(String::from("unable to serialize record")))
    }

    /// Deserializes a record previously written by [`Record::serialize`].
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        bincode::DefaultOptions::default()
            .with_varint_encoding()
            .reject_trailing_bytes()
            .deserialize(bytes)
            .map_err(|_| Error::CorruptedData(String::from("unable to deserialize record")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let record = Record::new("pages")
            .with("title", "home")
            .with("lft", 1)
            .with("blob", b"\x00\x01".to_vec())
            .with("visible", true);
        let bytes = record.serialize().expect("expected to serialize");
        assert_eq!(
            Record::deserialize(&bytes).expect("expected to deserialize"),
            record
        );
    }

    #[test]
    fn test_display_renders_bytes_as_hex() {
        assert_eq!(Value::Bytes(vec![0xde, 0xad]).to_string(), "0xdead");
        assert_eq!(Value::Int(7).to_string(), "7");
    }

    #[test]
    fn test_int_accessor_ignores_other_kinds() {
        let record = Record::new("pages").with("title", "home").with("lft", 4);
        assert_eq!(record.int("lft"), Some(4));
        assert_eq!(record.int("title"), None);
        assert_eq!(record.int("missing"), None);
    }
}
