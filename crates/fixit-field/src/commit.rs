//! Commit encoding.
//!
//! Turns a canonical selection back into the shape the form's value store
//! expects: plain keys or numeric lookup ids, a single value or a list, and
//! `null` whenever nothing is selected.

use crate::key::Selection;
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};

/// Largest integral value that survives an `f64` round trip.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A numeric id referencing another record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookupId(f64);

impl LookupId {
    /// Parse a selection key. Non-numeric and non-finite keys yield `None`.
    pub fn parse(key: &str) -> Option<Self> {
        key.trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(Self)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn to_json(self) -> Value {
        if self.0.fract() == 0.0 && self.0.abs() <= MAX_SAFE_INTEGER {
            return Value::from(self.0 as i64);
        }
        Number::from_f64(self.0).map_or(Value::Null, Value::Number)
    }
}

impl From<i64> for LookupId {
    fn from(value: i64) -> Self {
        Self(value as f64)
    }
}

impl Serialize for LookupId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// The outbound value for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitValue {
    Null,
    Key(String),
    Keys(Vec<String>),
    Id(LookupId),
    Ids(Vec<LookupId>),
}

impl CommitValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Key(key) => Value::String(key.clone()),
            Self::Keys(keys) => Value::Array(keys.iter().cloned().map(Value::String).collect()),
            Self::Id(id) => id.to_json(),
            Self::Ids(ids) => Value::Array(ids.iter().map(|id| id.to_json()).collect()),
        }
    }
}

impl Serialize for CommitValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// A commit addressed to the form's value store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedCommit {
    pub target_key: String,
    pub value: CommitValue,
}

/// Store key for a field: `<fieldId>Id` for lookups, `<fieldId>` otherwise.
pub fn target_key(field_id: &str, is_lookup: bool) -> String {
    if is_lookup {
        format!("{field_id}Id")
    } else {
        field_id.to_string()
    }
}

/// Encode `selection` for the value store.
pub fn encode_commit(
    field_id: &str,
    selection: &Selection,
    is_lookup: bool,
    is_multi: bool,
) -> EncodedCommit {
    let value = if is_lookup {
        let ids: Vec<LookupId> = selection.iter().filter_map(LookupId::parse).collect();
        match (is_multi, ids.first()) {
            (_, None) => CommitValue::Null,
            (true, Some(_)) => CommitValue::Ids(ids),
            (false, Some(first)) => CommitValue::Id(*first),
        }
    } else {
        match (is_multi, selection.first()) {
            (_, None) => CommitValue::Null,
            (true, Some(_)) => CommitValue::Keys(selection.keys().to_vec()),
            (false, Some(first)) => CommitValue::Key(first.to_string()),
        }
    };

    EncodedCommit {
        target_key: target_key(field_id, is_lookup),
        value,
    }
}
