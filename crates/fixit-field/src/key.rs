//! Canonical keys, options and selections.
//!
//! Every key the field compares goes through [`to_key`], whether it came
//! from an option, a record value or a user event. Equality is therefore
//! always string equality over one representation.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::HashSet;

/// Largest magnitude at which an integral `f64` still renders exactly.
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Canonical string form of a key.
///
/// `null` maps to the empty string. Integral floats render without a
/// fractional part so `12` and `12.0` compare equal.
pub fn to_key(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_key(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(to_key).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

fn number_key(n: &Number) -> String {
    if n.is_f64()
        && let Some(f) = n.as_f64()
        && f.fract() == 0.0
        && f.abs() < EXACT_INTEGER_LIMIT
    {
        return format!("{}", f as i64);
    }
    n.to_string()
}

/// One selectable value: `{ key, text }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldOption {
    pub key: Value,
    #[serde(default)]
    pub text: String,
}

impl FieldOption {
    pub fn new(key: impl Into<Value>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }

    /// The canonical key of this option.
    pub fn canonical_key(&self) -> String {
        to_key(&self.key)
    }
}

/// Label for `key` in `options`, if the option exists.
pub fn label_for<'a>(options: &'a [FieldOption], key: &str) -> Option<&'a str> {
    options
        .iter()
        .find(|option| option.canonical_key() == key)
        .map(|option| option.text.as_str())
}

/// Visible labels of `selection` joined with `"; "`.
///
/// Keys without a matching option fall back to the key itself.
pub fn display_text(selection: &Selection, options: &[FieldOption]) -> String {
    selection
        .iter()
        .map(|key| label_for(options, key).unwrap_or(key))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Canonical keys of an option list, for membership tests.
pub(crate) fn option_keys(options: &[FieldOption]) -> HashSet<String> {
    options.iter().map(FieldOption::canonical_key).collect()
}

/// An ordered, duplicate-free sequence of canonical keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(Vec<String>);

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection, keeping the first occurrence of each key.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut selection = Self::new();
        for key in keys {
            selection.insert(key.into());
        }
        selection
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn into_keys(self) -> Vec<String> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|k| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Append `key` unless already present. Returns whether it was added.
    pub fn insert(&mut self, key: String) -> bool {
        if self.contains(&key) {
            return false;
        }
        self.0.push(key);
        true
    }

    /// Remove `key` if present. Returns whether it was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|k| k != key);
        self.0.len() != before
    }

    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl FromIterator<String> for Selection {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self::from_keys(iter)
    }
}
