//! Record value normalization and clamping.
//!
//! Upstream stores hand back a field's value in several shapes: a scalar, a
//! `;`-delimited string, a list of scalars, a list of relation objects, or a
//! REST-style `{ "results": [...] }` wrapper. [`normalize`] folds all of them
//! into one [`Selection`]; [`clamp`] then restricts it to the live options.
//!
//! Neither function fails. Shapes that match nothing degrade to a
//! single-element selection, which clamping usually empties.

use crate::key::{FieldOption, Selection, option_keys, to_key};
use serde_json::Value;

/// Convert a raw record value into canonical keys.
pub fn normalize(raw: &Value) -> Selection {
    match raw {
        Value::Null => Selection::new(),
        Value::Object(map) => match map.get("results") {
            Some(Value::Array(results)) => normalize_list(results),
            _ => Selection::from_keys([relation_key(raw)]),
        },
        Value::Array(items) => normalize_list(items),
        Value::String(text) if text.contains(';') => text
            .split(';')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect(),
        other => Selection::from_keys([to_key(other)]),
    }
}

/// The shape of a list is decided by its first element.
fn normalize_list(items: &[Value]) -> Selection {
    match items.first() {
        Some(Value::Object(_)) => items.iter().map(relation_key).collect(),
        _ => items.iter().map(to_key).collect(),
    }
}

/// `LookupId`, then `Id`, then the value itself.
fn relation_key(item: &Value) -> String {
    let id = item
        .get("LookupId")
        .filter(|v| !v.is_null())
        .or_else(|| item.get("Id").filter(|v| !v.is_null()))
        .unwrap_or(item);
    to_key(id)
}

/// Keep only keys present in `options`, preserving selection order.
pub fn clamp(selection: &Selection, options: &[FieldOption]) -> Selection {
    let known = option_keys(options);
    selection
        .iter()
        .filter(|key| known.contains(*key))
        .map(str::to_string)
        .collect()
}

/// [`normalize`] followed by [`clamp`].
pub fn normalize_clamped(raw: &Value, options: &[FieldOption]) -> Selection {
    clamp(&normalize(raw), options)
}
