//! Static field configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a field behaves when its context is re-evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResyncPolicy {
    /// Clear the validation error and the touched flag on every
    /// context re-evaluation.
    #[serde(default = "default_clear_error_on_resync")]
    pub clear_error_on_resync: bool,
}

fn default_clear_error_on_resync() -> bool {
    true
}

impl Default for ResyncPolicy {
    fn default() -> Self {
        Self {
            clear_error_on_resync: default_clear_error_on_resync(),
        }
    }
}

/// Configuration of one dropdown field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    /// Internal column name; commit and record keys derive from it.
    pub field_id: String,
    /// Label used for permission lookups. Falls back to `field_id`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    /// Values reference other records by numeric id.
    #[serde(default)]
    pub lookup: bool,
    #[serde(default)]
    pub multi: bool,
    #[serde(default)]
    pub required: bool,
    /// Seed for create mode, in any raw record shape.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub starter_value: Value,
    #[serde(default)]
    pub resync: ResyncPolicy,
}

impl FieldConfig {
    pub fn new(field_id: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            label: String::new(),
            lookup: false,
            multi: false,
            required: false,
            starter_value: Value::Null,
            resync: ResyncPolicy::default(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn lookup(mut self) -> Self {
        self.lookup = true;
        self
    }

    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_starter_value(mut self, value: impl Into<Value>) -> Self {
        self.starter_value = value.into();
        self
    }

    pub fn with_resync(mut self, resync: ResyncPolicy) -> Self {
        self.resync = resync;
        self
    }

    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.field_id
        } else {
            &self.label
        }
    }

    /// Record key holding the single-lookup id.
    pub fn lookup_id_key(&self) -> String {
        format!("{}LookupId", self.field_id)
    }
}
