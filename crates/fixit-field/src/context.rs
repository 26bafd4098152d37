//! Per-evaluation context and output sinks.
//!
//! A field never reaches for ambient state. Everything it reads arrives as a
//! read-only snapshot in [`FieldContext`]; everything it writes leaves through
//! a [`FormSink`].

use crate::commit::CommitValue;
use crate::key::FieldOption;
use crate::mode::FormMode;
use crate::policy::{PermissionLookup, PermissionTables, Unrestricted};
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;

/// Sparse record snapshot: field id (or `<id>LookupId`) to raw value.
pub type Record = serde_json::Map<String, Value>;

static EMPTY_RECORD: LazyLock<Record> = LazyLock::new(Record::new);
static EMPTY_TABLES: PermissionTables = PermissionTables::EMPTY;
static UNRESTRICTED: Unrestricted = Unrestricted;

/// Everything one reconciliation reads.
#[derive(Clone, Copy)]
pub struct FieldContext<'a> {
    pub options: &'a [FieldOption],
    pub record: &'a Record,
    pub mode: FormMode,
    pub permissions: &'a dyn PermissionLookup,
    pub tables: &'a PermissionTables,
    pub submission_in_flight: bool,
    /// Externally computed visibility; `Some(true)` hides the field.
    pub is_hidden: Option<bool>,
    /// Externally computed requiredness; overrides the configured flag.
    pub is_required: Option<bool>,
}

impl<'a> FieldContext<'a> {
    pub fn new(options: &'a [FieldOption], mode: FormMode) -> Self {
        Self {
            options,
            record: &*EMPTY_RECORD,
            mode,
            permissions: &UNRESTRICTED,
            tables: &EMPTY_TABLES,
            submission_in_flight: false,
            is_hidden: None,
            is_required: None,
        }
    }

    pub fn with_record(mut self, record: &'a Record) -> Self {
        self.record = record;
        self
    }

    pub fn with_permissions(
        mut self,
        permissions: &'a dyn PermissionLookup,
        tables: &'a PermissionTables,
    ) -> Self {
        self.permissions = permissions;
        self.tables = tables;
        self
    }

    pub fn submitting(mut self, in_flight: bool) -> Self {
        self.submission_in_flight = in_flight;
        self
    }

    pub fn with_hidden(mut self, hidden: Option<bool>) -> Self {
        self.is_hidden = hidden;
        self
    }

    pub fn with_required(mut self, required: Option<bool>) -> Self {
        self.is_required = required;
        self
    }
}

impl std::fmt::Debug for FieldContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldContext")
            .field("options", &self.options.len())
            .field("record_keys", &self.record.len())
            .field("mode", &self.mode)
            .field("submission_in_flight", &self.submission_in_flight)
            .field("is_hidden", &self.is_hidden)
            .field("is_required", &self.is_required)
            .finish_non_exhaustive()
    }
}

/// The surrounding form: value store, error store and element registry.
pub trait FormSink {
    fn commit(&mut self, target_key: &str, value: &CommitValue);

    /// `None` clears a previously reported error.
    fn report_error(&mut self, target_key: &str, message: Option<&str>);

    /// Called once per mounted field instance.
    fn register(&mut self, field_id: &str) {
        let _ = field_id;
    }
}

/// One call into a [`FormSink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkEvent {
    #[serde(rename_all = "camelCase")]
    Register { field_id: String },
    #[serde(rename_all = "camelCase")]
    Commit {
        target_key: String,
        value: CommitValue,
    },
    #[serde(rename_all = "camelCase")]
    Error {
        target_key: String,
        message: Option<String>,
    },
}

/// A sink that records every call in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent committed value for `target_key`.
    pub fn last_commit(&self, target_key: &str) -> Option<&CommitValue> {
        self.events.iter().rev().find_map(|event| match event {
            SinkEvent::Commit {
                target_key: key,
                value,
            } if key == target_key => Some(value),
            _ => None,
        })
    }

    /// The most recent error state reported for `target_key`.
    pub fn last_error(&self, target_key: &str) -> Option<Option<&str>> {
        self.events.iter().rev().find_map(|event| match event {
            SinkEvent::Error {
                target_key: key,
                message,
            } if key == target_key => Some(message.as_deref()),
            _ => None,
        })
    }
}

impl FormSink for RecordingSink {
    fn commit(&mut self, target_key: &str, value: &CommitValue) {
        self.events.push(SinkEvent::Commit {
            target_key: target_key.to_string(),
            value: value.clone(),
        });
    }

    fn report_error(&mut self, target_key: &str, message: Option<&str>) {
        self.events.push(SinkEvent::Error {
            target_key: target_key.to_string(),
            message: message.map(str::to_string),
        });
    }

    fn register(&mut self, field_id: &str) {
        self.events.push(SinkEvent::Register {
            field_id: field_id.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::LookupId;

    #[test]
    fn recording_sink_tracks_latest_state() {
        let mut sink = RecordingSink::new();
        sink.register("Building");
        sink.commit("BuildingId", &CommitValue::Id(LookupId::from(3)));
        sink.report_error("BuildingId", Some("bad"));
        sink.commit("BuildingId", &CommitValue::Null);
        sink.report_error("BuildingId", None);

        assert_eq!(sink.last_commit("BuildingId"), Some(&CommitValue::Null));
        assert_eq!(sink.last_error("BuildingId"), Some(None));
        assert_eq!(sink.last_commit("Other"), None);
        assert_eq!(sink.events.len(), 5);
    }

    #[test]
    fn default_context_is_unrestricted() {
        let options = [FieldOption::new("A", "Alpha")];
        let ctx = FieldContext::new(&options, FormMode::Edit);
        assert!(ctx.record.is_empty());
        assert!(!ctx.submission_in_flight);
        assert_eq!(ctx.is_hidden, None);
    }
}
