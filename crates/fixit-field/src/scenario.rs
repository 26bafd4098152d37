//! Replayable field scenarios.
//!
//! A scenario is a field config, an initial context snapshot and an ordered
//! list of notifications. Replaying it drives one [`DropdownField`] exactly
//! the way a host form would and reports the final view plus every sink call.
//!
//! ```json
//! {
//!   "field": { "fieldId": "Category", "required": true },
//!   "context": { "mode": "edit", "options": [{ "key": "A", "text": "Alpha" }] },
//!   "events": [{ "kind": "select", "value": "A" }, { "kind": "blur" }]
//! }
//! ```

use crate::config::FieldConfig;
use crate::context::{FieldContext, Record, RecordingSink, SinkEvent};
use crate::error::FieldError;
use crate::field::{DropdownField, FieldView};
use crate::key::FieldOption;
use crate::mode::FormMode;
use crate::policy::{PermissionCandidate, PermissionTables};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Owned context inputs for one reconciliation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnapshot {
    #[serde(default)]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub record: Record,
    #[serde(default)]
    pub mode: FormMode,
    /// Fixed permission output for this field.
    #[serde(default)]
    pub permissions: Vec<PermissionCandidate>,
    #[serde(default)]
    pub tables: PermissionTables,
    #[serde(default)]
    pub submission_in_flight: bool,
    #[serde(default)]
    pub is_hidden: Option<bool>,
    #[serde(default)]
    pub is_required: Option<bool>,
}

impl ContextSnapshot {
    pub fn as_context(&self) -> FieldContext<'_> {
        FieldContext::new(&self.options, self.mode)
            .with_record(&self.record)
            .with_permissions(&self.permissions, &self.tables)
            .submitting(self.submission_in_flight)
            .with_hidden(self.is_hidden)
            .with_required(self.is_required)
    }

    fn apply(&mut self, patch: &ContextPatch) {
        if let Some(options) = &patch.options {
            self.options = options.clone();
        }
        if let Some(record) = &patch.record {
            self.record = record.clone();
        }
        if let Some(mode) = patch.mode {
            self.mode = mode;
        }
        if let Some(permissions) = &patch.permissions {
            self.permissions = permissions.clone();
        }
        if let Some(tables) = &patch.tables {
            self.tables = tables.clone();
        }
        if let Some(in_flight) = patch.submission_in_flight {
            self.submission_in_flight = in_flight;
        }
        if let Some(hidden) = patch.is_hidden {
            self.is_hidden = Some(hidden);
        }
        if let Some(required) = patch.is_required {
            self.is_required = Some(required);
        }
    }
}

/// Partial context update; absent members keep their previous value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextPatch {
    pub options: Option<Vec<FieldOption>>,
    pub record: Option<Record>,
    pub mode: Option<FormMode>,
    pub permissions: Option<Vec<PermissionCandidate>>,
    pub tables: Option<PermissionTables>,
    pub submission_in_flight: Option<bool>,
    pub is_hidden: Option<bool>,
    pub is_required: Option<bool>,
}

/// One external notification.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioEvent {
    /// Context changed; triggers a reconciliation.
    Context(ContextPatch),
    /// User replaced the selection.
    Select { value: Value },
    /// User toggled one option.
    Toggle { key: String, selected: bool },
    /// Field lost focus; triggers a commit.
    Blur,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub field: FieldConfig,
    #[serde(default)]
    pub context: ContextSnapshot,
    #[serde(default)]
    pub events: Vec<ScenarioEvent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub view: FieldView,
    pub sink: Vec<SinkEvent>,
}

/// Read a scenario from a JSON file.
pub fn load_scenario(path: impl AsRef<Path>) -> Result<Scenario, FieldError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| FieldError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| FieldError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Mount a fresh field and replay every event in order.
pub fn run_scenario(scenario: &Scenario) -> ScenarioOutcome {
    let mut context = scenario.context.clone();
    let mut field = DropdownField::new(scenario.field.clone());
    let mut sink = RecordingSink::new();

    field.reconcile(&context.as_context(), &mut sink);
    for event in &scenario.events {
        match event {
            ScenarioEvent::Context(patch) => {
                context.apply(patch);
                field.reconcile(&context.as_context(), &mut sink);
            }
            ScenarioEvent::Select { value } => field.select(value),
            ScenarioEvent::Toggle { key, selected } => field.toggle(key, *selected),
            ScenarioEvent::Blur => {
                field.blur(&mut sink);
            }
        }
    }

    ScenarioOutcome {
        view: field.view(),
        sink: sink.events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_scenario() {
        let scenario: Scenario = serde_json::from_str(r#"{"field":{"fieldId":"Category"}}"#)
            .expect("scenario should parse");
        assert!(scenario.events.is_empty());
        assert_eq!(scenario.context.mode, FormMode::Edit);

        let outcome = run_scenario(&scenario);
        assert!(outcome.view.selection.is_empty());
        assert_eq!(outcome.sink.len(), 1);
    }

    #[test]
    fn context_patch_keeps_unmentioned_inputs() {
        let scenario: Scenario = serde_json::from_str(
            r#"{
                "field": {"fieldId": "Category"},
                "context": {
                    "mode": "edit",
                    "options": [{"key": "A", "text": "Alpha"}],
                    "record": {"Category": "A"}
                },
                "events": [{"kind": "context", "submissionInFlight": true}]
            }"#,
        )
        .expect("scenario should parse");

        let outcome = run_scenario(&scenario);
        assert_eq!(outcome.view.selection.keys(), ["A"]);
        assert!(outcome.view.flags.disabled);
        assert!(!outcome.view.locked);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_scenario("/nonexistent/scenario.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/scenario.json"));
    }
}
