//! Workflow document model.

use crate::error::WorkflowError;
use fixit_field::{FieldConfig, FieldOption, Record, normalize, to_key};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

fn default_routing_field() -> String {
    "IssueType".to_string()
}

/// A multi-step intake workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub steps: Vec<StepDef>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    /// Declared ticket statuses, in lifecycle order.
    #[serde(default)]
    pub statuses: Vec<String>,
    /// Field whose selection drives routing.
    #[serde(default = "default_routing_field")]
    pub routing_field: String,
    #[serde(default)]
    pub routing: Vec<RoutingRule>,
    #[serde(default)]
    pub notifications: Vec<NotificationRule>,
}

impl Workflow {
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn field(&self, id: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn has_status(&self, status: &str) -> bool {
        self.statuses.iter().any(|s| s == status)
    }

    /// Reconciler configs for every dropdown-backed field.
    pub fn dropdown_configs(&self) -> Vec<FieldConfig> {
        self.fields
            .iter()
            .filter_map(FieldDef::field_config)
            .collect()
    }
}

/// Load a workflow document from a JSON file.
pub fn load_workflow(path: impl AsRef<Path>) -> Result<Workflow, WorkflowError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| WorkflowError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Workflow::from_json_str(&text).map_err(|source| WorkflowError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// One wizard step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDef {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Choice,
    Lookup,
    Text,
    Note,
    User,
}

impl FieldKind {
    /// Whether the field renders as a dropdown.
    pub fn is_dropdown(self) -> bool {
        matches!(self, Self::Choice | Self::Lookup)
    }
}

/// One field of the intake form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub multi: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_when: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_when: Option<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_when_any: Vec<Condition>,
}

impl FieldDef {
    /// Every condition attached to this field.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.visible_when
            .iter()
            .chain(self.required_when.iter())
            .chain(self.required_when_any.iter())
    }

    /// Reconciler config, for dropdown-backed fields only.
    pub fn field_config(&self) -> Option<FieldConfig> {
        if !self.kind.is_dropdown() {
            return None;
        }
        let mut config = FieldConfig::new(&self.id).with_label(&self.label);
        config.lookup = self.kind == FieldKind::Lookup;
        config.multi = self.multi;
        config.required = self.required;
        Some(config)
    }
}

/// `{ field, equals }` or `{ field, in: [...] }` against the current record.
///
/// When both tests are present both must hold. A condition with neither
/// never holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<Value>,
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Value>>,
}

impl Condition {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            equals: Some(value.into()),
            one_of: None,
        }
    }

    pub fn one_of<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            field: field.into(),
            equals: None,
            one_of: Some(values.into_iter().map(Into::into).collect()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_none() && self.one_of.is_none()
    }

    /// Evaluate against `record`; multi-value fields match on any key.
    pub fn holds(&self, record: &Record) -> bool {
        if self.is_empty() {
            return false;
        }
        let keys = normalize(record.get(&self.field).unwrap_or(&Value::Null));
        let equals_ok = self
            .equals
            .as_ref()
            .is_none_or(|expected| keys.contains(&to_key(expected)));
        let in_ok = self.one_of.as_ref().is_none_or(|candidates| {
            candidates
                .iter()
                .any(|candidate| keys.contains(&to_key(candidate)))
        });
        equals_ok && in_ok
    }

    /// Values this condition compares against.
    pub fn expected_values(&self) -> impl Iterator<Item = &Value> {
        self.equals
            .iter()
            .chain(self.one_of.iter().flat_map(|values| values.iter()))
    }
}

/// Issue-type set to assignee role and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingRule {
    /// Empty means fallback rule.
    #[serde(default)]
    pub issue_types: Vec<String>,
    pub assignee_role: String,
    pub status: String,
}

impl RoutingRule {
    pub fn is_fallback(&self) -> bool {
        self.issue_types.is_empty()
    }
}

/// `(status, trigger)` to a templated email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRule {
    pub status: String,
    pub trigger: String,
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    pub subject: String,
    pub body: String,
}
