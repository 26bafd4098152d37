//! Structural checks over a workflow document.

use crate::error::WorkflowError;
use crate::model::{Condition, FieldDef, Workflow};
use crate::notify::placeholders;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

pub const WORKFLOW_CHECK_KIND: &str = "fixit.workflow.check.v1";

pub const FAILURE_CLASS_DUPLICATE_FIELD: &str = "workflow.field.duplicate";
pub const FAILURE_CLASS_DUPLICATE_OPTION: &str = "workflow.option.duplicate";
pub const FAILURE_CLASS_EMPTY_CONDITION: &str = "workflow.condition.empty";
pub const FAILURE_CLASS_UNKNOWN_FIELD: &str = "workflow.field.unknown";
pub const FAILURE_CLASS_UNKNOWN_OPTION: &str = "workflow.option.unknown";
pub const FAILURE_CLASS_UNKNOWN_PLACEHOLDER: &str = "workflow.placeholder.unknown";
pub const FAILURE_CLASS_UNKNOWN_STATUS: &str = "workflow.status.unknown";

/// Columns every ticket carries regardless of the declared fields.
const BUILTIN_COLUMNS: &[&str] = &["ID", "Title", "Status", "Created", "Modified", "Author"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowIssue {
    pub failure_class: String,
    /// JSON-pointer-ish location, e.g. `fields[2].visibleWhen`.
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowCheckReport {
    pub check_kind: String,
    pub workflow_id: String,
    pub result: String,
    pub digest: String,
    pub failure_classes: Vec<String>,
    pub issues: Vec<WorkflowIssue>,
}

impl WorkflowCheckReport {
    pub fn accepted(&self) -> bool {
        self.result == "accepted"
    }
}

/// SHA-256 over the document's canonical JSON (sorted keys, compact).
pub fn workflow_digest(workflow: &Workflow) -> Result<String, WorkflowError> {
    // serde_json's default map is ordered, so to_value sorts keys.
    let canonical = serde_json::to_string(&serde_json::to_value(workflow)?)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

struct Checker<'a> {
    workflow: &'a Workflow,
    field_ids: HashSet<&'a str>,
    issues: Vec<WorkflowIssue>,
}

impl<'a> Checker<'a> {
    fn new(workflow: &'a Workflow) -> Self {
        Self {
            workflow,
            field_ids: workflow.fields.iter().map(|f| f.id.as_str()).collect(),
            issues: Vec::new(),
        }
    }

    fn push(&mut self, failure_class: &str, path: String, message: String) {
        self.issues.push(WorkflowIssue {
            failure_class: failure_class.to_string(),
            path,
            message,
        });
    }

    fn knows_column(&self, name: &str) -> bool {
        self.field_ids.contains(name) || BUILTIN_COLUMNS.contains(&name)
    }

    fn check_fields(&mut self) {
        let workflow = self.workflow;
        let mut seen = HashSet::new();
        for (index, field) in workflow.fields.iter().enumerate() {
            if !seen.insert(field.id.as_str()) {
                self.push(
                    FAILURE_CLASS_DUPLICATE_FIELD,
                    format!("fields[{index}].id"),
                    format!("field id {:?} is declared more than once", field.id),
                );
            }

            let mut keys = HashSet::new();
            for (option_index, option) in field.options.iter().enumerate() {
                let key = option.canonical_key();
                if !keys.insert(key.clone()) {
                    self.push(
                        FAILURE_CLASS_DUPLICATE_OPTION,
                        format!("fields[{index}].options[{option_index}]"),
                        format!("option key {key:?} repeats in field {:?}", field.id),
                    );
                }
            }

            if let Some(condition) = &field.visible_when {
                self.check_condition(condition, format!("fields[{index}].visibleWhen"));
            }
            if let Some(condition) = &field.required_when {
                self.check_condition(condition, format!("fields[{index}].requiredWhen"));
            }
            for (cond_index, condition) in field.required_when_any.iter().enumerate() {
                self.check_condition(
                    condition,
                    format!("fields[{index}].requiredWhenAny[{cond_index}]"),
                );
            }
        }
    }

    fn check_condition(&mut self, condition: &Condition, path: String) {
        if condition.is_empty() {
            self.push(
                FAILURE_CLASS_EMPTY_CONDITION,
                path.clone(),
                format!("condition on {:?} has neither equals nor in", condition.field),
            );
        }
        let workflow = self.workflow;
        let Some(target) = workflow.field(&condition.field) else {
            self.push(
                FAILURE_CLASS_UNKNOWN_FIELD,
                format!("{path}.field"),
                format!("condition references unknown field {:?}", condition.field),
            );
            return;
        };
        let unknown: Vec<String> = condition
            .expected_values()
            .map(fixit_field::to_key)
            .filter(|key| !option_declared(target, key))
            .collect();
        for key in unknown {
            self.push(
                FAILURE_CLASS_UNKNOWN_OPTION,
                path.clone(),
                format!("{key:?} is not an option of field {:?}", target.id),
            );
        }
    }

    fn check_steps(&mut self) {
        let workflow = self.workflow;
        for (index, step) in workflow.steps.iter().enumerate() {
            for (field_index, field_id) in step.fields.iter().enumerate() {
                if !self.field_ids.contains(field_id.as_str()) {
                    self.push(
                        FAILURE_CLASS_UNKNOWN_FIELD,
                        format!("steps[{index}].fields[{field_index}]"),
                        format!("step {:?} lists unknown field {field_id:?}", step.id),
                    );
                }
            }
        }
    }

    fn check_routing(&mut self) {
        let workflow = self.workflow;
        let routing_field = workflow.field(&workflow.routing_field);
        if routing_field.is_none() && !workflow.routing.is_empty() {
            self.push(
                FAILURE_CLASS_UNKNOWN_FIELD,
                "routingField".to_string(),
                format!("routing field {:?} is not declared", workflow.routing_field),
            );
        }
        for (index, rule) in workflow.routing.iter().enumerate() {
            if !workflow.has_status(&rule.status) {
                self.push(
                    FAILURE_CLASS_UNKNOWN_STATUS,
                    format!("routing[{index}].status"),
                    format!("status {:?} is not declared", rule.status),
                );
            }
            let Some(field) = routing_field else {
                continue;
            };
            for (issue_index, issue) in rule.issue_types.iter().enumerate() {
                if !option_declared(field, issue) {
                    self.push(
                        FAILURE_CLASS_UNKNOWN_OPTION,
                        format!("routing[{index}].issueTypes[{issue_index}]"),
                        format!("{issue:?} is not an option of field {:?}", field.id),
                    );
                }
            }
        }
    }

    fn check_notifications(&mut self) {
        let workflow = self.workflow;
        for (index, rule) in workflow.notifications.iter().enumerate() {
            if !workflow.has_status(&rule.status) {
                self.push(
                    FAILURE_CLASS_UNKNOWN_STATUS,
                    format!("notifications[{index}].status"),
                    format!("status {:?} is not declared", rule.status),
                );
            }
            let unknown: BTreeSet<String> = rule
                .templates()
                .flat_map(placeholders)
                .filter(|name| !self.knows_column(name))
                .collect();
            for name in unknown {
                self.push(
                    FAILURE_CLASS_UNKNOWN_PLACEHOLDER,
                    format!("notifications[{index}]"),
                    format!("placeholder {{{{{name}}}}} names no field"),
                );
            }
        }
    }
}

/// Fields without a declared option list accept any value.
fn option_declared(field: &FieldDef, key: &str) -> bool {
    field.options.is_empty()
        || field
            .options
            .iter()
            .any(|option| option.canonical_key() == key)
}

fn collect_classes(issues: &[WorkflowIssue]) -> Vec<String> {
    issues
        .iter()
        .map(|issue| issue.failure_class.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Run every structural check and stamp the report with the document digest.
pub fn check_workflow(workflow: &Workflow) -> Result<WorkflowCheckReport, WorkflowError> {
    let mut checker = Checker::new(workflow);
    checker.check_fields();
    checker.check_steps();
    checker.check_routing();
    checker.check_notifications();
    let issues = checker.issues;

    let failure_classes = collect_classes(&issues);
    let result = if issues.is_empty() {
        "accepted".to_string()
    } else {
        "rejected".to_string()
    };
    debug!(
        workflow_id = %workflow.id,
        %result,
        issue_count = issues.len(),
        "workflow checked"
    );

    Ok(WorkflowCheckReport {
        check_kind: WORKFLOW_CHECK_KIND.to_string(),
        workflow_id: workflow.id.clone(),
        result,
        digest: workflow_digest(workflow)?,
        failure_classes,
        issues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn workflow(value: Value) -> Workflow {
        serde_json::from_value(value).unwrap()
    }

    fn base() -> Value {
        json!({
            "id": "wf",
            "title": "WF",
            "statuses": ["New", "Assigned"],
            "steps": [{"id": "what", "title": "What", "fields": ["IssueType", "Details"]}],
            "fields": [
                {
                    "id": "IssueType",
                    "multi": true,
                    "options": [{"key": "Leak", "text": "Leak"}, {"key": "Power", "text": "Power"}]
                },
                {"id": "Details", "kind": "note",
                 "visibleWhen": {"field": "IssueType", "equals": "Leak"}}
            ],
            "routing": [
                {"issueTypes": ["Leak"], "assigneeRole": "Plumbing", "status": "Assigned"},
                {"assigneeRole": "Facilities", "status": "New"}
            ],
            "notifications": [
                {"status": "Assigned", "trigger": "enter", "to": ["ops@example.org"],
                 "subject": "[{{ID}}] {{Title}}", "body": "{{IssueType}}: {{Details}}"}
            ]
        })
    }

    fn classes(report: &WorkflowCheckReport) -> Vec<&str> {
        report
            .issues
            .iter()
            .map(|issue| issue.failure_class.as_str())
            .collect()
    }

    #[test]
    fn well_formed_workflow_is_accepted() {
        let report = check_workflow(&workflow(base())).unwrap();
        assert!(report.accepted(), "{:?}", report.issues);
        assert_eq!(report.check_kind, WORKFLOW_CHECK_KIND);
        assert_eq!(report.digest.len(), 64);
    }

    #[test]
    fn duplicates_are_reported() {
        let mut doc = base();
        doc["fields"][0]["options"][1]["key"] = json!("Leak");
        doc["fields"]
            .as_array_mut()
            .unwrap()
            .push(json!({"id": "Details"}));
        let report = check_workflow(&workflow(doc)).unwrap();
        assert!(!report.accepted());
        assert_eq!(
            report.failure_classes,
            vec![FAILURE_CLASS_DUPLICATE_FIELD, FAILURE_CLASS_DUPLICATE_OPTION]
        );
    }

    #[test]
    fn dangling_references_are_reported() {
        let mut doc = base();
        doc["steps"][0]["fields"][1] = json!("Detail");
        doc["fields"][1]["visibleWhen"] = json!({"field": "IssueType", "in": ["Flood"]});
        doc["routing"][0]["status"] = json!("Closed");
        doc["notifications"][0]["body"] = json!("{{Reporter}}");
        let report = check_workflow(&workflow(doc)).unwrap();
        assert_eq!(
            classes(&report),
            vec![
                FAILURE_CLASS_UNKNOWN_OPTION,
                FAILURE_CLASS_UNKNOWN_FIELD,
                FAILURE_CLASS_UNKNOWN_STATUS,
                FAILURE_CLASS_UNKNOWN_PLACEHOLDER,
            ]
        );
        assert_eq!(report.issues[1].path, "steps[0].fields[1]");
    }

    #[test]
    fn empty_condition_and_unknown_routing_option() {
        let mut doc = base();
        doc["fields"][1]["visibleWhen"] = json!({"field": "IssueType"});
        doc["routing"][0]["issueTypes"] = json!(["Leak", "Flood"]);
        let report = check_workflow(&workflow(doc)).unwrap();
        assert_eq!(
            classes(&report),
            vec![FAILURE_CLASS_EMPTY_CONDITION, FAILURE_CLASS_UNKNOWN_OPTION]
        );
        assert_eq!(report.issues[1].path, "routing[0].issueTypes[1]");
    }

    #[test]
    fn digest_ignores_key_order_but_not_content() {
        let a = workflow(base());
        let b: Workflow = serde_json::from_str(&serde_json::to_string(&a).unwrap()).unwrap();
        assert_eq!(workflow_digest(&a).unwrap(), workflow_digest(&b).unwrap());

        let mut changed = base();
        changed["title"] = json!("Other");
        assert_ne!(
            workflow_digest(&a).unwrap(),
            workflow_digest(&workflow(changed)).unwrap()
        );
    }
}
