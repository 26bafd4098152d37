//! # fixit-workflow
//!
//! The "Let's Fix It" intake workflow as a typed document:
//! - `Workflow` and its steps, fields, routing and notification tables
//! - conditional visibility / requiredness evaluated against a record
//! - status routing from the selected issue types
//! - `{{placeholder}}` rendering of notification templates
//! - structural checks with a stable document digest
//!
//! Field conditions reuse the dropdown normalizer from `fixit-field`, so a
//! rule sees the same keys a field would render. Delivering mail is left to
//! the caller.

pub mod check;
pub mod error;
pub mod model;
pub mod notify;
pub mod routing;
pub mod rules;

pub use check::{
    FAILURE_CLASS_DUPLICATE_FIELD, FAILURE_CLASS_DUPLICATE_OPTION,
    FAILURE_CLASS_EMPTY_CONDITION, FAILURE_CLASS_UNKNOWN_FIELD, FAILURE_CLASS_UNKNOWN_OPTION,
    FAILURE_CLASS_UNKNOWN_PLACEHOLDER, FAILURE_CLASS_UNKNOWN_STATUS, WORKFLOW_CHECK_KIND,
    WorkflowCheckReport, WorkflowIssue, check_workflow, workflow_digest,
};
pub use error::WorkflowError;
pub use model::{
    Condition, FieldDef, FieldKind, NotificationRule, RoutingRule, StepDef, Workflow,
    load_workflow,
};
pub use notify::{RenderedNotification, placeholders, template_value, template_vars};
pub use routing::RouteDecision;
pub use rules::{FieldState, field_states};
