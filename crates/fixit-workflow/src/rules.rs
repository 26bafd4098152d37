//! Conditional visibility and requiredness.

use crate::model::{FieldDef, Workflow};
use fixit_field::{FieldContext, Record};
use serde::Serialize;
use tracing::trace;

/// Visibility and requiredness of one field for a given record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldState {
    pub field_id: String,
    pub visible: bool,
    pub required: bool,
}

impl FieldState {
    /// Evaluate `field` against `record`. Hidden fields are never required.
    pub fn evaluate(field: &FieldDef, record: &Record) -> Self {
        let visible = field
            .visible_when
            .as_ref()
            .is_none_or(|condition| condition.holds(record));
        let required = visible
            && (field.required
                || field
                    .required_when
                    .as_ref()
                    .is_some_and(|condition| condition.holds(record))
                || field
                    .required_when_any
                    .iter()
                    .any(|condition| condition.holds(record)));
        trace!(field_id = %field.id, visible, required, "evaluated field rules");
        Self {
            field_id: field.id.clone(),
            visible,
            required,
        }
    }

    /// Push this state into a reconciler context as external overrides.
    pub fn field_inputs<'a>(&self, ctx: FieldContext<'a>) -> FieldContext<'a> {
        ctx.with_hidden(Some(!self.visible))
            .with_required(Some(self.required))
    }
}

/// Evaluate every field of `workflow` against `record`, in declaration order.
pub fn field_states(workflow: &Workflow, record: &Record) -> Vec<FieldState> {
    workflow
        .fields
        .iter()
        .map(|field| FieldState::evaluate(field, record))
        .collect()
}
