use crate::support::{load_workflow_or_exit, print_json_or_exit, read_json_file_or_exit, yes_no};
use fixit_field::{DropdownField, FieldContext, FieldView, FormMode, Record, RecordingSink};
use fixit_workflow::{FieldState, RenderedNotification, RouteDecision, Workflow, field_states};
use serde::Serialize;

pub struct Args {
    pub workflow: String,
    pub record: String,
    pub status: Option<String>,
    pub trigger: Option<String>,
    pub json: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EvalPayload {
    workflow_id: String,
    fields: Vec<FieldState>,
    views: Vec<FieldView>,
    route: Option<RouteDecision>,
    status: Option<String>,
    notifications: Vec<RenderedNotification>,
}

/// Mount every dropdown field against the record as the edit form would.
fn reconcile_views(workflow: &Workflow, record: &Record, states: &[FieldState]) -> Vec<FieldView> {
    let mut sink = RecordingSink::new();
    workflow
        .fields
        .iter()
        .zip(states)
        .filter_map(|(def, state)| {
            let config = def.field_config()?;
            let mut field = DropdownField::new(config);
            let ctx = state.field_inputs(
                FieldContext::new(&def.options, FormMode::Edit).with_record(record),
            );
            field.reconcile(&ctx, &mut sink);
            Some(field.view())
        })
        .collect()
}

fn print_payload(payload: &EvalPayload) {
    println!("[workflow-eval] {}", payload.workflow_id);
    println!("  fields:");
    for state in &payload.fields {
        println!(
            "    - {} visible={} required={}",
            state.field_id,
            yes_no(state.visible),
            yes_no(state.required)
        );
    }
    match &payload.route {
        Some(route) => println!(
            "  route: {} -> {}{}",
            route.assignee_role,
            route.status,
            if route.fallback { " (fallback)" } else { "" }
        ),
        None => println!("  route: none"),
    }
    for notification in &payload.notifications {
        println!(
            "  notify [{} / {}] to={} cc={}",
            notification.status,
            notification.trigger,
            notification.to.join("; "),
            notification.cc.join("; ")
        );
        println!("    subject: {}", notification.subject);
        if !notification.missing.is_empty() {
            println!("    missing: {}", notification.missing.join(", "));
        }
    }
}

pub fn run(args: Args) {
    let workflow = load_workflow_or_exit(&args.workflow);
    let record: Record = read_json_file_or_exit(&args.record, "record");

    let fields = field_states(&workflow, &record);
    let views = reconcile_views(&workflow, &record, &fields);
    let route = workflow.route_record(&record);
    let status = args
        .status
        .or_else(|| route.as_ref().map(|decision| decision.status.clone()));
    let notifications = match &status {
        Some(status) => {
            workflow.render_notifications(status, args.trigger.as_deref(), &record)
        }
        None => Vec::new(),
    };

    let payload = EvalPayload {
        workflow_id: workflow.id.clone(),
        fields,
        views,
        route,
        status,
        notifications,
    };
    if args.json {
        print_json_or_exit(&payload, "workflow-eval");
    } else {
        print_payload(&payload);
    }
}
