use crate::support::{print_json_or_exit, yes_no};
use fixit_field::{FieldView, SinkEvent, load_scenario, run_scenario};
use tracing::debug;

fn print_view(view: &FieldView) {
    println!(
        "[field] {} -> {} ({})",
        view.field_id,
        view.target_key,
        if view.locked { "locked" } else { "active" }
    );
    println!("  selection: [{}]", view.selection.keys().join(", "));
    println!("  display: {}", view.display_text);
    println!(
        "  required={} disabled={} hidden={} touched={}",
        yes_no(view.flags.required),
        yes_no(view.flags.disabled),
        yes_no(view.flags.hidden),
        yes_no(view.touched)
    );
    if let Some(error) = &view.error {
        println!("  error: {error}");
    }
}

fn print_sink(events: &[SinkEvent]) {
    if events.is_empty() {
        return;
    }
    println!("  sink:");
    for event in events {
        match event {
            SinkEvent::Register { field_id } => println!("    - register {field_id}"),
            SinkEvent::Commit { target_key, value } => {
                println!("    - commit {target_key} = {}", value.to_json())
            }
            SinkEvent::Error {
                target_key,
                message: Some(message),
            } => println!("    - error {target_key}: {message}"),
            SinkEvent::Error {
                target_key,
                message: None,
            } => println!("    - clear {target_key}"),
        }
    }
}

pub fn run(scenario_path: String, json_output: bool) {
    let scenario = load_scenario(&scenario_path).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });
    debug!(
        path = %scenario_path,
        events = scenario.events.len(),
        "replaying scenario"
    );
    let outcome = run_scenario(&scenario);

    if json_output {
        print_json_or_exit(&outcome, "reconcile");
    } else {
        print_view(&outcome.view);
        print_sink(&outcome.sink);
    }
}
