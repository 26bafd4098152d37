use crate::support::{load_workflow_or_exit, print_json_or_exit};
use fixit_workflow::{WorkflowCheckReport, check_workflow};

fn print_report(report: &WorkflowCheckReport) {
    println!(
        "[workflow-check] {} {} (issues={}, digest={})",
        if report.accepted() { "OK" } else { "FAIL" },
        report.workflow_id,
        report.issues.len(),
        report.digest
    );
    for issue in &report.issues {
        println!(
            "  - {} {} ({})",
            issue.path, issue.failure_class, issue.message
        );
    }
}

pub fn run(workflow_path: String, json_output: bool) {
    let workflow = load_workflow_or_exit(&workflow_path);
    let report = check_workflow(&workflow).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });

    if json_output {
        print_json_or_exit(&report, "workflow-check");
    } else {
        print_report(&report);
    }

    if !report.accepted() {
        std::process::exit(2);
    }
}
