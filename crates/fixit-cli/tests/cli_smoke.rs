use serde_json::{Value, json};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "fixit-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn write_json(&self, name: &str, value: &Value) -> PathBuf {
        let path = self.path.join(name);
        let text = serde_json::to_string_pretty(value).expect("fixture should serialize");
        fs::write(&path, text).expect("fixture should be written");
        path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_fixit<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_fixit");
    Command::new(bin)
        .args(args)
        .output()
        .expect("fixit command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout should be JSON: {e}\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        )
    })
}

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn lets_fix_it() -> PathBuf {
    workspace_root().join("workflows/lets-fix-it.json")
}

fn field_fixture(name: &str) -> PathBuf {
    workspace_root()
        .join("crates/fixit-field/tests/fixtures")
        .join(name)
}

#[test]
fn reconcile_json_matches_field_fixture() {
    let dir = field_fixture("lookup_single_commit");
    let case = dir.join("case.json");
    let output = run_fixit([OsStr::new("reconcile"), case.as_os_str(), OsStr::new("--json")]);
    assert_success(&output);

    let expected: Value = serde_json::from_str(
        &fs::read_to_string(dir.join("expect.json")).expect("expect.json should be readable"),
    )
    .expect("expect.json should parse");
    assert_eq!(parse_json_stdout(&output), expected);
}

#[test]
fn reconcile_text_lists_sink_events() {
    let tmp = TempDirGuard::new("reconcile-text");
    let scenario = tmp.write_json(
        "scenario.json",
        &json!({
            "field": {"fieldId": "IssueType", "multi": true, "required": true},
            "context": {
                "mode": "create",
                "options": [{"key": "Leak", "text": "Leak"}, {"key": "Power", "text": "Power"}]
            },
            "events": [
                {"kind": "blur"},
                {"kind": "toggle", "key": "Power", "selected": true},
                {"kind": "blur"}
            ]
        }),
    );

    let output = run_fixit([OsStr::new("reconcile"), scenario.as_os_str()]);
    assert_success(&output);
    let text = stdout_text(&output);
    assert!(text.contains("[field] IssueType -> IssueType (active)"), "{text}");
    assert!(text.contains("error IssueType: You can't leave this blank."), "{text}");
    assert!(text.contains(r#"commit IssueType = ["Power"]"#), "{text}");
}

#[test]
fn reconcile_missing_scenario_exits_one() {
    let tmp = TempDirGuard::new("reconcile-missing");
    let missing = tmp.path().join("nope.json");
    let output = run_fixit([OsStr::new("reconcile"), missing.as_os_str()]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn bundled_workflow_passes_check() {
    let output = run_fixit([
        OsStr::new("workflow-check"),
        lets_fix_it().as_os_str(),
        OsStr::new("--json"),
    ]);
    assert_success(&output);
    let report = parse_json_stdout(&output);
    assert_eq!(report["result"], "accepted");
    assert_eq!(report["workflowId"], "lets-fix-it");
    assert_eq!(report["digest"].as_str().map(str::len), Some(64));
}

#[test]
fn broken_workflow_check_exits_two() {
    let tmp = TempDirGuard::new("workflow-broken");
    let workflow = tmp.write_json(
        "workflow.json",
        &json!({
            "id": "broken",
            "title": "Broken",
            "statuses": ["New"],
            "fields": [{"id": "IssueType", "options": [{"key": "Leak", "text": "Leak"}]}],
            "routing": [{"issueTypes": ["Leak"], "assigneeRole": "Plumbing", "status": "Assigned"}]
        }),
    );

    let output = run_fixit([
        OsStr::new("workflow-check"),
        workflow.as_os_str(),
        OsStr::new("--json"),
    ]);
    assert_eq!(output.status.code(), Some(2));
    let report = parse_json_stdout(&output);
    assert_eq!(report["result"], "rejected");
    assert_eq!(report["failureClasses"], json!(["workflow.status.unknown"]));

    let text = stdout_text(&run_fixit([
        OsStr::new("workflow-check"),
        workflow.as_os_str(),
    ]));
    assert!(text.contains("[workflow-check] FAIL broken"), "{text}");
    assert!(text.contains("routing[0].status"), "{text}");
}

#[test]
fn workflow_eval_routes_and_renders() {
    let tmp = TempDirGuard::new("workflow-eval");
    let record = tmp.write_json(
        "record.json",
        &json!({
            "ID": 7,
            "Title": "Burst pipe",
            "Building": {"Id": 12, "Title": "HQ"},
            "BuildingLookupId": 12,
            "Floor": "2",
            "Room": "2.14",
            "IssueType": ["Leak"],
            "Urgent": "Yes",
            "ReporterEmail": "kim@example.org",
            "AssigneeEmail": "plumbing@example.org"
        }),
    );

    let output = run_fixit([
        OsStr::new("workflow-eval"),
        lets_fix_it().as_os_str(),
        OsStr::new("--record"),
        record.as_os_str(),
        OsStr::new("--trigger"),
        OsStr::new("enter"),
        OsStr::new("--json"),
    ]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);

    assert_eq!(payload["route"]["assigneeRole"], "Plumbing");
    assert_eq!(payload["status"], "Assigned");

    let fields = payload["fields"].as_array().expect("fields array");
    let leak = fields
        .iter()
        .find(|state| state["fieldId"] == "LeakSource")
        .expect("LeakSource state");
    assert_eq!(leak["visible"], true);
    assert_eq!(leak["required"], true);
    let phone = fields
        .iter()
        .find(|state| state["fieldId"] == "Phone")
        .expect("Phone state");
    assert_eq!(phone["required"], true);

    let views = payload["views"].as_array().expect("views array");
    assert_eq!(views.len(), 5);
    let issue_view = views
        .iter()
        .find(|view| view["fieldId"] == "IssueType")
        .expect("IssueType view");
    assert_eq!(issue_view["selection"], json!(["Leak"]));
    assert_eq!(issue_view["displayText"], "Leak or water damage");

    let notifications = payload["notifications"].as_array().expect("notifications");
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["subject"], "[7] Assigned to you: Burst pipe");
    assert_eq!(notifications[0]["to"], json!(["plumbing@example.org"]));
    assert_eq!(notifications[0]["missing"], json!(["Phone"]));
}

#[test]
fn workflow_eval_falls_back_to_triage() {
    let tmp = TempDirGuard::new("workflow-eval-fallback");
    let record = tmp.write_json(
        "record.json",
        &json!({"ID": 8, "Title": "Wobbly chair", "IssueType": "Furniture"}),
    );

    let output = run_fixit([
        OsStr::new("workflow-eval"),
        lets_fix_it().as_os_str(),
        OsStr::new("--record"),
        record.as_os_str(),
    ]);
    assert_success(&output);
    let text = stdout_text(&output);
    assert!(text.contains("route: Facilities Desk -> Triage (fallback)"), "{text}");
    assert!(text.contains("notify [Triage / enter] to=facilities-desk@example.org"), "{text}");
}
