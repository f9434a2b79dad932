//! Integration tests for the `slate` CLI.
//!
//! Each test creates a temp directory, runs `slate` as a subprocess,
//! and verifies stdout, stderr, and/or the store on disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;

/// Get the path to the built `slate` binary.
fn slate_bin() -> PathBuf {
    // cargo test builds to target/debug/
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("slate");
    path
}

/// Run `slate` with args in the given directory. Returns (stdout, stderr, success).
fn run_slate(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(slate_bin())
        .args(args)
        .current_dir(dir)
        .env_remove("SLATE_LOG")
        .output()
        .expect("failed to run slate");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `slate` expecting success, return stdout.
fn run_slate_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_slate(dir, args);
    if !success {
        panic!(
            "slate {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let mut full = args.to_vec();
    full.push("--json");
    let out = run_slate_ok(dir, &full);
    serde_json::from_str(&out).unwrap_or_else(|e| panic!("bad JSON from {:?}: {}\n{}", args, e, out))
}

/// Create an initialized store in a fresh temp dir.
fn init_store() -> tempfile::TempDir {
    let tmp = tempfile::TempDir::new().unwrap();
    run_slate_ok(tmp.path(), &["init"]);
    tmp
}

/// Add a todo and return its id.
fn add(dir: &Path, line: &str) -> String {
    run_slate_ok(dir, &["add", line]).trim().to_string()
}

fn descriptions(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|t| t["description"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

#[test]
fn test_init_creates_store() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_slate_ok(tmp.path(), &["init", "--default-filter", "active"]);
    assert!(out.contains("Initialized slate store"));

    let config = fs::read_to_string(tmp.path().join(".slate/config.toml")).unwrap();
    assert!(config.contains("default_filter = \"active\""));
}

#[test]
fn test_init_twice_fails_without_force() {
    let tmp = init_store();
    let (_, stderr, success) = run_slate(tmp.path(), &["init"]);
    assert!(!success);
    assert!(stderr.contains("already exists"));
    run_slate_ok(tmp.path(), &["init", "--force"]);
}

#[test]
fn test_commands_need_a_store() {
    let tmp = tempfile::TempDir::new().unwrap();
    let (_, stderr, success) = run_slate(tmp.path(), &["list"]);
    assert!(!success);
    assert!(stderr.contains("error: no .slate/ directory"));
}

#[test]
fn test_store_found_from_subdirectory_and_with_c_flag() {
    let tmp = init_store();
    let nested = tmp.path().join("a/b");
    fs::create_dir_all(&nested).unwrap();
    add(&nested, "Nested add");

    let elsewhere = tempfile::TempDir::new().unwrap();
    let dir = tmp.path().to_str().unwrap();
    let list = run_json(elsewhere.path(), &["-C", dir, "list"]);
    assert_eq!(descriptions(&list), vec!["Nested add"]);
}

// ---------------------------------------------------------------------------
// Add / list / show
// ---------------------------------------------------------------------------

#[test]
fn test_add_parses_line() {
    let tmp = init_store();
    let id = add(tmp.path(), "(A) 2023-10-26 Call Mom @phone +Family due:2023-10-27");

    let todo = run_json(tmp.path(), &["show", &id]);
    assert_eq!(todo["description"], "Call Mom");
    assert_eq!(todo["priority"], "A");
    assert_eq!(todo["createdAt"], "2023-10-26");
    assert_eq!(todo["dueDate"], "2023-10-27");
    assert_eq!(todo["project"], "Family");
    assert_eq!(todo["area"], "phone");
    assert_eq!(todo["metadata"]["due"], "2023-10-27");

    let projects = run_json(tmp.path(), &["project", "list"]);
    assert_eq!(projects["names"], serde_json::json!(["Family"]));
}

#[test]
fn test_add_empty_description_fails() {
    let tmp = init_store();
    let (_, stderr, success) = run_slate(tmp.path(), &["add", "(A) +Work @desk"]);
    assert!(!success);
    assert!(stderr.contains("description cannot be empty"));
    // Nothing was created, not even the project
    let projects = run_json(tmp.path(), &["project", "list"]);
    assert_eq!(projects["names"], serde_json::json!([]));
}

#[test]
fn test_list_order() {
    let tmp = init_store();
    add(tmp.path(), "(B) 2024-01-01 Prio B");
    add(tmp.path(), "x 2024-01-02 2024-01-01 Completed old");
    add(tmp.path(), "(A) 2024-01-01 Prio A");
    add(tmp.path(), "x 2024-01-08 2024-01-01 Completed new");
    add(tmp.path(), "2024-01-05 No priority");

    let list = run_json(tmp.path(), &["list"]);
    assert_eq!(
        descriptions(&list),
        vec!["Prio A", "Prio B", "No priority", "Completed new", "Completed old"]
    );

    let active = run_json(tmp.path(), &["list", "--active"]);
    assert_eq!(descriptions(&active), vec!["Prio A", "Prio B", "No priority"]);

    let text = run_slate_ok(tmp.path(), &["list", "--completed"]);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("x 2024-01-08 2024-01-01 Completed new"));
}

#[test]
fn test_list_filters() {
    let tmp = init_store();
    add(tmp.path(), "2024-01-01 Write report +Work @desk");
    add(tmp.path(), "2024-01-02 Call plumber +Home @phone");
    add(tmp.path(), "2024-01-03 Call boss +Work @phone");

    let work = run_json(tmp.path(), &["list", "--project", "Work"]);
    assert_eq!(descriptions(&work), vec!["Call boss", "Write report"]);

    let phone_work = run_json(tmp.path(), &["list", "--project", "Work", "--area", "phone"]);
    assert_eq!(descriptions(&phone_work), vec!["Call boss"]);

    let calls = run_json(tmp.path(), &["list", "--search", "^CALL"]);
    assert_eq!(descriptions(&calls), vec!["Call boss", "Call plumber"]);

    let (_, stderr, success) = run_slate(tmp.path(), &["list", "--search", "("]);
    assert!(!success);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_default_filter_from_config() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_slate_ok(tmp.path(), &["init", "--default-filter", "completed"]);
    add(tmp.path(), "2024-01-01 Open");
    add(tmp.path(), "x 2024-01-02 2024-01-01 Closed");

    let list = run_json(tmp.path(), &["list"]);
    assert_eq!(descriptions(&list), vec!["Closed"]);
    let all = run_json(tmp.path(), &["list", "--all"]);
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[test]
fn test_show_by_prefix_and_text_output() {
    let tmp = init_store();
    let id = add(tmp.path(), "2024-01-01 Prefix lookup +Work");
    let out = run_slate_ok(tmp.path(), &["show", &id[..6]]);
    assert!(out.contains(&format!("id:           {}", id)));
    assert!(out.contains("project:      Work"));

    let (_, stderr, success) = run_slate(tmp.path(), &["show", "zzzzzz"]);
    assert!(!success);
    assert!(stderr.contains("not found"));
}

// ---------------------------------------------------------------------------
// Updates
// ---------------------------------------------------------------------------

#[test]
fn test_done_toggles_completion_date() {
    let tmp = init_store();
    let id = add(tmp.path(), "(A) 2024-01-01 Finish me");

    let done = run_json(tmp.path(), &["done", &id]);
    assert_eq!(done["completed"], true);
    assert!(done["completionDate"].is_string());
    assert!(done.get("priority").is_none());

    let reopened = run_json(tmp.path(), &["done", &id]);
    assert_eq!(reopened["completed"], false);
    assert!(reopened.get("completionDate").is_none());
    assert_eq!(reopened["priority"], "A");
}

#[test]
fn test_set_fields() {
    let tmp = init_store();
    let id = add(tmp.path(), "2024-01-01 Plan trip est:2");

    let todo = run_json(
        tmp.path(),
        &[
            "set", &id, "--priority", "b", "--project", "Travel", "--area", "home", "--due",
            "2024-06-01", "--meta", "owner=sam",
        ],
    );
    assert_eq!(todo["priority"], "B");
    assert_eq!(todo["project"], "Travel");
    assert_eq!(
        todo["text"],
        "(B) 2024-01-01 Plan trip +Travel @home est:2 owner:sam due:2024-06-01"
    );

    let todo = run_json(
        tmp.path(),
        &["set", &id, "--no-priority", "--no-area", "--no-due", "--meta", "est="],
    );
    assert_eq!(todo["text"], "2024-01-01 Plan trip +Travel owner:sam");

    let todo = run_json(
        tmp.path(),
        &["set", &id, "--completed", "true", "--completion-date", "2024-02-01"],
    );
    assert_eq!(todo["completionDate"], "2024-02-01");

    let (_, stderr, success) = run_slate(tmp.path(), &["set", &id, "--description", "  "]);
    assert!(!success);
    assert!(stderr.contains("description cannot be empty"));

    let (_, stderr, success) = run_slate(tmp.path(), &["set", &id, "--description", "+Work"]);
    assert!(!success);
    assert!(stderr.contains("description cannot be empty"));
    let todo = run_json(tmp.path(), &["show", &id]);
    assert_eq!(todo["description"], "Plan trip");

    let (_, _, success) = run_slate(tmp.path(), &["set", &id, "--due", "2024-02-30"]);
    assert!(!success);
}

#[test]
fn test_edit_keeps_id_and_created_date() {
    let tmp = init_store();
    let id = add(tmp.path(), "2024-01-01 Draft +Work");
    let todo = run_json(tmp.path(), &["edit", &id, "(C) Final draft @desk"]);
    assert_eq!(todo["id"], id.as_str());
    assert_eq!(todo["createdAt"], "2024-01-01");
    assert_eq!(todo["text"], "(C) 2024-01-01 Final draft @desk");
    assert!(todo.get("project").is_none());
}

#[test]
fn test_rm_is_idempotent() {
    let tmp = init_store();
    let id = add(tmp.path(), "Temporary");
    let out = run_slate_ok(tmp.path(), &["rm", &id]);
    assert!(out.contains("deleted"));
    let out = run_slate_ok(tmp.path(), &["rm", &id]);
    assert!(out.contains("no todo matching"));
    let result = run_json(tmp.path(), &["rm", &id]);
    assert_eq!(result["deleted"], false);
}

// ---------------------------------------------------------------------------
// Projects / areas
// ---------------------------------------------------------------------------

#[test]
fn test_project_rename_cascades() {
    let tmp = init_store();
    add(tmp.path(), "2024-01-01 Task one +Work");
    add(tmp.path(), "2024-01-02 Task two +Work");

    let out = run_slate_ok(tmp.path(), &["project", "rename", "Work", "Office"]);
    assert!(out.contains("2 todos updated"));

    let list = run_json(tmp.path(), &["list", "--project", "Office"]);
    assert_eq!(descriptions(&list), vec!["Task two", "Task one"]);
    assert_eq!(list[0]["rawText"], "2024-01-02 Task two +Office");
}

#[test]
fn test_rename_conflict_is_case_insensitive() {
    let tmp = init_store();
    run_slate_ok(tmp.path(), &["project", "add", "Work"]);
    run_slate_ok(tmp.path(), &["project", "add", "Home"]);

    let (_, stderr, success) = run_slate(tmp.path(), &["project", "rename", "Home", "work"]);
    assert!(!success);
    assert!(stderr.contains("already exists"));

    let (_, stderr, success) = run_slate(tmp.path(), &["project", "add", "Work"]);
    assert!(!success);
    assert!(stderr.contains("already exists"));
}

#[test]
fn test_area_rm_detaches() {
    let tmp = init_store();
    let id = add(tmp.path(), "2024-01-01 Call Mom @phone");
    let out = run_slate_ok(tmp.path(), &["area", "rm", "phone"]);
    assert!(out.contains("1 todos detached"));

    let todo = run_json(tmp.path(), &["show", &id]);
    assert!(todo.get("area").is_none());
    assert_eq!(todo["description"], "Call Mom");

    // Deleting again is a no-op
    run_slate_ok(tmp.path(), &["area", "rm", "phone"]);
    let areas = run_json(tmp.path(), &["area", "list"]);
    assert_eq!(areas["names"], serde_json::json!([]));
}

// ---------------------------------------------------------------------------
// Stats / export / import / suggest
// ---------------------------------------------------------------------------

#[test]
fn test_stats() {
    let tmp = init_store();
    add(tmp.path(), "One");
    add(tmp.path(), "Two +Work");
    add(tmp.path(), "x Three");

    let stats = run_json(tmp.path(), &["stats"]);
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["active"], 2);
    assert_eq!(stats["completed"], 1);
    assert_eq!(stats["filtered"], false);

    let out = run_slate_ok(tmp.path(), &["stats", "--project", "Work"]);
    assert_eq!(out.trim(), "1 todos: 1 active, 0 completed (filtered)");
}

#[test]
fn test_stats_filtered_when_filter_hides_nothing() {
    let tmp = init_store();
    add(tmp.path(), "One");
    add(tmp.path(), "Two");

    let stats = run_json(tmp.path(), &["stats", "--active"]);
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["filtered"], true);
    let stats = run_json(tmp.path(), &["stats", "--all"]);
    assert_eq!(stats["filtered"], false);
}

#[test]
fn test_import_then_export() {
    let tmp = init_store();
    let file = tmp.path().join("todo.txt");
    fs::write(
        &file,
        "\
2024-01-02 Second +Work
(A) 2024-01-01 First @phone

x 2024-01-04 2024-01-03 Third
(B) +Empty
",
    )
    .unwrap();

    let result = run_json(tmp.path(), &["import", file.to_str().unwrap()]);
    assert_eq!(result["imported"], 3);
    assert_eq!(result["skipped"], 1);

    let out = run_slate_ok(tmp.path(), &["export"]);
    assert_eq!(
        out,
        "\
(A) 2024-01-01 First @phone
2024-01-02 Second +Work
x 2024-01-04 2024-01-03 Third
"
    );

    let projects = run_json(tmp.path(), &["project", "list"]);
    assert_eq!(projects["names"], serde_json::json!(["Work"]));
}

#[test]
fn test_suggest() {
    let tmp = init_store();
    add(tmp.path(), "Seed +Family");
    run_slate_ok(tmp.path(), &["project", "add", "Fitness"]);

    let suggestion = run_json(tmp.path(), &["suggest", "Call Mom +fi"]);
    assert_eq!(suggestion["kind"], "project");
    assert_eq!(suggestion["query"], "fi");
    assert_eq!(suggestion["candidates"], serde_json::json!(["Fitness"]));

    let suggestion = run_json(tmp.path(), &["suggest", "Pay rent du"]);
    assert_eq!(suggestion["kind"], "date_keyword");

    let suggestion = run_json(tmp.path(), &["suggest", "(", "--cursor", "1"]);
    assert_eq!(suggestion["kind"], "priority");
}

#[test]
fn test_suggest_outside_store() {
    let tmp = tempfile::TempDir::new().unwrap();
    let suggestion = run_json(tmp.path(), &["suggest", "Call @"]);
    assert_eq!(suggestion["kind"], "area");
    assert_eq!(suggestion["candidates"], serde_json::json!([]));
}
