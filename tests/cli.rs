mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn caselens_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("caselens");
    path
}

fn setup_test_env(base_url: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(files_dir.join("intake.pdf"), "%PDF-1.7 intake visit").unwrap();
    fs::write(files_dir.join("followup.pdf"), "%PDF-1.7 follow-up visit").unwrap();
    fs::write(files_dir.join("renamed.pdf"), "<html>not a pdf</html>").unwrap();
    fs::write(files_dir.join("notes.txt"), "plain notes").unwrap();

    let config_content = format!(
        r#"[api]
base_url = "{}"
timeout_secs = 10

[timeline]
undated_label = "Undated"

[upload]
default_case_name = "Demo Case"
allowed_extensions = ["pdf"]
"#,
        base_url
    );

    let config_path = config_dir.join("caselens.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_caselens(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = caselens_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run caselens binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

/// Run the binary off the async runtime so the mock backend keeps serving.
async fn run_async(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let config_path = config_path.to_path_buf();
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_caselens(&config_path, &args)
    })
    .await
    .unwrap()
}

#[test]
fn test_parse_file() {
    let (tmp, config_path) = setup_test_env("http://127.0.0.1:9");
    let input = tmp.path().join("annotation.txt");
    fs::write(
        &input,
        "<CASE_SUMMARY>\n- Patient stable\n- Follow-up required\n</CASE_SUMMARY>",
    )
    .unwrap();

    let (stdout, stderr, success) =
        run_caselens(&config_path, &["parse", input.to_str().unwrap()]);
    assert!(success, "parse failed: stdout={}, stderr={}", stdout, stderr);

    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "summary": ["Patient stable", "Follow-up required"],
            "facts": []
        })
    );
}

#[test]
fn test_parse_malformed_facts() {
    let (tmp, config_path) = setup_test_env("http://127.0.0.1:9");
    let input = tmp.path().join("annotation.txt");
    fs::write(&input, "<FACTS_JSON>{not json</FACTS_JSON>").unwrap();

    let (stdout, _, success) = run_caselens(&config_path, &["parse", input.to_str().unwrap()]);
    assert!(success);
    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["facts"], serde_json::json!([]));
}

#[test]
fn test_missing_explicit_config_errors() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");
    let (_, stderr, success) = run_caselens(&missing, &["parse"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"), "stderr: {}", stderr);
}

#[test]
fn test_invalid_config_errors() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9");
    fs::write(&config_path, "[api]\ntimeout_secs = 0\n").unwrap();
    let (_, stderr, success) = run_caselens(&config_path, &["cases"]);
    assert!(!success);
    assert!(stderr.contains("timeout_secs"), "stderr: {}", stderr);
}

#[test]
fn test_invalid_api_url_override_errors() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9");
    let (_, stderr, success) =
        run_caselens(&config_path, &["--api-url", "ftp://example.org", "cases"]);
    assert!(!success);
    assert!(stderr.contains("base_url"), "stderr: {}", stderr);
}

#[test]
fn test_delete_requires_yes() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9");
    let (_, stderr, success) = run_caselens(&config_path, &["delete", "1"]);
    assert!(!success);
    assert!(stderr.contains("--yes"), "stderr: {}", stderr);
}

#[test]
fn test_non_numeric_case_id_rejected() {
    let (_tmp, config_path) = setup_test_env("http://127.0.0.1:9");
    let (_, _, success) = run_caselens(&config_path, &["show", "abc"]);
    assert!(!success);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_show_export_against_backend() {
    let backend = common::spawn_backend().await;
    let (tmp, config_path) = setup_test_env(&backend.base_url());
    let files = tmp.path().join("files");

    let (stdout, stderr, success) = run_async(
        &config_path,
        &[
            "upload",
            "--name",
            "Doe v. ACME",
            files.join("intake.pdf").to_str().unwrap(),
            files.join("renamed.pdf").to_str().unwrap(),
            files.join("followup.pdf").to_str().unwrap(),
        ],
    )
    .await;
    assert!(success, "upload failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Processed     intake.pdf"), "stdout: {}", stdout);
    assert!(!stdout.contains("renamed.pdf"), "stdout: {}", stdout);
    assert!(stdout.contains("Created case 1."), "stdout: {}", stdout);

    let (stdout, _, success) = run_async(&config_path, &["cases"]).await;
    assert!(success);
    assert!(stdout.contains("Doe v. ACME"));

    let (stdout, _, success) = run_async(&config_path, &["show", "1"]).await;
    assert!(success);
    assert!(stdout.contains("Summarization in progress"), "stdout: {}", stdout);
    assert!(stdout.contains("Undated\n  intake.pdf\n  followup.pdf\n"), "stdout: {}", stdout);

    let (stdout, _, success) = run_async(&config_path, &["show", "1", "--json"]).await;
    assert!(success);
    let view: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(view["summary"]["state"], "pending");
    assert_eq!(view["timeline"][0]["documents"].as_array().unwrap().len(), 2);

    let out = tmp.path().join("export.json");
    let (_, stderr, success) =
        run_async(&config_path, &["export", "1", "--output", out.to_str().unwrap()]).await;
    assert!(success, "export failed: {}", stderr);
    let export: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(export["case"]["name"], "Doe v. ACME");
    assert_eq!(export["docs"].as_array().unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_append_rename_delete_against_backend() {
    let backend = common::spawn_backend().await;
    let (tmp, config_path) = setup_test_env(&backend.base_url());
    let files = tmp.path().join("files");
    let intake = files.join("intake.pdf");
    let followup = files.join("followup.pdf");

    let (_, _, success) = run_async(&config_path, &["upload", intake.to_str().unwrap()]).await;
    assert!(success);

    let (stdout, stderr, success) = run_async(
        &config_path,
        &["upload", "--case", "1", followup.to_str().unwrap()],
    )
    .await;
    assert!(success, "append failed: {}", stderr);
    assert!(stdout.contains("Appended to case 1."), "stdout: {}", stdout);

    let (stdout, _, _) = run_async(&config_path, &["cases"]).await;
    assert!(stdout.contains("Demo Case"));
    assert!(stdout.trim_end().ends_with('2'), "stdout: {}", stdout);

    let (_, _, success) = run_async(&config_path, &["rename", "1", "Smith v. Jones"]).await;
    assert!(success);
    let (stdout, _, _) = run_async(&config_path, &["cases"]).await;
    assert!(stdout.contains("Smith v. Jones"));

    let (_, _, success) = run_async(&config_path, &["delete", "1", "--yes"]).await;
    assert!(success);
    let (stdout, _, _) = run_async(&config_path, &["cases"]).await;
    assert_eq!(stdout, "No cases yet.\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failed_upload_exits_nonzero() {
    let backend = common::spawn_backend().await;
    let (tmp, config_path) = setup_test_env(&backend.base_url());
    let intake = tmp.path().join("files").join("intake.pdf");

    let (stdout, stderr, success) = run_async(
        &config_path,
        &["upload", "--name", common::FAILING_CASE_NAME, intake.to_str().unwrap()],
    )
    .await;
    assert!(!success);
    assert!(stdout.contains("Failed        intake.pdf"), "stdout: {}", stdout);
    assert!(stderr.contains("upload failed"), "stderr: {}", stderr);
    assert!(stderr.contains("502"), "stderr: {}", stderr);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_json_progress_lines() {
    let backend = common::spawn_backend().await;
    let (tmp, config_path) = setup_test_env(&backend.base_url());
    let files = tmp.path().join("files");

    let (_, stderr, success) = run_async(
        &config_path,
        &[
            "upload",
            "--json-progress",
            files.join("intake.pdf").to_str().unwrap(),
            files.join("notes.txt").to_str().unwrap(),
        ],
    )
    .await;
    assert!(success, "stderr: {}", stderr);

    let events: Vec<serde_json::Value> = stderr
        .lines()
        .filter_map(|l| serde_json::from_str(l).ok())
        .collect();
    let phases: Vec<&str> = events
        .iter()
        .filter(|e| e["files"].is_array())
        .filter_map(|e| e["phase"].as_str())
        .collect();
    assert_eq!(phases, vec!["submitting", "succeeded"]);
    assert!(events
        .iter()
        .any(|e| e["event"] == "skipped" && e["file"] == "notes.txt"));
}
