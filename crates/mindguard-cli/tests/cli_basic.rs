//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &TempDir, args: &[&str]) -> (String, String, i32) {
    run_cli_with_stdin(home, args, "")
}

fn run_cli_with_stdin(home: &TempDir, args: &[&str], stdin: &str) -> (String, String, i32) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_mindguard-cli"))
        .args(args)
        .env("MINDGUARD_HOME", home.path())
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute CLI command");

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("Failed to write stdin");
    let output = child.wait_with_output().expect("CLI did not exit");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);
    (stdout, stderr, code)
}

fn run_cli_success(home: &TempDir, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
    stdout
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

#[test]
fn test_block_add_list_remove() {
    let home = TempDir::new().unwrap();
    run_cli_success(&home, &["block", "add", "Instagram"]);
    run_cli_success(&home, &["block", "add", "com.discord"]);
    run_cli_success(&home, &["block", "add", "Instagram"]);

    let listed = run_cli_success(&home, &["block", "list", "--json"]);
    let blocked: Vec<String> = serde_json::from_str(&listed).unwrap();
    assert_eq!(blocked, vec!["Instagram", "com.discord"]);

    let check = run_cli_success(&home, &["block", "check", "com.instagram.android"]);
    assert_eq!(check.trim(), "Instagram: blocked");

    run_cli_success(&home, &["block", "remove", "Instagram"]);
    run_cli_success(&home, &["block", "remove", "Instagram"]);
    let listed = run_cli_success(&home, &["block", "list"]);
    assert_eq!(listed.trim(), "com.discord");
}

#[test]
fn test_block_rejects_blank_identifier() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&home, &["block", "add", "  "]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error:"), "stderr: {stderr}");
}

#[test]
fn test_auth_token_and_base_url() {
    let home = TempDir::new().unwrap();
    let status: serde_json::Value =
        serde_json::from_str(&run_cli_success(&home, &["auth", "status", "--json"])).unwrap();
    assert_eq!(status["authenticated"], false);
    assert_eq!(status["baseUrl"], "http://localhost:5281");

    run_cli_success(&home, &["auth", "set-token", "abc"]);
    run_cli_success(&home, &["auth", "set-base-url", "https://api.example.com/"]);
    let status: serde_json::Value =
        serde_json::from_str(&run_cli_success(&home, &["auth", "status", "--json"])).unwrap();
    assert_eq!(status["authenticated"], true);
    assert_eq!(status["baseUrl"], "https://api.example.com");

    let (_, _, code) = run_cli(&home, &["auth", "set-base-url", "ftp://example.com"]);
    assert_ne!(code, 0);

    run_cli_success(&home, &["auth", "clear-token"]);
    let status = run_cli_success(&home, &["auth", "status"]);
    assert!(status.starts_with("not authenticated"));
}

#[test]
fn test_config_get_set() {
    let home = TempDir::new().unwrap();
    let interval = run_cli_success(&home, &["config", "get", "reporter.interval_secs"]);
    assert_eq!(interval.trim(), "300");

    run_cli_success(&home, &["config", "set", "reporter.interval_secs", "60"]);
    let interval = run_cli_success(&home, &["config", "get", "reporter.interval_secs"]);
    assert_eq!(interval.trim(), "60");

    let (_, _, code) = run_cli(&home, &["config", "get", "reporter.nope"]);
    assert_ne!(code, 0);

    run_cli_success(&home, &["config", "reset"]);
    let interval = run_cli_success(&home, &["config", "get", "reporter.interval_secs"]);
    assert_eq!(interval.trim(), "300");
}

#[test]
fn test_usage_stats_from_samples_file() {
    let home = TempDir::new().unwrap();
    let recent = now_ms() - 60_000;
    let samples = home.path().join("samples.json");
    std::fs::write(
        &samples,
        serde_json::json!([
            { "packageId": "com.whatsapp", "totalForegroundMs": 120000, "lastUsedAtMs": recent },
            { "packageId": "com.google.android.youtube", "totalForegroundMs": 600000, "lastUsedAtMs": recent },
            { "packageId": "com.whatsapp", "totalForegroundMs": 60000, "lastUsedAtMs": recent },
            { "packageId": "com.old.app", "totalForegroundMs": 60000, "lastUsedAtMs": 0 }
        ])
        .to_string(),
    )
    .unwrap();

    let out = run_cli_success(
        &home,
        &["usage", "stats", "--days", "2", "--samples", samples.to_str().unwrap(), "--json"],
    );
    let stats: serde_json::Value = serde_json::from_str(&out).unwrap();
    let stats = stats.as_array().unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0]["displayName"], "YouTube");
    assert_eq!(stats[1]["displayName"], "WhatsApp");
    assert_eq!(stats[1]["totalForegroundMs"], 180000);
}

#[test]
fn test_usage_stats_without_samples_is_empty() {
    let home = TempDir::new().unwrap();
    let out = run_cli_success(&home, &["usage", "stats", "--days", "-3"]);
    assert_eq!(out.trim(), "No usage recorded.");
}

#[test]
fn test_enforce_replay_from_stdin() {
    let home = TempDir::new().unwrap();
    run_cli_success(&home, &["block", "add", "Instagram"]);

    let (stdout, stderr, code) = run_cli_with_stdin(
        &home,
        &["enforce", "replay", "--stats"],
        "com.instagram.android\ncom.unknown.app\n",
    );
    assert_eq!(code, 0, "{stderr}");
    assert_eq!(stdout.lines().filter(|l| *l == "home").count(), 1);
    assert!(stdout.contains(
        "prompt: App Blocked - Instagram is currently blocked. Enter your app password to unlock."
    ));

    let json_start = stdout.find('{').unwrap();
    let stats: serde_json::Value = serde_json::from_str(&stdout[json_start..]).unwrap();
    assert_eq!(stats["foreground_events"], 2);
    assert_eq!(stats["interventions"], 1);
}

#[test]
fn test_report_once_without_token_is_skipped() {
    let home = TempDir::new().unwrap();
    let samples = home.path().join("samples.json");
    std::fs::write(
        &samples,
        format!(
            r#"[{{"packageId":"com.discord","totalForegroundMs":3780000,"lastUsedAtMs":{}}}]"#,
            now_ms()
        ),
    )
    .unwrap();

    let out = run_cli_success(
        &home,
        &["report", "once", "--samples", samples.to_str().unwrap()],
    );
    assert_eq!(out.trim(), "skipped: no auth token (63 min)");
}

#[test]
fn test_permissions_status() {
    let home = TempDir::new().unwrap();
    let out = run_cli_success(&home, &["permissions", "status"]);
    assert!(out.contains("blocking: granted"));
    assert!(out.contains("usage access: granted"));
}
