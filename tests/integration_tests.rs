//! Integration test harness
//!
//! End-to-end tests driving the `meshml-node` binary against real
//! configuration files, rather than the library directly.

use std::time::Duration;

mod common;
use common::{node_cmd, ConfigFixture};

// ─────────────────────────────────────────────────────────────────
// End-to-End Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_full_config_workflow() {
    let fixture = ConfigFixture::with_config(
        r#"
max_peers = 16
server_port = 0
my_id = "test-node"
stabilizer_interval_secs = 5
"#,
    );

    node_cmd()
        .arg("config")
        .arg("show")
        .arg("--config")
        .arg(fixture.path())
        .assert()
        .success()
        .stdout(predicates::str::contains("test-node"));

    node_cmd()
        .arg("config")
        .arg("validate")
        .arg("--config")
        .arg(fixture.path())
        .assert()
        .success();
}

#[test]
fn test_config_references_model_path() {
    let fixture = ConfigFixture::new();
    let model_path = fixture.create_mock_model(&[0.5, -0.25], 0.1);

    let config = format!(
        r#"
max_peers = 4
model_name = "fixture"
model_path = "{}"
"#,
        model_path.display()
    );
    let fixture = ConfigFixture::with_config(&config);

    node_cmd()
        .arg("config")
        .arg("validate")
        .arg("--config")
        .arg(fixture.path())
        .assert()
        .success();
}

// ─────────────────────────────────────────────────────────────────
// Error Scenario Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_config_not_found_exit_code() {
    let result = node_cmd()
        .arg("run")
        .arg("--config")
        .arg("/nonexistent/path/config.toml")
        .assert()
        .failure();

    // Error::ConfigNotFound is in the 200s band, which maps to exit code 10.
    let exit_code = result.get_output().status.code().unwrap_or(1);
    assert_eq!(exit_code, 10, "expected config error exit code (10)");
}

#[test]
fn test_invalid_config_exit_code() {
    let fixture = ConfigFixture::with_config(
        r#"
[seed]
host = "203.0.113.20"
port = 9000
hops = 0
"#,
    );

    let result = node_cmd()
        .arg("config")
        .arg("validate")
        .arg("--config")
        .arg(fixture.path())
        .assert()
        .failure();

    let exit_code = result.get_output().status.code().unwrap_or(1);
    assert_eq!(exit_code, 10);
}

// ─────────────────────────────────────────────────────────────────
// Performance Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_startup_time() {
    use std::time::Instant;

    let start = Instant::now();

    node_cmd().arg("version").assert().success();

    let elapsed = start.elapsed();
    assert!(elapsed < Duration::from_secs(1), "startup too slow: {:?}", elapsed);
}

#[test]
fn test_config_parse_time() {
    use std::time::Instant;

    let fixture = ConfigFixture::new();
    fixture.write_config("max_peers = 16\n");

    let start = Instant::now();
    node_cmd()
        .arg("config")
        .arg("show")
        .arg("--config")
        .arg(fixture.path())
        .assert()
        .success();
    let elapsed = start.elapsed();

    assert!(elapsed < Duration::from_millis(500), "config parsing too slow: {:?}", elapsed);
}

// ─────────────────────────────────────────────────────────────────
// Concurrent Access Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_concurrent_config_reads() {
    use std::thread;

    let fixture = ConfigFixture::new();
    fixture.write_config("max_peers = 16\n");
    let config_path = fixture.path().to_string();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let path = config_path.clone();
            thread::spawn(move || {
                node_cmd()
                    .arg("config")
                    .arg("validate")
                    .arg("--config")
                    .arg(&path)
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread panicked");
    }
}
