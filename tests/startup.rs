//! Fatal startup conditions: the process must exit before serving.

mod common;

use common::server::binary_path;
use std::process::{Command, Stdio};

fn run_without_serving(envs: &[(&str, &str)]) -> std::process::Output {
    let mut command = Command::new(binary_path());
    command
        .env_remove("DATABASE_URL")
        .env("LISTEN_ADDR", "127.0.0.1:0")
        .env("RUST_LOG", "info")
        .stdin(Stdio::null());
    for (key, value) in envs {
        command.env(key, value);
    }
    command.output().expect("leadcapd runs")
}

#[test]
fn test_missing_database_url_is_fatal() {
    let output = run_without_serving(&[]);
    assert!(!output.status.success());
    let logs = String::from_utf8_lossy(&output.stdout);
    assert!(logs.contains("database url is required"), "{logs}");
}

#[test]
fn test_unsupported_database_url_is_fatal() {
    let output = run_without_serving(&[("DATABASE_URL", "mysql://root@localhost/leads")]);
    assert!(!output.status.success());
}

#[test]
fn test_unreachable_store_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    // A directory that does not exist cannot hold the database file.
    let url = format!("sqlite://{}/missing/leads.db", dir.path().display());
    let output = run_without_serving(&[("DATABASE_URL", &url)]);
    assert!(!output.status.success());
}

#[test]
fn test_bad_config_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("leadcap.toml");
    std::fs::write(&path, "[server\nlisten = ").unwrap();

    let output = Command::new(binary_path())
        .arg(&path)
        .env("DATABASE_URL", "sqlite::memory:")
        .output()
        .expect("leadcapd runs");
    assert!(!output.status.success());
}
