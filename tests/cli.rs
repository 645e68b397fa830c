//! End-to-end tests driving the `dex` binary against a fake Pokémon API
//! and a temporary database.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::Command;

use axum::extract::Path as UrlPath;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

const KANTO: &[(i64, &str)] = &[(1, "bulbasaur"), (2, "ivysaur"), (3, "venusaur")];

fn dex_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("dex");
    path
}

async fn list_pokemon() -> Json<Value> {
    let results: Vec<Value> = KANTO
        .iter()
        .map(|(id, name)| {
            json!({
                "name": name,
                "url": format!("https://pokeapi.co/api/v2/pokemon/{id}/"),
            })
        })
        .collect();
    Json(json!({
        "count": KANTO.len(),
        "next": null,
        "previous": null,
        "results": results,
    }))
}

async fn get_pokemon(UrlPath(key): UrlPath<String>) -> (StatusCode, Json<Value>) {
    match KANTO
        .iter()
        .find(|(id, name)| *name == key || id.to_string() == key)
    {
        Some((id, name)) => (
            StatusCode::OK,
            Json(json!({
                "id": id,
                "name": name,
                "sprites": {
                    "front_default": format!("https://img.example/{id}.png"),
                    "other": {
                        "official-artwork": {
                            "front_default": format!("https://img.example/art/{id}.png"),
                        }
                    }
                }
            })),
        ),
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))),
    }
}

/// Serve the fake API from a dedicated thread so plain `#[test]` functions
/// can drive the binary against it.
fn spawn_fake_api() -> SocketAddr {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let app = Router::new()
                .route("/api/v2/pokemon/", get(list_pokemon))
                .route("/api/v2/pokemon/{key}", get(get_pokemon));
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    rx.recv().unwrap()
}

fn setup_test_env(base_url: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_content = format!(
        r#"[remote]
base_url = "{}"
page_limit = 20
detail_concurrency = 4
timeout_secs = 5

[db]
path = "{}/data/dex.db"

[stream]
grace_ms = 250
"#,
        base_url,
        root.display()
    );

    let config_path = root.join("dex.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

/// Environment for commands that never reach the network. The port is from
/// the discard range, so an accidental request fails fast.
fn setup_offline_env() -> (TempDir, PathBuf) {
    setup_test_env("http://127.0.0.1:9")
}

fn run_dex(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = dex_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run dex binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_offline_env();

    let (stdout, stderr, success) = run_dex(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/dex.db").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_offline_env();

    let (_, _, success1) = run_dex(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_dex(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_missing_config_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("does-not-exist.toml");

    // The default db path is relative, so pin the working directory.
    let output = Command::new(dex_binary())
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("init")
        .current_dir(tmp.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(tmp.path().join("dex.db").exists());
}

#[test]
fn test_sync_populates_the_local_table() {
    let addr = spawn_fake_api();
    let (_tmp, config_path) = setup_test_env(&format!("http://{addr}"));

    let (_, _, success) = run_dex(&config_path, &["init"]);
    assert!(success);

    let (stdout, stderr, success) = run_dex(&config_path, &["sync"]);
    assert!(success, "sync failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("upserted: 3 records"));
    assert!(stdout.contains("ok"));

    let (stdout, _, success) = run_dex(&config_path, &["snapshot"]);
    assert!(success);
    assert!(stdout.contains("bulbasaur"));
    assert!(stdout.contains("3 records"));
}

#[test]
fn test_snapshot_without_sync_is_empty() {
    let (_tmp, config_path) = setup_offline_env();

    let (_, _, success) = run_dex(&config_path, &["init"]);
    assert!(success);

    let (stdout, _, success) = run_dex(&config_path, &["snapshot"]);
    assert!(success);
    assert!(stdout.contains("No records."));
}

#[test]
fn test_snapshot_json_is_machine_readable() {
    let addr = spawn_fake_api();
    let (_tmp, config_path) = setup_test_env(&format!("http://{addr}"));

    run_dex(&config_path, &["init"]);
    let (_, _, success) = run_dex(&config_path, &["sync"]);
    assert!(success);

    let (stdout, _, success) = run_dex(&config_path, &["snapshot", "--json"]);
    assert!(success);

    let records: Value = serde_json::from_str(&stdout).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["name"], "bulbasaur");
    assert_eq!(records[0]["id"], 1);
}

#[test]
fn test_list_reads_live_without_caching() {
    let addr = spawn_fake_api();
    let (_tmp, config_path) = setup_test_env(&format!("http://{addr}"));

    run_dex(&config_path, &["init"]);

    let (stdout, _, success) = run_dex(&config_path, &["list"]);
    assert!(success);
    assert!(stdout.contains("3 records"));

    // The live listing left nothing behind in the local table.
    let (stdout, _, success) = run_dex(&config_path, &["snapshot"]);
    assert!(success);
    assert!(stdout.contains("No records."));
}

#[test]
fn test_get_reads_live_from_the_remote() {
    let addr = spawn_fake_api();
    let (_tmp, config_path) = setup_test_env(&format!("http://{addr}"));

    run_dex(&config_path, &["init"]);

    let (stdout, stderr, success) = run_dex(&config_path, &["get", "2"]);
    assert!(success, "get failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("ivysaur"));
    assert!(stdout.contains("https://img.example/2.png"));
}

#[test]
fn test_get_local_reports_missing_row() {
    let (_tmp, config_path) = setup_offline_env();

    run_dex(&config_path, &["init"]);

    let (_, stderr, success) = run_dex(&config_path, &["get", "9999", "--local"]);
    assert!(!success, "get --local should fail for an absent row");
    assert!(stderr.contains("no local record"));
}

#[test]
fn test_get_local_reads_synced_record() {
    let addr = spawn_fake_api();
    let (_tmp, config_path) = setup_test_env(&format!("http://{addr}"));

    run_dex(&config_path, &["init"]);
    run_dex(&config_path, &["sync"]);

    let (stdout, _, success) = run_dex(&config_path, &["get", "1", "--local"]);
    assert!(success);
    assert!(stdout.contains("bulbasaur"));
}

#[test]
fn test_sync_fails_when_remote_is_down() {
    let (_tmp, config_path) = setup_offline_env();

    run_dex(&config_path, &["init"]);

    let (_, stderr, success) = run_dex(&config_path, &["sync"]);
    assert!(!success, "sync should fail without a reachable remote");
    assert!(!stderr.is_empty());
}
