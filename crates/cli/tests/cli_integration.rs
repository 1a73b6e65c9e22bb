//! CLI integration tests for the `pacs` binary.
//!
//! Uses `assert_cmd` to spawn the binary and verify exit codes, stdout
//! content, and stderr content. Input files are written to a temp dir.

use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::thread;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn pacs() -> Command {
    cargo_bin_cmd!("pacs")
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn node_config(manager_port: u16) -> String {
    format!(
        r#"
[logging]
level = "warn"

[pix]
local_consumer_application = "ARCHIVE|RADIOLOGY"
remote_manager_application = "PIXMGR|HIE"

[[hl7.applications]]
name = "ARCHIVE|RADIOLOGY"
connections = [{{ hostname = "localhost", connect_timeout_ms = 2000, response_timeout_ms = 2000 }}]

[[hl7.remote_applications]]
name = "PIXMGR|HIE"
connections = [{{ hostname = "127.0.0.1", port = {} }}]
"#,
        manager_port
    )
}

const CT: &str = "1.2.840.10008.5.1.4.1.1.2";

fn catalog_json() -> String {
    format!(
        r#"[
  {{"sop_class_uid": "{ct}", "sop_instance_uid": "1.1", "retrieve_locations": {{"primary": "ARCHIVE"}}}},
  {{"sop_class_uid": "{ct}", "sop_instance_uid": "1.3", "superseded": true}}
]"#,
        ct = CT
    )
}

fn request_json() -> String {
    format!(
        r#"{{"transaction_uid": "2.25.5", "requested": [
  {{"sop_class_uid": "{ct}", "sop_instance_uid": "1.1"}},
  {{"sop_class_uid": "{ct}", "sop_instance_uid": "1.2"}},
  {{"sop_class_uid": "{ct}", "sop_instance_uid": "1.3"}}
]}}"#,
        ct = CT
    )
}

/// Answer one PIX query over MLLP with the given PID-3 value.
fn fake_pix_manager(pid3: &'static str) -> (u16, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.ends_with(&[0x1C, 0x0D]) {
            let n = stream.read(&mut buf).unwrap();
            assert!(n > 0, "peer closed before sending a full frame");
            request.extend_from_slice(&buf[..n]);
        }
        let reply = format!(
            "MSH|^~\\&|PIXMGR|HIE|ARCHIVE|RADIOLOGY|||RSP^K23^RSP_K23|R1|P|2.5\rMSA|AA|Q1\rPID|||{}\r",
            pid3
        );
        let mut frame = vec![0x0B];
        frame.extend_from_slice(reply.as_bytes());
        frame.extend_from_slice(&[0x1C, 0x0D]);
        stream.write_all(&frame).unwrap();
        String::from_utf8_lossy(&request[1..request.len() - 2]).into_owned()
    });
    (port, handle)
}

fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    pacs()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("PIX identity resolution"));
}

#[test]
fn version_exits_0() {
    pacs()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pacs"));
}

// ──────────────────────────────────────────────
// 2. check-config
// ──────────────────────────────────────────────

#[test]
fn check_config_valid() {
    let dir = TempDir::new().unwrap();
    let cfg = write(&dir, "pacs.toml", &node_config(2575));
    pacs()
        .args(["check-config", cfg.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("configuration OK"))
        .stdout(predicate::str::contains("PIX enabled"));
}

#[test]
fn check_config_reports_every_problem() {
    let dir = TempDir::new().unwrap();
    let cfg = write(
        &dir,
        "pacs.toml",
        "[logging]\nlevel = \"loud\"\n\n[pix]\nlocal_consumer_application = \"NOPE|X\"\nremote_manager_application = \"ALSO|NOPE\"\n",
    );
    pacs()
        .args(["check-config", cfg.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("loud"))
        .stderr(predicate::str::contains("NOPE|X"))
        .stderr(predicate::str::contains("ALSO|NOPE"));
}

#[test]
fn check_config_json_output() {
    let dir = TempDir::new().unwrap();
    let cfg = write(&dir, "pacs.toml", "[logging]\nlevel = \"loud\"\n");
    let out = pacs()
        .args(["--output", "json", "check-config", cfg.to_str().unwrap()])
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["valid"], false);
    assert_eq!(value["errors"].as_array().unwrap().len(), 1);
}

#[test]
fn check_config_missing_file() {
    pacs()
        .args(["check-config", "/nonexistent/pacs.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not read"));
}

#[test]
fn check_config_unparseable_file() {
    let dir = TempDir::new().unwrap();
    let cfg = write(&dir, "pacs.toml", "[pix\n");
    pacs()
        .args(["check-config", cfg.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not parse"));
}

// ──────────────────────────────────────────────
// 3. stgcmt
// ──────────────────────────────────────────────

#[test]
fn stgcmt_text_output() {
    let dir = TempDir::new().unwrap();
    let request = write(&dir, "request.json", &request_json());
    let catalog = write(&dir, "catalog.json", &catalog_json());
    pacs()
        .args([
            "stgcmt",
            "--request",
            request.to_str().unwrap(),
            "--catalog",
            catalog.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("event type 2"))
        .stdout(predicate::str::contains("retrieve AE: ARCHIVE"))
        .stdout(predicate::str::contains("1 committed, 2 failed"))
        .stdout(predicate::str::contains("0x0112"));
}

#[test]
fn stgcmt_json_output() {
    let dir = TempDir::new().unwrap();
    let request = write(&dir, "request.json", &request_json());
    let catalog = write(&dir, "catalog.json", &catalog_json());
    let out = pacs()
        .args([
            "--output",
            "json",
            "stgcmt",
            "--request",
            request.to_str().unwrap(),
            "--catalog",
            catalog.to_str().unwrap(),
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["event_type_id"], 2);
    let result = &value["result"];
    assert_eq!(result["transaction_uid"], "2.25.5");
    assert_eq!(result["common_retrieve_locations"]["primary"], "ARCHIVE");
    assert_eq!(result["successes"].as_array().unwrap().len(), 1);
    let failures = result["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0]["sop_instance_uid"], "1.2");
    assert_eq!(failures[1]["reason"], "no_such_object_instance");
}

#[test]
fn stgcmt_bad_catalog_fails() {
    let dir = TempDir::new().unwrap();
    let request = write(&dir, "request.json", &request_json());
    let catalog = write(&dir, "catalog.json", "{not json");
    pacs()
        .args([
            "stgcmt",
            "--request",
            request.to_str().unwrap(),
            "--catalog",
            catalog.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid catalog data"));
}

#[test]
fn stgcmt_missing_request_fails() {
    let dir = TempDir::new().unwrap();
    let catalog = write(&dir, "catalog.json", &catalog_json());
    pacs()
        .args([
            "stgcmt",
            "--request",
            "/nonexistent/request.json",
            "--catalog",
            catalog.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error reading file"));
}

// ──────────────────────────────────────────────
// 4. pix-query
// ──────────────────────────────────────────────

#[test]
fn pix_query_lists_aliases() {
    let (port, manager) = fake_pix_manager("A2^^^IssuerX~A3");
    let dir = TempDir::new().unwrap();
    let cfg = write(&dir, "pacs.toml", &node_config(port));
    pacs()
        .args(["pix-query", "--config", cfg.to_str().unwrap(), "A1^^^IssuerY"])
        .assert()
        .success()
        .stdout(predicate::eq("A1^^^IssuerY\nA2^^^IssuerX\nA3\n"));
    let request = manager.join().unwrap();
    assert!(request.contains("QPD|IHE PIX Query|"));
    assert!(request.contains("|A1^^^IssuerY"));
}

#[test]
fn pix_query_json_output() {
    let (port, manager) = fake_pix_manager("A2^^^IssuerX");
    let dir = TempDir::new().unwrap();
    let cfg = write(&dir, "pacs.toml", &node_config(port));
    let out = pacs()
        .args([
            "--output",
            "json",
            "pix-query",
            "--config",
            cfg.to_str().unwrap(),
            "A1^^^IssuerY",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    manager.join().unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["pid"], "A1^^^IssuerY");
    assert_eq!(
        value["identifiers"],
        serde_json::json!(["A1^^^IssuerY", "A2^^^IssuerX"])
    );
}

#[test]
fn pix_query_unreachable_manager_falls_back() {
    let dir = TempDir::new().unwrap();
    let cfg = write(&dir, "pacs.toml", &node_config(closed_port()));
    pacs()
        .args(["pix-query", "--config", cfg.to_str().unwrap(), "A1^^^IssuerY"])
        .assert()
        .success()
        .stdout(predicate::eq("A1^^^IssuerY\n"))
        .stderr(predicate::str::contains("no aliases found"));
}

#[test]
fn pix_query_without_issuer_skips_manager() {
    let dir = TempDir::new().unwrap();
    let cfg = write(&dir, "pacs.toml", &node_config(closed_port()));
    pacs()
        .args(["pix-query", "--config", cfg.to_str().unwrap(), "P1"])
        .assert()
        .success()
        .stdout(predicate::eq("P1\n"));
}

#[test]
fn pix_query_rejects_empty_identifier() {
    let dir = TempDir::new().unwrap();
    let cfg = write(&dir, "pacs.toml", &node_config(2575));
    pacs()
        .args(["pix-query", "--config", cfg.to_str().unwrap(), "^^^HOSP"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid patient identifier"));
}

#[test]
fn pix_query_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let cfg = write(
        &dir,
        "pacs.toml",
        "[pix]\nlocal_consumer_application = \"ARCHIVE|RADIOLOGY\"\n",
    );
    pacs()
        .args(["pix-query", "--config", cfg.to_str().unwrap(), "A1^^^IssuerY"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}
