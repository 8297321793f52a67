//! Subprocess invocation and result log tests
//!
//! Uses `/bin/sh` so no toolchain binaries are needed.

use std::fs;

use serde_json::json;
use sysio_harness::{ErrorPolicy, HarnessConfig, Session};
use sysio_harness_common::Error;
use tempfile::TempDir;

fn session(dir: &TempDir) -> Session {
    Session::open(
        HarnessConfig::default()
            .with_log_root(dir.path())
            .with_bin_dir(dir.path().join("bin"))
            .with_run_name("subprocess"),
    )
}

#[test]
fn test_check_output_records_both_streams() {
    let dir = TempDir::new().unwrap();
    let session = session(&dir);

    let out = session
        .check_output(&["sh", "-c", "echo out; echo err >&2"], false)
        .unwrap();
    assert_eq!(out, "out\n");

    let log = fs::read_to_string(session.subprocess_log().path()).unwrap();
    assert!(log.starts_with("=================================================================\nstart={"));
    assert!(log.contains("cmd={sh -c echo out; echo err >&2}\n"));
    assert!(log.contains("cout={out\n}\ncerr={err\n}\nstop={"));
}

#[test]
fn test_failed_command_is_logged_and_reported() {
    let dir = TempDir::new().unwrap();
    let session = session(&dir);
    let argv = ["sh", "-c", "echo boom >&2; exit 4"];

    let err = session.check_output(&argv, false).unwrap_err();
    match &err {
        Error::Process { code, stderr, .. } => {
            assert_eq!(*code, Some(4));
            assert_eq!(stderr, "boom\n");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.exit_code(), Some(4));

    // ignored failures hand back stderr
    assert_eq!(session.check_output(&argv, true).unwrap(), "boom\n");

    let log = fs::read_to_string(session.subprocess_log().path()).unwrap();
    assert_eq!(log.matches("cerr={boom\n}").count(), 2);
}

#[test]
fn test_missing_program_is_spawn_error() {
    let dir = TempDir::new().unwrap();
    let session = session(&dir);
    let result = session.check_output(&["/nonexistent/clio", "get", "info"], false);
    assert!(matches!(result, Err(Error::Spawn { .. })));
}

#[test]
fn test_run_cmd_return_json_extracts_embedded_document() {
    let dir = TempDir::new().unwrap();
    let session = session(&dir);
    let value = session
        .run_cmd_return_json(r#"sh -c 'echo "head {\"a\": [1, 2]} tail"'"#, false, true)
        .unwrap();
    assert_eq!(value, json!({"a": [1, 2]}));
}

#[test]
fn test_run_cmd_return_json_without_document() {
    let dir = TempDir::new().unwrap();
    let session = session(&dir);
    let result = session.run_cmd_return_json("echo nothing here", false, true);
    assert!(matches!(result, Err(Error::EmptyJson)));
}

#[test]
fn test_run_cmd_return_str_splits_quotes() {
    let dir = TempDir::new().unwrap();
    let session = session(&dir);
    let out = session
        .run_cmd_return_str("printf '%s|' 'a b' c", false, false)
        .unwrap();
    assert_eq!(out, "a b|c|");
}

#[test]
fn test_client_command_prefix() {
    let dir = TempDir::new().unwrap();
    let session = Session::open(
        HarnessConfig::default()
            .with_log_root(dir.path())
            .with_bin_dir("/opt/sysio/bin"),
    );
    assert_eq!(
        session.client_command(&["get", "info"]),
        vec!["/opt/sysio/bin/clio", "--no-auto-kiod", "get", "info"]
    );
}

#[test]
fn test_util_spawn_failure_propagates() {
    let dir = TempDir::new().unwrap();
    let session = session(&dir);
    // bin/sys-util does not exist: spawn failures always propagate
    let result = session.process_util_cmd("block-log smoke-test", "smoke test", &ErrorPolicy::silent());
    assert!(matches!(result, Err(Error::Spawn { .. })));
}
