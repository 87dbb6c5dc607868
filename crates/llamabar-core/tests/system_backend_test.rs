//! Runs the client against a shell-script stand-in for llamacpp-manager

#![cfg(unix)]

use llamabar_core::{ErrorKind, ExecutableLocator, FleetClient, MANAGER_BINARY, SystemBackend};
use serial_test::serial;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::TempDir;

struct ScriptManager {
    dir: TempDir,
}

impl ScriptManager {
    /// Install a fake manager whose `status --json` prints `status_body`
    fn new(status_body: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let calls = dir.path().join("calls.log");
        let script = format!(
            r#"#!/bin/sh
echo "$@" >> "{calls}"
case "$1" in
  status)
    echo "status: scanning pid files" >&2
    {status_body}
    ;;
  start|stop|restart)
    if [ "$2" = "broken" ]; then
      echo "error: model '$2' not found" >&2
      exit 2
    fi
    ;;
  ensure-running)
    ;;
  *)
    exit 64
    ;;
esac
"#,
            calls = calls.display(),
        );

        let bin_dir = dir.path().join("bin");
        fs::create_dir_all(&bin_dir).unwrap();
        let path = bin_dir.join(MANAGER_BINARY);
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        Self { dir }
    }

    fn bin_dir(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    fn client(&self) -> FleetClient<SystemBackend> {
        let locator =
            ExecutableLocator::with_candidates(Vec::new()).with_path_var(self.bin_dir().into_os_string());
        FleetClient::new(SystemBackend::new(locator))
    }

    fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn echo_json(json: &str) -> String {
    format!("echo '{}'", json)
}

#[tokio::test]
#[serial]
async fn test_status_through_real_process() {
    let manager = ScriptManager::new(&echo_json(
        r#"[{"name":"m1","pid":4242,"host":"127.0.0.1","port":8081,"up":true,"latency_ms":5,"http_status":200,"version":"llama.cpp","mode":"direct","log_path":"/tmp/m1.log"}]"#,
    ));
    let client = manager.client();

    let snapshot = client.fetch_status().await.unwrap();
    assert_eq!(snapshot.len(), 1);
    let m1 = snapshot.get("m1").unwrap();
    assert_eq!(m1.process_id, Some(4242));
    assert_eq!(m1.mode.as_deref(), Some("direct"));
    assert_eq!(m1.log_path.as_deref(), Some(Path::new("/tmp/m1.log")));

    assert_eq!(
        client.resolved_path().unwrap(),
        manager.bin_dir().join(MANAGER_BINARY)
    );
    assert_eq!(manager.calls(), vec!["status --json"]);
}

#[tokio::test]
#[serial]
async fn test_lifecycle_commands_through_real_process() {
    let manager = ScriptManager::new(&echo_json("[]"));
    let client = manager.client();

    client.start("m1").await.unwrap();
    client.restart("m1").await.unwrap();
    client.stop("m1").await.unwrap();
    client.ensure_running().await.unwrap();

    let err = client.start("broken").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NonZeroExit);

    assert_eq!(
        manager.calls(),
        vec![
            "start m1",
            "restart m1",
            "stop m1",
            "ensure-running",
            "start broken"
        ]
    );
}

#[tokio::test]
#[serial]
async fn test_empty_status_output() {
    let manager = ScriptManager::new(":");
    assert!(manager.client().fetch_status().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_non_utf8_output_treated_as_empty() {
    let manager = ScriptManager::new(r"printf '\377\376\375'");
    assert!(manager.client().fetch_status().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn test_failing_status_is_non_zero_exit() {
    let manager = ScriptManager::new("echo 'Traceback' >&2; exit 1");
    let err = manager.client().fetch_status().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NonZeroExit);
}

#[tokio::test]
#[serial]
async fn test_hung_status_is_bounded() {
    let manager = ScriptManager::new("sleep 30");
    let client = manager
        .client()
        .with_timeouts(Duration::from_millis(300), Duration::from_secs(5));

    let started = Instant::now();
    let err = client.fetch_status().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
#[serial]
async fn test_missing_manager_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let locator =
        ExecutableLocator::with_candidates(Vec::new()).with_path_var(dir.path().as_os_str());
    let client = FleetClient::new(SystemBackend::new(locator));

    let err = client.fetch_status().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExecutableNotFound);
}
