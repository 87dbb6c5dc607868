#![allow(dead_code)]

use async_trait::async_trait;
use llamabar_core::{InvokeError, ManagerBackend};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::time::Duration;

pub const ONE_RUNNING: &str =
    r#"[{"name":"m1","host":"127.0.0.1","port":8081,"up":true,"latency_ms":5}]"#;

/// In-memory stand-in for llamacpp-manager. Mutating commands only record
/// the call; the status output changes only when a test says so.
pub struct FakeManager {
    location: Mutex<Option<PathBuf>>,
    vanished: Mutex<HashSet<PathBuf>>,
    status: Mutex<String>,
    exit_code: AtomicI32,
    delay: Mutex<Option<Duration>>,
    resolves: AtomicUsize,
    calls: Mutex<Vec<(PathBuf, Vec<String>)>>,
}

impl FakeManager {
    pub fn new() -> Self {
        Self {
            location: Mutex::new(Some(PathBuf::from("/fake/bin/llamacpp-manager"))),
            vanished: Mutex::new(HashSet::new()),
            status: Mutex::new(String::new()),
            exit_code: AtomicI32::new(0),
            delay: Mutex::new(None),
            resolves: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_status(self, status: &str) -> Self {
        self.set_status(status);
        self
    }

    pub fn set_status(&self, status: &str) {
        *self.status.lock().unwrap() = status.to_string();
    }

    pub fn set_exit_code(&self, code: i32) {
        self.exit_code.store(code, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Where `resolve` finds the binary; `None` means not installed
    pub fn install_at(&self, location: Option<&str>) {
        *self.location.lock().unwrap() = location.map(PathBuf::from);
    }

    /// Invocations at `path` now fail as if the file was deleted
    pub fn vanish(&self, path: &str) {
        self.vanished.lock().unwrap().insert(PathBuf::from(path));
    }

    pub fn resolve_count(&self) -> usize {
        self.resolves.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_args(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|(_, args)| args.join(" "))
            .collect()
    }

    async fn enter(&self, path: &Path, args: &[&str]) -> Result<(), InvokeError> {
        self.calls.lock().unwrap().push((
            path.to_path_buf(),
            args.iter().map(|a| a.to_string()).collect(),
        ));
        if self.vanished.lock().unwrap().contains(path) {
            return Err(InvokeError::ExecutableNotFound);
        }
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

#[async_trait]
impl ManagerBackend for FakeManager {
    fn resolve(&self) -> Result<PathBuf, InvokeError> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        self.location
            .lock()
            .unwrap()
            .clone()
            .ok_or(InvokeError::ExecutableNotFound)
    }

    async fn run_detached(&self, path: &Path, args: &[&str]) -> Result<i32, InvokeError> {
        self.enter(path, args).await?;
        Ok(self.exit_code.load(Ordering::SeqCst))
    }

    async fn run_capturing(&self, path: &Path, args: &[&str]) -> Result<String, InvokeError> {
        self.enter(path, args).await?;
        Ok(self.status.lock().unwrap().clone())
    }
}
