//! FleetClient: the façade the indicator talks to
//!
//! Every call resolves the manager lazily and caches the path. A call that
//! fails because the cached binary vanished re-resolves once and retries,
//! which also picks up a manager installed after startup.

use crate::decoder;
use crate::error::{InvokeError, Result};
use crate::invoker::{ManagerBackend, SystemBackend};
use crate::model::FleetSnapshot;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Typed access to `llamacpp-manager` subcommands.
///
/// Generic over the backend so tests can swap in a scripted manager.
pub struct FleetClient<B = SystemBackend> {
    backend: B,
    resolved: RwLock<Option<PathBuf>>,
    status_timeout: Duration,
    command_timeout: Duration,
}

impl FleetClient<SystemBackend> {
    /// Client backed by real processes and the default locator
    pub fn system() -> Self {
        Self::new(SystemBackend::default())
    }
}

impl<B: ManagerBackend> FleetClient<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            resolved: RwLock::new(None),
            status_timeout: DEFAULT_STATUS_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Bound `status --json` and the mutating subcommands separately
    pub fn with_timeouts(mut self, status_timeout: Duration, command_timeout: Duration) -> Self {
        self.status_timeout = status_timeout;
        self.command_timeout = command_timeout;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Currently cached executable, if any
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.resolved
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Query all managed entries.
    pub async fn fetch_status(&self) -> Result<FleetSnapshot> {
        let output = self.capture(&["status", "--json"]).await?;
        let snapshot = decoder::decode(&output)?;
        debug!(
            entries = snapshot.len(),
            up = snapshot.up_count(),
            "Fetched fleet status"
        );
        Ok(snapshot)
    }

    pub async fn start(&self, name: &str) -> Result<()> {
        self.run_command(&["start", name]).await
    }

    pub async fn stop(&self, name: &str) -> Result<()> {
        self.run_command(&["stop", name]).await
    }

    pub async fn restart(&self, name: &str) -> Result<()> {
        self.run_command(&["restart", name]).await
    }

    /// Idempotent: start whatever configured entries are not running
    pub async fn ensure_running(&self) -> Result<()> {
        self.run_command(&["ensure-running"]).await
    }

    async fn run_command(&self, args: &[&str]) -> Result<()> {
        info!("Running manager command: {}", args.join(" "));
        let code = self.detached(args).await?;
        if code != 0 {
            return Err(InvokeError::NonZeroExit {
                command: args.join(" "),
                code,
            }
            .into());
        }
        Ok(())
    }

    async fn capture(&self, args: &[&str]) -> std::result::Result<String, InvokeError> {
        let path = self.executable()?;
        let timeout = self.status_timeout;
        let result = with_timeout(timeout, args, self.backend.run_capturing(&path, args)).await;

        match self.re_resolve_after(&path, &result) {
            Some(fresh) => {
                with_timeout(timeout, args, self.backend.run_capturing(&fresh, args)).await
            }
            None => result,
        }
    }

    async fn detached(&self, args: &[&str]) -> std::result::Result<i32, InvokeError> {
        let path = self.executable()?;
        let timeout = self.command_timeout;
        let result = with_timeout(timeout, args, self.backend.run_detached(&path, args)).await;

        match self.re_resolve_after(&path, &result) {
            Some(fresh) => with_timeout(timeout, args, self.backend.run_detached(&fresh, args)).await,
            None => result,
        }
    }

    /// After a not-found or spawn failure, drop the cache and return a
    /// different path worth one more attempt.
    fn re_resolve_after<T>(
        &self,
        used: &Path,
        result: &std::result::Result<T, InvokeError>,
    ) -> Option<PathBuf> {
        if !matches!(
            result,
            Err(InvokeError::ExecutableNotFound | InvokeError::SpawnFailure { .. })
        ) {
            return None;
        }

        self.invalidate();
        let fresh = self.executable().ok()?;
        if fresh.as_path() == used {
            return None;
        }
        info!(path = %fresh.display(), "Manager executable moved, retrying");
        Some(fresh)
    }

    fn executable(&self) -> std::result::Result<PathBuf, InvokeError> {
        if let Some(path) = self.resolved_path() {
            return Ok(path);
        }

        let path = self.backend.resolve()?;
        *self.resolved.write().unwrap_or_else(|e| e.into_inner()) = Some(path.clone());
        Ok(path)
    }

    fn invalidate(&self) {
        debug!("Dropping cached manager path");
        *self.resolved.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

async fn with_timeout<T>(
    timeout: Duration,
    args: &[&str],
    fut: impl Future<Output = std::result::Result<T, InvokeError>>,
) -> std::result::Result<T, InvokeError> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(InvokeError::Timeout {
            command: args.join(" "),
            timeout,
        }),
    }
}
