//! llamacpp-manager invocation
//!
//! [`ManagerBackend`] is the narrow capability the client needs from the
//! outside world. [`SystemBackend`] is the real implementation; tests plug
//! in fakes.

use crate::error::InvokeError;
use crate::locator::ExecutableLocator;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Exit code reported when the child was terminated by a signal
pub const SIGNAL_EXIT_CODE: i32 = -1;

#[async_trait]
pub trait ManagerBackend: Send + Sync {
    /// Resolve the manager executable
    fn resolve(&self) -> Result<PathBuf, InvokeError>;

    /// Run and wait for exit; returns the raw exit code
    async fn run_detached(&self, path: &Path, args: &[&str]) -> Result<i32, InvokeError>;

    /// Run, wait for exit and return stdout as text
    async fn run_capturing(&self, path: &Path, args: &[&str]) -> Result<String, InvokeError>;
}

/// Spawns real child processes with `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct SystemBackend {
    locator: ExecutableLocator,
}

impl SystemBackend {
    pub fn new(locator: ExecutableLocator) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &ExecutableLocator {
        &self.locator
    }

    fn command(path: &Path, args: &[&str]) -> Command {
        let mut cmd = Command::new(path);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        // an outer timeout drops the future; the child must not outlive it
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl ManagerBackend for SystemBackend {
    fn resolve(&self) -> Result<PathBuf, InvokeError> {
        self.locator.resolve()
    }

    async fn run_detached(&self, path: &Path, args: &[&str]) -> Result<i32, InvokeError> {
        let mut cmd = Self::command(path, args);
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::piped());

        debug!("Running: {} {}", path.display(), args.join(" "));

        let output = cmd.output().await.map_err(|e| spawn_error(path, e))?;
        let code = output.status.code().unwrap_or(SIGNAL_EXIT_CODE);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(code, stderr = %stderr.trim(), "`{}` failed", args.join(" "));
        }

        Ok(code)
    }

    async fn run_capturing(&self, path: &Path, args: &[&str]) -> Result<String, InvokeError> {
        let mut cmd = Self::command(path, args);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        debug!("Running: {} {}", path.display(), args.join(" "));

        let output = cmd.output().await.map_err(|e| spawn_error(path, e))?;

        if !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(stderr = %stderr.trim(), "Manager wrote to stderr");
        }

        if !output.status.success() {
            return Err(InvokeError::NonZeroExit {
                command: args.join(" "),
                code: output.status.code().unwrap_or(SIGNAL_EXIT_CODE),
            });
        }

        // Non-UTF-8 output counts as "no data"
        Ok(String::from_utf8(output.stdout).unwrap_or_default())
    }
}

fn spawn_error(path: &Path, source: std::io::Error) -> InvokeError {
    if source.kind() == std::io::ErrorKind::NotFound {
        debug!(path = %path.display(), "Executable disappeared before spawn");
        InvokeError::ExecutableNotFound
    } else {
        InvokeError::SpawnFailure {
            path: path.to_path_buf(),
            source,
        }
    }
}
