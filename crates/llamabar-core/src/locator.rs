//! Manager executable discovery
//!
//! Same shape as the other discovery helpers in this workspace: explicit
//! override → fixed candidates → PATH scan.

use crate::error::InvokeError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name of the manager binary
pub const MANAGER_BINARY: &str = "llamacpp-manager";

/// Stateless resolver for the manager binary. Callers cache the result.
#[derive(Debug, Clone)]
pub struct ExecutableLocator {
    candidates: Vec<PathBuf>,
    binary_name: String,
    /// `None` reads `PATH` from the environment at resolve time
    path_var: Option<OsString>,
}

impl Default for ExecutableLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutableLocator {
    /// Locator with the built-in candidate list and the process `PATH`
    pub fn new() -> Self {
        Self::with_candidates(default_candidates())
    }

    pub fn with_candidates(candidates: Vec<PathBuf>) -> Self {
        Self {
            candidates,
            binary_name: MANAGER_BINARY.to_string(),
            path_var: None,
        }
    }

    /// Check `path` before every other candidate
    pub fn with_override(mut self, path: impl Into<PathBuf>) -> Self {
        self.candidates.insert(0, path.into());
        self
    }

    /// Use the given value instead of the `PATH` environment variable
    pub fn with_path_var(mut self, path_var: impl Into<OsString>) -> Self {
        self.path_var = Some(path_var.into());
        self
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Return the first executable candidate, then the first executable
    /// `<dir>/llamacpp-manager` along `PATH`.
    #[tracing::instrument(skip(self), fields(binary = %self.binary_name))]
    pub fn resolve(&self) -> Result<PathBuf, InvokeError> {
        for candidate in &self.candidates {
            if is_executable(candidate) {
                info!(path = %candidate.display(), "Found manager executable");
                return Ok(candidate.clone());
            }
            debug!(path = %candidate.display(), "Candidate not executable");
        }

        let path_var = match &self.path_var {
            Some(value) => Some(value.clone()),
            None => std::env::var_os("PATH"),
        };

        if let Some(path_var) = path_var {
            for dir in std::env::split_paths(&path_var) {
                if dir.as_os_str().is_empty() {
                    continue;
                }
                let candidate = dir.join(&self.binary_name);
                if is_executable(&candidate) {
                    info!(path = %candidate.display(), "Found manager executable on PATH");
                    return Ok(candidate);
                }
            }
        }

        debug!("Manager executable not found");
        Err(InvokeError::ExecutableNotFound)
    }
}

/// Built-in absolute locations, checked in order
pub fn default_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![
        PathBuf::from("/usr/local/bin").join(MANAGER_BINARY),
        PathBuf::from("/opt/homebrew/bin").join(MANAGER_BINARY),
    ];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".local").join("bin").join(MANAGER_BINARY));
    }
    candidates
}

/// Whether `path` is a regular file the current user could execute
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn write_file(path: &Path, mode: u32) {
        fs::write(path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn test_not_found_without_candidates_and_empty_path() {
        let locator = ExecutableLocator::with_candidates(Vec::new()).with_path_var("");
        assert!(matches!(
            locator.resolve(),
            Err(InvokeError::ExecutableNotFound)
        ));
        // stateless: same answer every time
        assert!(locator.resolve().is_err());
    }

    #[test]
    fn test_first_executable_candidate_wins() {
        let temp_dir = tempfile::tempdir().unwrap();
        let first = temp_dir.path().join("first");
        let second = temp_dir.path().join("second");
        write_file(&first, 0o755);
        write_file(&second, 0o755);

        let locator = ExecutableLocator::with_candidates(vec![
            temp_dir.path().join("missing"),
            first.clone(),
            second,
        ])
        .with_path_var("");
        assert_eq!(locator.resolve().unwrap(), first);
    }

    #[test]
    fn test_non_executable_candidate_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let plain = temp_dir.path().join("plain");
        let exec = temp_dir.path().join("exec");
        write_file(&plain, 0o644);
        write_file(&exec, 0o700);

        let locator =
            ExecutableLocator::with_candidates(vec![plain, exec.clone()]).with_path_var("");
        assert_eq!(locator.resolve().unwrap(), exec);
    }

    #[test]
    fn test_directory_is_not_executable() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(!is_executable(temp_dir.path()));
    }

    #[test]
    fn test_path_fallback() {
        let temp_dir = tempfile::tempdir().unwrap();
        let empty_dir = temp_dir.path().join("empty");
        let bin_dir = temp_dir.path().join("bin");
        fs::create_dir_all(&empty_dir).unwrap();
        fs::create_dir_all(&bin_dir).unwrap();
        let manager = bin_dir.join(MANAGER_BINARY);
        write_file(&manager, 0o755);

        let path_var = std::env::join_paths([empty_dir, bin_dir]).unwrap();
        let locator = ExecutableLocator::with_candidates(Vec::new()).with_path_var(path_var);
        assert_eq!(locator.resolve().unwrap(), manager);
    }

    #[test]
    fn test_candidates_take_priority_over_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let bin_dir = temp_dir.path().join("bin");
        fs::create_dir_all(&bin_dir).unwrap();
        write_file(&bin_dir.join(MANAGER_BINARY), 0o755);
        let pinned = temp_dir.path().join("pinned-manager");
        write_file(&pinned, 0o755);

        let locator = ExecutableLocator::with_candidates(vec![pinned.clone()])
            .with_path_var(bin_dir.into_os_string());
        assert_eq!(locator.resolve().unwrap(), pinned);
    }

    #[test]
    fn test_override_checked_first() {
        let temp_dir = tempfile::tempdir().unwrap();
        let default = temp_dir.path().join("default");
        let custom = temp_dir.path().join("custom");
        write_file(&default, 0o755);
        write_file(&custom, 0o755);

        let locator = ExecutableLocator::with_candidates(vec![default])
            .with_override(&custom)
            .with_path_var("");
        assert_eq!(locator.candidates()[0], custom);
        assert_eq!(locator.resolve().unwrap(), custom);
    }

    #[test]
    fn test_default_candidates_are_absolute() {
        let candidates = default_candidates();
        assert!(candidates.len() >= 2);
        assert!(candidates.iter().all(|p| p.is_absolute()));
        assert!(candidates.iter().all(|p| p.ends_with(MANAGER_BINARY)));
    }
}
