//! Configuration for llamabar
//!
//! Two directories matter here:
//!
//! - the indicator's own config directory (`~/.config/llamabar` or the
//!   platform equivalent), holding `settings.yaml`
//! - the manager's config directory, which the indicator only ever opens for
//!   the user. `LLAMACPP_MANAGER_CONFIG_DIR` overrides it.

pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable naming the manager's configuration directory
pub const MANAGER_CONFIG_DIR_ENV: &str = "LLAMACPP_MANAGER_CONFIG_DIR";

/// Directory name the manager uses under the platform data dir
const MANAGER_APP_NAME: &str = "llamaCPPManager";

const SETTINGS_FILENAME: &str = "settings.yaml";

const MIN_POLL_INTERVAL_MS: u64 = 200;
/// A zero timeout would fail every invocation before it spawns
const MIN_TIMEOUT_MS: u64 = 100;

/// Indicator settings loaded from `settings.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How often the fleet status is polled
    pub poll_interval_ms: u64,

    /// Upper bound for a single `status --json` invocation
    pub status_timeout_ms: u64,

    /// Upper bound for start/stop/restart/ensure-running
    pub command_timeout_ms: u64,

    /// Explicit manager binary, checked before the built-in candidates
    pub manager_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2_000,
            status_timeout_ms: 10_000,
            command_timeout_ms: 60_000,
            manager_path: None,
        }
    }
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        // tokio's interval panics on a zero period
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms.max(MIN_TIMEOUT_MS))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms.max(MIN_TIMEOUT_MS))
    }
}

/// The indicator's config directory. Not created here.
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("llamabar");

    Ok(config_dir)
}

/// Path to `settings.yaml` inside the indicator's config directory
pub fn settings_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(SETTINGS_FILENAME))
}

/// Load settings from the default location, falling back to defaults when
/// the file does not exist.
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&settings_path()?)
}

/// Load settings from an explicit path. A missing file yields defaults.
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        debug!(path = %path.display(), "Settings file not found, using defaults");
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }

    let settings: Settings =
        serde_yaml::from_str(&content).map_err(|source| ConfigError::InvalidSettings {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), ?settings, "Loaded settings");
    Ok(settings)
}

/// The manager's configuration directory, opened by the "open config" action.
///
/// Search order:
/// 1. `LLAMACPP_MANAGER_CONFIG_DIR` (tilde expanded)
/// 2. `<data_dir>/llamaCPPManager` (`~/Library/Application Support` on macOS)
pub fn manager_config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(MANAGER_CONFIG_DIR_ENV) {
        if !dir.trim().is_empty() {
            return Ok(expand_tilde(&dir));
        }
        warn!("{} is set but empty, ignoring", MANAGER_CONFIG_DIR_ENV);
    }

    let data_dir = dirs::data_dir().ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(data_dir.join(MANAGER_APP_NAME))
}

/// Expand a leading `~` or `~/` against the home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
