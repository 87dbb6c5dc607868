use colored::Colorize;
use llamabar_config::Settings;
use llamabar_core::{ExecutableLocator, FleetClient, FleetSnapshot, StatusRecord, SystemBackend};
use std::path::{Path, PathBuf};

/// Load settings from `path`, or from the default location
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let settings = match path {
        Some(path) => llamabar_config::load_settings_from(path)?,
        None => llamabar_config::load_settings()?,
    };
    Ok(settings)
}

/// Build a client from settings. The `--manager` flag wins over
/// `manager_path` from the settings file.
pub fn build_client(settings: &Settings, manager: Option<PathBuf>) -> FleetClient<SystemBackend> {
    let mut locator = ExecutableLocator::new();
    if let Some(path) = settings.manager_path.as_deref() {
        locator = locator.with_override(llamabar_config::expand_tilde(&path.to_string_lossy()));
    }
    if let Some(path) = manager {
        locator = locator.with_override(path);
    }

    FleetClient::new(SystemBackend::new(locator))
        .with_timeouts(settings.status_timeout(), settings.command_timeout())
}

pub fn print_status_table(snapshot: &FleetSnapshot) {
    if snapshot.is_empty() {
        println!("{}", "No models configured".dimmed());
        return;
    }

    println!(
        "{}",
        format!(
            "{:<2} {:<20} {:<10} {:<8} {:<22} {:>8} {:>6}",
            "", "NAME", "MODE", "PID", "ADDRESS", "LATENCY", "HTTP"
        )
        .bold()
    );
    println!("{}", "─".repeat(82).dimmed());

    for record in snapshot.iter() {
        print_status_row(record);
    }
}

fn print_status_row(record: &StatusRecord) {
    let indicator = if record.up { "●".green() } else { "●".red() };
    let pid = record
        .process_id
        .map(|p| p.to_string())
        .unwrap_or_else(|| "-".to_string());
    let latency = record
        .latency_ms
        .map(|ms| format!("{} ms", ms))
        .unwrap_or_else(|| "-".to_string());
    let http = record
        .http_status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());

    println!(
        "{} {:<20} {:<10} {:<8} {:<22} {:>8} {:>6}",
        indicator,
        record.name.cyan(),
        record.mode.as_deref().unwrap_or("-"),
        pid,
        record.address(),
        latency,
        http.dimmed()
    );
}

/// Machine-readable form of a snapshot, same shape as `status --json`
pub fn snapshot_json(snapshot: &FleetSnapshot) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(snapshot.records())?)
}
