use crate::utils;
use colored::Colorize;
use llamabar_core::{FleetClient, SystemBackend};

pub enum Action {
    Start(String),
    Stop(String),
    Restart(String),
    EnsureRunning,
}

impl Action {
    fn describe(&self) -> String {
        match self {
            Action::Start(name) => format!("Starting '{}'", name),
            Action::Stop(name) => format!("Stopping '{}'", name),
            Action::Restart(name) => format!("Restarting '{}'", name),
            Action::EnsureRunning => "Ensuring all configured servers are running".to_string(),
        }
    }
}

pub async fn handle(client: &FleetClient<SystemBackend>, action: Action) -> anyhow::Result<()> {
    println!("{}", format!("{}...", action.describe()).blue());

    match &action {
        Action::Start(name) => client.start(name).await?,
        Action::Stop(name) => client.stop(name).await?,
        Action::Restart(name) => client.restart(name).await?,
        Action::EnsureRunning => client.ensure_running().await?,
    }
    println!("{}", "✓ Done".green().bold());

    // The manager is the source of truth: ask it again rather than assume.
    // Its state may still lag behind the command that just returned.
    match client.fetch_status().await {
        Ok(snapshot) => {
            println!();
            utils::print_status_table(&snapshot);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Status refresh after command failed");
            println!("{} {}", "Could not refresh status:".yellow(), e);
        }
    }

    Ok(())
}
