use colored::Colorize;
use llamabar_core::{FleetClient, SystemBackend};

pub async fn handle(
    client: &FleetClient<SystemBackend>,
    name: &str,
    lines: usize,
    open: bool,
) -> anyhow::Result<()> {
    let snapshot = client.fetch_status().await?;
    let record = snapshot
        .get(name)
        .ok_or_else(|| anyhow::anyhow!("'{}' is not managed by llamacpp-manager", name))?;
    let log_path = record
        .log_path
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("llamacpp-manager reports no log file for '{}'", name))?;

    if open {
        open::that(log_path)?;
        println!("{} {}", "Opened".green(), log_path.display());
        return Ok(());
    }

    println!(
        "{}",
        format!("=== {} ({}) ===", name, log_path.display()).bold()
    );
    let tail = llamabar_core::tail_log(log_path, lines)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", log_path.display(), e))?;
    for line in tail {
        println!("{}", line);
    }

    Ok(())
}
