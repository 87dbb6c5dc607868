use crate::utils;
use llamabar_core::{FleetClient, SystemBackend};

pub async fn handle(client: &FleetClient<SystemBackend>, json: bool) -> anyhow::Result<()> {
    let snapshot = client.fetch_status().await?;

    if json {
        println!("{}", utils::snapshot_json(&snapshot)?);
    } else {
        utils::print_status_table(&snapshot);
    }

    Ok(())
}
