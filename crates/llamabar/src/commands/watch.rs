use crate::utils;
use chrono::{Local, Utc};
use colored::Colorize;
use llamabar_core::{FleetClient, PollState, PollerView, StatusPoller, SystemBackend};
use std::io::{IsTerminal, Write};
use std::sync::Arc;
use std::time::Duration;

const MIN_INTERVAL: Duration = Duration::from_millis(200);

pub async fn handle(
    client: FleetClient<SystemBackend>,
    interval: Duration,
    stale_after: Duration,
) -> anyhow::Result<()> {
    let interval = interval.max(MIN_INTERVAL);
    let poller = StatusPoller::new(Arc::new(client));
    let mut rx = poller.subscribe();

    println!(
        "{}",
        format!("Watching every {} ms (Ctrl+C to quit)", interval.as_millis()).dimmed()
    );
    poller.start(interval);

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = rx.borrow_and_update().clone();
                if matches!(view.state, PollState::Updated | PollState::Stalled) {
                    render(&view, stale_after)?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    poller.stop();
    tracing::debug!(stats = ?poller.stats(), "Watch finished");
    Ok(())
}

fn render(view: &PollerView, stale_after: Duration) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    if stdout.is_terminal() {
        // clear screen, cursor home
        write!(stdout, "\x1B[2J\x1B[H")?;
        stdout.flush()?;
    }

    match &view.snapshot {
        Some(snapshot) => {
            let updated = snapshot.captured_at().with_timezone(&Local);
            println!(
                "{} {}  {}",
                "Updated".dimmed(),
                updated.format("%H:%M:%S"),
                format!("{}/{} up", snapshot.up_count(), snapshot.len()).bold()
            );
            println!();
            utils::print_status_table(snapshot);
        }
        None => {
            println!("{}", "Waiting for the first successful status query...".dimmed());
        }
    }

    if view.is_stalled() {
        println!();
        let reason = view.last_error.as_deref().unwrap_or("unknown error");
        if view.is_stale(stale_after, Utc::now()) {
            println!(
                "{} {} ({} failed polls)",
                "⚠ Stale:".red().bold(),
                reason,
                view.consecutive_failures
            );
        } else {
            println!("{} {}", "⚠ Status query failed:".yellow(), reason);
        }
    }

    Ok(())
}
