mod commands;
mod utils;

use clap::{Parser, Subcommand};
use commands::lifecycle::Action;
use llamabar_config::Settings;
use llamabar_core::{FleetClient, SystemBackend};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "llamabar")]
#[command(about = "Watch and control llama.cpp servers through llamacpp-manager", long_about = None)]
struct Cli {
    /// Path to the llamacpp-manager executable (checked before the usual locations)
    #[arg(long, env = "LLAMABAR_MANAGER", global = true)]
    manager: Option<PathBuf>,

    /// Settings file (default: <config dir>/llamabar/settings.yaml)
    #[arg(long, env = "LLAMABAR_SETTINGS", global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the status of every managed server
    Status {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start a server
    Start {
        /// Entry name
        name: String,
    },
    /// Stop a server
    Stop {
        /// Entry name
        name: String,
    },
    /// Restart a server
    Restart {
        /// Entry name
        name: String,
    },
    /// Start every configured server that is not running
    #[command(name = "ensure-running")]
    EnsureRunning,
    /// Keep polling and redraw the status table
    Watch {
        /// Poll interval in milliseconds (default from settings)
        #[arg(short, long)]
        interval: Option<u64>,
        /// Label the table stale after this many seconds of failed polls
        #[arg(long, default_value = "30")]
        stale_after: u64,
    },
    /// Show the tail of a server's log
    Logs {
        /// Entry name
        name: String,
        /// Number of lines
        #[arg(short = 'n', long, default_value = "50")]
        lines: usize,
        /// Open the log file with the default application instead
        #[arg(long)]
        open: bool,
    },
    /// Print the manager's configuration directory
    #[command(name = "config-dir")]
    ConfigDir {
        /// Open it in the file manager
        #[arg(long)]
        open: bool,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries tables and JSON; logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let settings_path = cli.settings;
    let manager = cli.manager;
    let connect = move || -> anyhow::Result<(Settings, FleetClient<SystemBackend>)> {
        let settings = utils::load_settings(settings_path.as_deref())?;
        let client = utils::build_client(&settings, manager);
        Ok((settings, client))
    };

    match cli.command {
        Commands::Version => {
            println!("llamabar {}", env!("CARGO_PKG_VERSION"));
        }
        Commands::ConfigDir { open } => {
            commands::config::handle(open)?;
        }
        Commands::Status { json } => {
            let (_, client) = connect()?;
            commands::status::handle(&client, json).await?;
        }
        Commands::Start { name } => {
            let (_, client) = connect()?;
            commands::lifecycle::handle(&client, Action::Start(name)).await?;
        }
        Commands::Stop { name } => {
            let (_, client) = connect()?;
            commands::lifecycle::handle(&client, Action::Stop(name)).await?;
        }
        Commands::Restart { name } => {
            let (_, client) = connect()?;
            commands::lifecycle::handle(&client, Action::Restart(name)).await?;
        }
        Commands::EnsureRunning => {
            let (_, client) = connect()?;
            commands::lifecycle::handle(&client, Action::EnsureRunning).await?;
        }
        Commands::Watch {
            interval,
            stale_after,
        } => {
            let (settings, client) = connect()?;
            let interval = interval
                .map(Duration::from_millis)
                .unwrap_or_else(|| settings.poll_interval());
            commands::watch::handle(client, interval, Duration::from_secs(stale_after)).await?;
        }
        Commands::Logs { name, lines, open } => {
            let (_, client) = connect()?;
            commands::logs::handle(&client, &name, lines, open).await?;
        }
    }

    Ok(())
}
