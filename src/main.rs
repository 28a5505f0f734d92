// superdash - dashboard viewer for the terminal
//
// Reads the bootstrap payload a dashboard server embeds in its host page,
// derives the initial dashboard state and renders it with ratatui.
//
// Architecture:
// - Bootstrap: host page -> payload -> initial state -> store
// - Store: reducer + middleware (thunk for async work, devtools log)
// - Dashboard: payload types, actions, reducer
// - TUI (ratatui): chart grid with per-chart popover menus driven by
//   click-outside focus tracking over a small document model

mod bootstrap;
mod cli;
mod config;
mod dashboard;
mod demo;
mod logging;
mod store;
mod tui;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (source, headless) = match &cli.command {
        Some(Commands::Config {
            show,
            reset,
            edit,
            update,
            path,
        }) => {
            cli::handle_config(*show, *reset, *edit, *update, *path);
            return Ok(());
        }
        Some(Commands::State { source }) => (source.resolve()?, true),
        None => (cli.source.resolve()?, false),
    };

    let config = Config::from_env();
    // Keeps the log file writer alive until exit
    let setup = bootstrap::app_setup(&config, !headless);

    let data = bootstrap::load_bootstrap_data(&source, &config)?;
    let mounted = bootstrap::create_dashboard_store(&data, config.logging.is_verbose())?;

    if headless {
        let json = serde_json::to_string_pretty(&*mounted.store.state())
            .context("Failed to serialize dashboard state")?;
        println!("{}", json);
        return Ok(());
    }

    tracing::info!("Starting TUI");
    if let Err(e) = tui::run_tui(mounted, &config, setup.log_buffer.clone()).await {
        tracing::error!("TUI error: {:?}", e);
        return Err(e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
