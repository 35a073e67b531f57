// src/main.rs — Chronos entry point

use clap::Parser;
use std::sync::Arc;

use chronos::cli::{self, Cli, Commands};
use chronos::client::HttpSimulationClient;
use chronos::infra::config::{Config, StorageBackend};
use chronos::infra::{logger, paths};

#[tokio::main]
async fn main() {
    // Initialize logging (respects RUST_LOG)
    logger::init_logging("warn");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no config.toml)
    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    cli.apply_overrides(&mut config);

    if config.storage.backend == StorageBackend::Sqlite && config.storage.path.is_none() {
        paths::ensure_dirs()?;
    }

    match &cli.command {
        Some(Commands::Sessions) => cli::sessions::run_list(&config),
        Some(Commands::Show { id }) => cli::sessions::run_show(&config, id),
        Some(Commands::Delete { id }) => cli::sessions::run_delete(&config, id),
        Some(Commands::Play { file }) => cli::play::run_play(&config, file).await,
        Some(Commands::Chat) | None => {
            let api = Arc::new(HttpSimulationClient::new(&config.api)?);
            tracing::info!("Simulation service at {}", api.base_url());
            cli::chat::run_chat(&config, api).await
        }
    }
}
