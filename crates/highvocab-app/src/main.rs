use std::sync::Arc;

use clap::Parser;
use highvocab_config::Config;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod controller;
pub mod page;
pub mod state;
pub mod storage;

#[cfg(test)]
mod tests;

use self::cli::Cli;
use self::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::new(),
    };
    if let Some(path) = &cli.store {
        config.storage.path = path.clone();
    }
    tracing::debug!("Using storage at {}", config.storage.path.display());

    let state = Arc::new(AppState::new(config));
    cli::run(cli, state).await
}

/// `RUST_LOG` filter, `info` by default; colors only on a terminal.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_writer(std::io::stderr)
        .try_init();
}
