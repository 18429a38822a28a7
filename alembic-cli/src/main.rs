//! Alembic CLI
//!
//! Command-line interface for the game-state labeling pipeline:
//! `prepare` turns engine logs into a dataset, `label` runs the dataset
//! through the external inference service.

mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "alembic")]
#[command(about = "Game-state dataset preparation and batch labeling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    handle_command(cli.command).await
}
