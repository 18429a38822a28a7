//! Command handlers

pub mod label;
pub mod prepare;

use anyhow::Result;
use clap::Subcommand;

/// Top-level subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Prepare a dataset from engine game logs (filter, cluster, perturb)
    Prepare(prepare::PrepareArgs),
    /// Label a prepared dataset through the inference service
    Label(label::LabelArgs),
}

/// Routes subcommands to their handlers
pub async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Prepare(args) => prepare::run(args),
        Commands::Label(args) => label::run(args).await,
    }
}
