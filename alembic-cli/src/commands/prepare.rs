//! Dataset preparation
//!
//! Scans engine game logs for game-state records and shapes them into a
//! labeling-ready dataset: filter out uninteresting snapshots, cluster
//! near-duplicates down to representatives, then enlarge with perturbed
//! variants.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use tracing::info;

use alembic_core::domain::Dataset;
use alembic_doom::state::GameState;
use alembic_doom::{RelevanceFilter, clusterer, perturbator};

#[derive(Args)]
pub struct PrepareArgs {
    /// Directory containing engine game logs
    #[arg(long)]
    game_logs: PathBuf,

    /// Output dataset file
    #[arg(long)]
    out: PathBuf,

    /// Keep uninteresting snapshots
    #[arg(long)]
    no_filter: bool,

    /// Keep near-duplicate snapshots
    #[arg(long)]
    no_cluster: bool,

    /// Do not enlarge the dataset with perturbed variants
    #[arg(long)]
    no_perturb: bool,
}

pub fn run(args: PrepareArgs) -> Result<()> {
    let mut dataset = load_game_states(&args.game_logs)?;
    println!("{} {} game state(s)", "Parsed".bold(), dataset.len());

    if !args.no_filter {
        dataset = dataset.apply(&RelevanceFilter);
        info!(remaining = dataset.len(), "applied relevance filter");
        println!("{} {} state(s) after filtering", "Kept".bold(), dataset.len());
    }

    if !args.no_cluster {
        dataset = dataset.apply(&clusterer());
        info!(remaining = dataset.len(), "clustered to representatives");
        println!("{} {} cluster center(s)", "Kept".bold(), dataset.len());
    }

    if !args.no_perturb {
        dataset = dataset.apply(&perturbator());
        info!(total = dataset.len(), "perturbed dataset");
        println!("{} {} perturbed state(s)", "Produced".bold(), dataset.len());
    }

    dataset
        .save(&args.out)
        .with_context(|| format!("cannot save dataset to {}", args.out.display()))?;

    println!(
        "{} {} state(s) to {}",
        "Saved".green().bold(),
        dataset.len(),
        args.out.display()
    );

    Ok(())
}

/// Reads every log file in the directory, in path order so item indices
/// are reproducible across runs
fn load_game_states(dir: &PathBuf) -> Result<Dataset<GameState>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("cannot read game-log directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut dataset = Dataset::new();
    for path in paths {
        let file =
            File::open(&path).with_context(|| format!("cannot open {}", path.display()))?;
        for line in BufReader::new(file).lines() {
            let line = line.with_context(|| format!("cannot read {}", path.display()))?;
            if let Some(state) = GameState::from_log_line(&line) {
                dataset.push(state);
            }
        }
    }

    Ok(dataset)
}
