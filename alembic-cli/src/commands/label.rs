//! Dataset labeling
//!
//! Loads a prepared dataset, elicits labels from the inference service
//! through the orchestrator, and persists the ordered output plus the
//! parsed user commands. Ctrl-C cancels the run; whatever was already
//! collected is still written out.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::*;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use alembic_client::{BatchBackend, InlineBackend, JobBackend, ServiceClient};
use alembic_core::domain::{ChunkBound, Dataset};
use alembic_doom::state::GameState;
use alembic_doom::{build_full_prompt, parse_user_commands, save_user_commands};
use alembic_orchestrator::{Orchestrator, RequestTemplate, RunConfig, RunOutcome, RunReport};

/// How inference requests reach the service
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Mode {
    /// One asynchronous batch job per chunk
    Batch,
    /// One synchronous call per item
    Inline,
}

#[derive(Args)]
pub struct LabelArgs {
    /// Prepared dataset file (output of `prepare`)
    #[arg(long)]
    dataset: PathBuf,

    /// Directory for run artifacts (request payloads, outputs)
    #[arg(long)]
    out_dir: PathBuf,

    /// Processing mode
    #[arg(long, value_enum, default_value_t = Mode::Batch)]
    mode: Mode,

    /// Inference service base URL
    #[arg(long, env = "SERVICE_URL", default_value = "https://api.openai.com")]
    service_url: String,

    /// Inference service API key
    #[arg(long, env = "SERVICE_API_KEY")]
    api_key: Option<String>,

    /// Teacher model to elicit labels from
    #[arg(long)]
    model: String,

    /// File containing the base elicitation prompt
    #[arg(long)]
    prompt_file: PathBuf,

    /// JSON file with values for <tag> placeholders in the prompt
    #[arg(long)]
    prompt_data: Option<PathBuf>,

    /// Fixed number of items per chunk (overrides the token budget)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Token budget per job, used with --estimated-tokens-per-item
    #[arg(long)]
    max_tokens_per_job: Option<u64>,

    /// Estimated tokens per request, for token-budget chunking
    #[arg(long, default_value_t = 500)]
    estimated_tokens_per_item: u64,

    /// Seconds between job status queries
    #[arg(long, default_value_t = 60)]
    poll_interval_secs: u64,

    /// Maximum seconds to wait for a single job
    #[arg(long, default_value_t = 86_400)]
    max_wait_secs: u64,

    /// Maximum tokens in each model response
    #[arg(long, default_value_t = 256)]
    max_output_tokens: u32,

    /// Sampling temperature (pass-through, no service guarantee)
    #[arg(long, default_value_t = 1.0)]
    temperature: f32,

    /// Pause between item calls in inline mode, in milliseconds
    #[arg(long, default_value_t = 0)]
    request_delay_ms: u64,
}

pub async fn run(args: LabelArgs) -> Result<()> {
    let dataset: Dataset<GameState> = Dataset::load(&args.dataset)
        .with_context(|| format!("cannot load dataset from {}", args.dataset.display()))?;
    println!(
        "{} {} state(s) from {}",
        "Loaded".bold(),
        dataset.len(),
        args.dataset.display()
    );

    let base_prompt = std::fs::read_to_string(&args.prompt_file)
        .with_context(|| format!("cannot read prompt from {}", args.prompt_file.display()))?;
    let system_prompt = match &args.prompt_data {
        Some(path) => build_full_prompt(&base_prompt, path)?,
        None => base_prompt,
    };

    let chunk_bound = match (args.chunk_size, args.max_tokens_per_job) {
        (Some(items), _) => ChunkBound::Items(items),
        (None, Some(max_tokens_per_job)) => ChunkBound::TokenBudget {
            max_tokens_per_job,
            estimated_tokens_per_item: args.estimated_tokens_per_item,
        },
        (None, None) => ChunkBound::Items(100),
    };

    let template = RequestTemplate::new(&args.model, system_prompt)
        .with_max_output_tokens(args.max_output_tokens)
        .with_temperature(args.temperature);

    let client = ServiceClient::new(&args.service_url, args.api_key.clone());
    let backend: Arc<dyn JobBackend> = match args.mode {
        Mode::Batch => Arc::new(BatchBackend::new(
            client,
            args.out_dir.join("requests"),
            template.endpoint.clone(),
        )),
        Mode::Inline => Arc::new(InlineBackend::new(
            client,
            Duration::from_millis(args.request_delay_ms),
        )),
    };

    let config = RunConfig::new(chunk_bound, template)
        .with_poll_interval(Duration::from_secs(args.poll_interval_secs))
        .with_max_wait(Duration::from_secs(args.max_wait_secs));

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("cannot create {}", args.out_dir.display()))?;

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("cancellation requested; collected chunks will still be written");
            ctrl_c_cancel.cancel();
        }
    });

    let orchestrator = Orchestrator::new(backend, config);
    let report = orchestrator.run(&dataset, &cancel).await;

    let output_path = args.out_dir.join("ordered-output.json");
    let output_file = File::create(&output_path)
        .with_context(|| format!("cannot create {}", output_path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(output_file), &report.output)
        .with_context(|| format!("cannot write {}", output_path.display()))?;

    let commands = parse_user_commands(&report.output);
    let commands_path = args.out_dir.join("user-commands.json");
    save_user_commands(&commands_path, &commands)?;

    print_summary(&report, commands.len());

    match report.outcome {
        RunOutcome::Completed | RunOutcome::Cancelled { .. } => Ok(()),
        RunOutcome::Failed { error, .. } => {
            Err(anyhow::Error::new(error).context("labeling run failed"))
        }
    }
}

fn print_summary(report: &RunReport, command_count: usize) {
    let elapsed = (report.finished_at - report.started_at).num_seconds();
    let missing = report.output.missing_count();

    println!();
    println!("{}", "Run summary".bold());
    println!("  run id:        {}", report.run_id);
    println!("  elapsed:       {elapsed}s");
    println!(
        "  items:         {} labeled, {} missing",
        report.output.filled_count().to_string().green(),
        if missing > 0 {
            missing.to_string().red().to_string()
        } else {
            missing.to_string()
        }
    );
    println!("  user commands: {command_count}");

    match &report.outcome {
        RunOutcome::Completed => {
            println!("  outcome:       {}", "completed".green().bold());
        }
        RunOutcome::Cancelled { completed_chunks } => {
            println!(
                "  outcome:       {} after {} collected chunk(s)",
                "cancelled".yellow().bold(),
                completed_chunks
            );
        }
        RunOutcome::Failed {
            completed_chunks,
            error,
        } => {
            println!(
                "  outcome:       {} after {} collected chunk(s): {}",
                "failed".red().bold(),
                completed_chunks,
                error
            );
        }
    }
}
