//! csvjob CLI - create jobs, run files locally, inspect the ledger

mod local;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use csvjob_core::application::CreateJobService;
use csvjob_core::config::{AppConfig, IdempotencyBackend};
use csvjob_core::domain::{JobId, LedgerStatus, ObjectLocation};
use csvjob_core::port::id_provider::UuidProvider;
use csvjob_core::port::time_provider::SystemTimeProvider;
use csvjob_core::port::{IdempotencyStore, TimeProvider};
use csvjob_daemon::{telemetry, wiring};
use std::path::PathBuf;
use std::sync::Arc;
use tabled::{Table, Tabled};

#[derive(Parser)]
#[command(name = "csvjob")]
#[command(about = "Effectively-once CSV job pipeline", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish one job per uploaded object
    Create {
        /// Input bucket (defaults to INPUT_BUCKET)
        #[arg(short, long)]
        bucket: Option<String>,

        /// Object keys; each must end in .csv
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Process a local file end to end in memory and print the result JSON
    Local {
        /// Path to a CSV file
        path: PathBuf,
    },

    /// Show the ledger entry for a job (IDP_MODE=DURABLE)
    Status {
        /// Job ID
        job_id: String,
    },
}

#[derive(Tabled)]
struct CreatedJob {
    job_id: String,
    input: String,
    output: String,
}

#[derive(Tabled)]
struct LedgerRow {
    job_id: String,
    status: String,
    checksum: String,
    output: String,
}

impl LedgerRow {
    fn new(job_id: &JobId, status: &LedgerStatus) -> Self {
        let (checksum, output) = match status {
            LedgerStatus::Absent => (None, None),
            LedgerStatus::InProgress { checksum } => (checksum.clone(), None),
            LedgerStatus::Completed { checksum, output } => {
                (Some(checksum.clone()), Some(output.to_string()))
            }
        };
        Self {
            job_id: job_id.to_string(),
            status: status.label().to_string(),
            checksum: checksum.unwrap_or_else(|| "-".to_string()),
            output: output.unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = telemetry::init_cli_logging()?;
    let config = AppConfig::from_env().context("Invalid configuration")?;

    match cli.command {
        Commands::Create { bucket, keys } => {
            let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
            let queue = wiring::build_queue(&config, time_provider.clone()).await?;
            let creator = CreateJobService::new(
                queue,
                Arc::new(UuidProvider),
                time_provider,
                config.require_output_bucket()?,
            )?;

            let bucket = match bucket {
                Some(bucket) => bucket,
                None => config.require_input_bucket()?.to_string(),
            };
            let inputs = keys
                .iter()
                .map(|key| ObjectLocation::new(bucket.as_str(), key.as_str()))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            let output_bucket = config.require_output_bucket()?;

            let mut rows = Vec::with_capacity(inputs.len());
            for input in &inputs {
                let job_id = creator.create_job(input).await?;
                rows.push(CreatedJob {
                    job_id: job_id.to_string(),
                    input: input.to_string(),
                    output: ObjectLocation::output_for(output_bucket, &job_id)?.to_string(),
                });
            }

            println!(
                "{}",
                format!("✓ {} job(s) created", rows.len()).green().bold()
            );
            println!();
            println!("{}", Table::new(rows));
        }

        Commands::Local { path } => {
            let output_bucket = config
                .output_bucket
                .as_deref()
                .unwrap_or(local::LOCAL_OUTPUT_BUCKET);
            let json = local::run_local(&path, output_bucket, config.exclude_header).await?;
            println!("{}", json);
        }

        Commands::Status { job_id } => {
            if config.idempotency_backend != IdempotencyBackend::Durable {
                bail!("status needs IDP_MODE=DURABLE; the in-memory ledger lives inside the worker");
            }
            let job_id: JobId = job_id.parse()?;
            let ledger = wiring::build_ledger(&config, Arc::new(SystemTimeProvider)).await?;
            let status = ledger.status(&job_id).await?;

            let headline = match &status {
                LedgerStatus::Completed { .. } => status.label().green().bold(),
                LedgerStatus::InProgress { .. } => status.label().yellow().bold(),
                LedgerStatus::Absent => status.label().dimmed(),
            };
            println!("{} {}", "Job".bold(), headline);
            println!();
            println!("{}", Table::new(vec![LedgerRow::new(&job_id, &status)]));

            if matches!(status, LedgerStatus::InProgress { .. }) {
                println!();
                println!(
                    "  {} A worker holds this job. If that worker died, the entry must be cleared by hand.",
                    "!".yellow()
                );
            }
        }
    }

    Ok(())
}
