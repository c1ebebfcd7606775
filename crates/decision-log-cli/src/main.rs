//! Command-line access to decision record shaping.
//!
//! # Commands
//!
//! - `normalize [FILE]` - Convert a YAML or JSON document to canonical JSON
//! - `record --outcome FILE` - Build a decision record and deliver it

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use decision_log_core::{
    codec, yaml, DecisionRecord, EngineError, EvalError, EvalOutcome, Interruption,
};
use decision_log_runtime::{DecisionLogger, LoggerConfig, SinkRegistry};

/// Build and deliver policy decision log records.
#[derive(Parser)]
#[command(name = "decision-log")]
#[command(about = "Build and deliver policy decision log records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a YAML or JSON document to canonical JSON.
    ///
    /// Numbers keep their exact digits.
    Normalize {
        /// Input file (reads stdin when omitted)
        file: Option<PathBuf>,
    },

    /// Build a decision record from an evaluation outcome and deliver it.
    Record {
        /// Evaluation outcome (YAML or JSON)
        #[arg(short, long)]
        outcome: PathBuf,

        /// Attach a generic evaluation error with this message
        #[arg(short, long, conflicts_with = "cancelled")]
        error: Option<String>,

        /// Attach a query-cancelled evaluation error
        #[arg(long)]
        cancelled: bool,

        /// Request path to record
        #[arg(long)]
        path: Option<String>,

        /// Logger configuration (YAML or JSON); logging is disabled without one
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Normalize { file } => normalize(file.as_deref()),
        Commands::Record {
            outcome,
            error,
            cancelled,
            path,
            config,
        } => record(&outcome, error, cancelled, path, config.as_deref()).await,
    }
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "decision_log=info".into()),
        )
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}

fn read_input(file: Option<&Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn normalize(file: Option<&Path>) -> Result<()> {
    let input = read_input(file)?;
    let value = yaml::unmarshal(&input).context("Input is not a valid YAML or JSON document")?;
    write_json(&value)
}

async fn record(
    outcome_path: &Path,
    error: Option<String>,
    cancelled: bool,
    path: Option<String>,
    config_path: Option<&Path>,
) -> Result<()> {
    let input = read_input(Some(outcome_path))?;
    let outcome: EvalOutcome = yaml::unmarshal_as(&input)
        .with_context(|| format!("Invalid evaluation outcome in {}", outcome_path.display()))?;

    let logger = match config_path {
        Some(config_path) => {
            let config = LoggerConfig::from_file(config_path).with_context(|| {
                format!("Failed to load logger config {}", config_path.display())
            })?;
            DecisionLogger::from_config(&config, &SinkRegistry::with_defaults())?
        }
        None => DecisionLogger::disabled(),
    };

    let eval_error = match (error, cancelled) {
        (Some(message), _) => Some(EvalError::msg(message)),
        (None, true) => Some(EngineError::interrupted_by(Interruption::DeadlineExceeded).into()),
        (None, false) => None,
    };

    let mut record = DecisionRecord::new(outcome.decision_id.clone());
    record.path = path;

    if logger.is_enabled() {
        logger
            .log_decision(&mut record, &outcome, eval_error)
            .await
            .context("Failed to deliver decision record")?;
    } else {
        tracing::info!("No sink configured, decision record not delivered");
        record.populate(&outcome, eval_error);
    }

    write_json(&record)
}

fn write_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let bytes = codec::marshal_json(value)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(&bytes)?;
    stdout.write_all(b"\n")?;
    Ok(())
}
