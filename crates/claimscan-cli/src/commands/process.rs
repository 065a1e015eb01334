//! Process command - extract fields from a single invoice.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use claimscan_core::{OutcomeStatus, PaymentCategory, ResultTable};

use crate::output::{self, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Payment category of the document
    #[arg(long, default_value = "OD Repair Cost")]
    category: PaymentCategory,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = super::load_config(config_path)?;

    if !args.input.is_file() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let outcomes = super::extract_files(&config, vec![(args.input.clone(), args.category)]).await?;

    let table = ResultTable::from_outcomes(&outcomes, &config.extraction.fields);
    let rendered = output::render(&table, args.format)?;
    super::write_output(&rendered, args.output.as_deref())?;

    debug!("Total processing time: {:?}", start.elapsed());

    match outcomes.first().map(|o| &o.status) {
        Some(OutcomeStatus::Failed { error, feedback }) => {
            if let Some(feedback) = feedback {
                eprintln!("{} Service feedback: {}", style("ℹ").blue(), feedback);
            }
            anyhow::bail!("Failed to extract data: {}", error)
        }
        _ => Ok(()),
    }
}
