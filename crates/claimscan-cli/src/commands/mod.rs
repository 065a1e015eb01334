//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod process;
pub mod prompt;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use claimscan_core::{
    BatchProcessor, ClaimsConfig, GeminiClient, OutcomeStatus, PaymentCategory, ProcessingOutcome,
};

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("claimscan")
        .join("config.json")
}

/// Path the command should read and write configuration at.
pub fn config_location(config_path: Option<&str>) -> PathBuf {
    config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path)
}

/// Load configuration from `--config`, the default path, or built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ClaimsConfig> {
    let path = config_location(config_path);

    let config = if path.exists() {
        debug!("Loading configuration from {}", path.display());
        ClaimsConfig::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?
    } else if config_path.is_some() {
        anyhow::bail!("Config file not found: {}", path.display());
    } else {
        ClaimsConfig::default()
    };

    config.validate()?;
    Ok(config)
}

/// Build the extraction client and run every file through it, in order.
///
/// The client is created once, so a missing API key stops the run before
/// any document is sent. Files are read as the batch reaches them; one that
/// cannot be read becomes a failure row.
pub async fn extract_files(
    config: &ClaimsConfig,
    files: Vec<(PathBuf, PaymentCategory)>,
) -> anyhow::Result<Vec<ProcessingOutcome>> {
    let client = GeminiClient::from_config(config)?;
    let processor = BatchProcessor::new(Arc::new(client), &config.batch);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let outcomes = processor
        .process_files_with(files, |_, outcome| {
            if let OutcomeStatus::Failed { error, feedback } = &outcome.status {
                pb.println(format!(
                    "{} {}: {}",
                    style("⚠").yellow(),
                    outcome.filename,
                    error
                ));
                if let Some(feedback) = feedback {
                    pb.println(format!("    Service feedback: {}", feedback));
                }
            }
            pb.set_message(outcome.filename.clone());
            pb.inc(1);
        })
        .await;

    pb.finish_and_clear();
    Ok(outcomes)
}

/// Write rendered output to a file, or stdout when no file is given.
pub fn write_output(content: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Output written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", content),
    }
    Ok(())
}
