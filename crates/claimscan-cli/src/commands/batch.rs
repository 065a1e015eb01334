//! Batch command - extract fields from many invoices into one table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use console::style;
use glob::glob;
use serde::Deserialize;
use tracing::{debug, warn};

use claimscan_core::{BatchSummary, PaymentCategory, ProcessingOutcome, ResultTable};

use crate::output::{self, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input PDF files or glob patterns, processed in the order given
    #[arg(required_unless_present = "manifest")]
    inputs: Vec<String>,

    /// Payment category for files without an explicit assignment
    #[arg(long, default_value = "OD Repair Cost")]
    category: PaymentCategory,

    /// Assign a category to a file by name, e.g. "invoice.pdf=TPPD Repair Cost"
    #[arg(short, long = "assign", value_name = "FILE=CATEGORY")]
    assign: Vec<String>,

    /// CSV manifest with `file,category` columns
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of documents extracted concurrently (overrides config)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Exit with an error status when any document fails
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Deserialize)]
struct ManifestRow {
    file: String,
    category: String,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    if let Some(jobs) = args.jobs {
        if jobs == 0 {
            anyhow::bail!("--jobs must be at least 1");
        }
        config.batch.concurrency = jobs;
    }

    let assignments = parse_assignments(&args.assign)?;
    let mut files = Vec::new();

    if let Some(manifest) = &args.manifest {
        files.extend(read_manifest(manifest)?);
    }

    for path in expand_inputs(&args.inputs)? {
        let category = category_for(&path, &assignments).unwrap_or(args.category);
        files.push((path, category));
    }

    if files.is_empty() {
        anyhow::bail!("No matching PDF files found");
    }

    // Explicit assignments also override manifest entries
    for (path, category) in files.iter_mut() {
        if let Some(assigned) = category_for(path, &assignments) {
            *category = assigned;
        }
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let outcomes = super::extract_files(&config, files).await?;

    let table = ResultTable::from_outcomes(&outcomes, &config.extraction.fields);
    let rendered = output::render(&table, args.format)?;
    super::write_output(&rendered, args.output.as_deref())?;

    let summary = BatchSummary::from_outcomes(&outcomes);
    print_summary(&summary, &outcomes, start);

    if args.strict && summary.failed > 0 {
        anyhow::bail!(
            "{} of {} documents failed extraction",
            summary.failed,
            summary.total
        );
    }

    Ok(())
}

/// Parse `FILE=CATEGORY` pairs.
fn parse_assignments(raw: &[String]) -> anyhow::Result<HashMap<String, PaymentCategory>> {
    let mut assignments = HashMap::new();

    for entry in raw {
        let (file, category) = entry
            .rsplit_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid assignment (expected FILE=CATEGORY): {}", entry))?;

        let category: PaymentCategory = category.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        assignments.insert(file.trim().to_string(), category);
    }

    Ok(assignments)
}

/// Category assigned to `path`, matched on the path as given or its file name.
fn category_for(path: &Path, assignments: &HashMap<String, PaymentCategory>) -> Option<PaymentCategory> {
    let full = path.to_string_lossy();
    if let Some(category) = assignments.get(full.as_ref()) {
        return Some(*category);
    }

    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|name| assignments.get(name))
        .copied()
}

/// Expand inputs into files. Literal paths must exist; patterns keep only PDFs.
fn expand_inputs(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if !input.contains(['*', '?', '[']) {
            let path = PathBuf::from(input);
            if !path.is_file() {
                anyhow::bail!("Input file not found: {}", input);
            }
            files.push(path);
            continue;
        }

        let matched: Vec<PathBuf> = glob(input)?
            .filter_map(|r| r.ok())
            .filter(|p| is_pdf(p))
            .collect();

        if matched.is_empty() {
            warn!("No PDF files match {}", input);
        }
        debug!("Pattern {} matched {} files", input, matched.len());
        files.extend(matched);
    }

    Ok(files)
}

fn is_pdf(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// Read a `file,category` manifest. Relative paths resolve against the
/// manifest's directory.
fn read_manifest(path: &Path) -> anyhow::Result<Vec<(PathBuf, PaymentCategory)>> {
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open manifest {}", path.display()))?;

    let mut files = Vec::new();
    for (line, row) in reader.deserialize::<ManifestRow>().enumerate() {
        let row = row.with_context(|| format!("Invalid manifest row {}", line + 2))?;
        let category: PaymentCategory = row
            .category
            .parse()
            .map_err(|e: String| anyhow::anyhow!("Manifest row {}: {}", line + 2, e))?;

        let file = PathBuf::from(&row.file);
        let file = if file.is_absolute() { file } else { base.join(file) };
        if !file.is_file() {
            anyhow::bail!("Manifest row {}: file not found: {}", line + 2, file.display());
        }

        files.push((file, category));
    }

    Ok(files)
}

fn print_summary(summary: &BatchSummary, outcomes: &[ProcessingOutcome], start: Instant) {
    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        summary.total,
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(summary.succeeded).green(),
        style(summary.failed).red()
    );

    if summary.failed > 0 {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for outcome in outcomes.iter().filter(|o| !o.is_success()) {
            eprintln!(
                "  - {}: {}",
                outcome.filename,
                outcome.error().unwrap_or("unknown error")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignments() {
        let assignments = parse_assignments(&[
            "a.pdf=TPPD Repair Cost".to_string(),
            "dir/b.pdf = windscreen".to_string(),
        ])
        .unwrap();

        assert_eq!(assignments["a.pdf"], PaymentCategory::TppdRepairCost);
        assert_eq!(assignments["dir/b.pdf"], PaymentCategory::WindscreenRepairCost);
        assert!(parse_assignments(&["a.pdf".to_string()]).is_err());
        assert!(parse_assignments(&["a.pdf=Engine".to_string()]).is_err());
    }

    #[test]
    fn test_category_for_matches_file_name() {
        let assignments = parse_assignments(&["b.pdf=tppd".to_string()]).unwrap();

        assert_eq!(
            category_for(Path::new("/tmp/claims/b.pdf"), &assignments),
            Some(PaymentCategory::TppdRepairCost)
        );
        assert_eq!(category_for(Path::new("/tmp/claims/a.pdf"), &assignments), None);
    }

    #[test]
    fn test_manifest_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("two.pdf"), b"%PDF-1.4").unwrap();
        let manifest = dir.path().join("manifest.csv");
        std::fs::write(&manifest, "file,category\none.pdf,OD Repair Cost\ntwo.pdf, tppd\n").unwrap();

        let files = read_manifest(&manifest).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0].0, dir.path().join("one.pdf"));
        assert_eq!(files[1].1, PaymentCategory::TppdRepairCost);
    }

    #[test]
    fn test_manifest_rejects_unknown_category() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("one.pdf"), b"%PDF-1.4").unwrap();
        let manifest = dir.path().join("manifest.csv");
        std::fs::write(&manifest, "file,category\none.pdf,Hail Damage\n").unwrap();

        assert!(read_manifest(&manifest).is_err());
    }

    #[test]
    fn test_expand_inputs_keeps_order_and_filters_patterns() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.pdf", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"%PDF-1.4").unwrap();
        }

        let literal = dir.path().join("b.pdf").to_string_lossy().to_string();
        let pattern = dir.path().join("*").to_string_lossy().to_string();
        let files = expand_inputs(&[literal, pattern]).unwrap();

        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["b.pdf", "a.pdf", "b.pdf"]);

        assert!(expand_inputs(&["/definitely/missing.pdf".to_string()]).is_err());
    }
}
