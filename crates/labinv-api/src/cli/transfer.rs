//! CSV import and export from the command line.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use labinv_core::tabular::Upload;
use labinv_types::import::ImportReport;

use crate::cli::RecordKind;
use crate::state::AppState;

/// Recorded as `created_by` on studies imported from the command line.
const CLI_ACTOR: &str = "cli";

fn spinner(message: String) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    Ok(spinner)
}

/// Import `file` with the same rules as an HTTP upload.
pub async fn import(state: &AppState, kind: RecordKind, file: &Path, json: bool) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let upload = Upload::new(file_name, bytes);
    let max = state.config.upload.max_csv_bytes;

    let progress = spinner(format!("Importing {}...", kind.label()))?;
    let result = match kind {
        RecordKind::Chemicals => state.chemical_service.import_csv(&upload, max).await,
        RecordKind::Studies => state.study_service.import_csv(&upload, max, CLI_ACTOR).await,
    };
    progress.finish_and_clear();
    let report = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    print_report(&report);
    Ok(())
}

fn print_report(report: &ImportReport) {
    println!();
    println!("  {} {}", style("✓").green().bold(), report.message);
    println!();
    println!("  Rows read:          {}", report.total_rows);
    println!("  Imported:           {}", style(report.imported).green());
    if report.skipped_existing > 0 {
        println!("  Already stored:     {}", style(report.skipped_existing).yellow());
    }
    if report.skipped_duplicates > 0 {
        println!("  Duplicates in file: {}", style(report.skipped_duplicates).yellow());
    }
    if report.invalid_rows > 0 {
        println!("  Invalid:            {}", style(report.invalid_rows).red());
    }
    if !report.issues.is_empty() {
        println!();
        println!("  {}", style("── Issues ──").dim());
        for issue in &report.issues {
            println!("  line {:>5}  {}", issue.line, issue.reason);
        }
    }
    println!();
}

/// Export every record of `kind` to `output`, or to the dated default
/// file name in the current directory.
pub async fn export(
    state: &AppState,
    kind: RecordKind,
    output: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let download = match kind {
        RecordKind::Chemicals => state.chemical_service.export_csv().await?,
        RecordKind::Studies => state.study_service.export_csv().await?,
    };
    let path = output.unwrap_or_else(|| PathBuf::from(&download.file_name));
    tokio::fs::write(&path, &download.bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "kind": kind.label(),
                "path": path.display().to_string(),
                "bytes": download.bytes.len(),
            })
        );
    } else {
        println!(
            "  {} Exported {} to {}",
            style("✓").green().bold(),
            kind.label(),
            style(path.display()).cyan()
        );
    }
    Ok(())
}
