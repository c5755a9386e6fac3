//! Batch processing command for multiple PDF files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use formid_core::{ExtractionResult, FailureKind};

use super::process::{CSV_HEADER, OutputFormat, csv_row, format_result};
use super::{PipelineArgs, build_pipeline, is_pdf, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory (default: next to each input file)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue when a file fails
    #[arg(long)]
    continue_on_error: bool,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

/// Outcome of one file.
struct FileResult {
    path: PathBuf,
    result: ExtractionResult,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_pdf(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pipeline = build_pipeline(config, &args.pipeline)?;

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let source = path.display().to_string();

        let result = match fs::read(&path) {
            Ok(data) => pipeline.process_named(Some(&source), &data),
            Err(e) => ExtractionResult::failed(FailureKind::InputUnreadable, e.to_string(), false, Some(source)),
        };

        let output_path = record_path(&path, args.output_dir.as_deref(), args.format);
        fs::write(&output_path, format_result(&result, args.format)?)?;
        debug!("Wrote output to {}", output_path.display());

        let processing_time_ms = file_start.elapsed().as_millis() as u64;
        overall_pb.inc(1);

        if let (Some(kind), Some(message)) = (result.failure, result.error.clone()) {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", path.display(), message);
            } else {
                overall_pb.abandon();
                error!("Failed to process {}: {}", path.display(), message);
                anyhow::bail!("Processing failed for {}: {}: {}", path.display(), kind, message);
            }
        }

        results.push(FileResult {
            path,
            result,
            processing_time_ms,
        });
    }

    overall_pb.finish_with_message("Complete");

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<_> = results.iter().filter(|r| !r.result.is_success()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for file in &failed {
            println!(
                "  - {}: {}",
                file.path.display(),
                file.result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Where the record for `input` is written: beside it, or in `output_dir`.
fn record_path(input: &Path, output_dir: Option<&Path>, format: OutputFormat) -> PathBuf {
    let file_name = format!(
        "{}.{}",
        input.file_stem().and_then(|s| s.to_str()).unwrap_or("form"),
        format.extension()
    );

    match output_dir {
        Some(dir) => dir.join(file_name),
        None => input.with_file_name(file_name),
    }
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["filename"];
    header.extend(CSV_HEADER);
    header.push("processing_time_ms");
    wtr.write_record(&header)?;

    for file in results {
        let filename = file.path.file_name().and_then(|s| s.to_str()).unwrap_or("");

        let mut row = vec![filename.to_string()];
        row.extend(csv_row(&file.result));
        row.push(file.processing_time_ms.to_string());
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_path() {
        assert_eq!(
            record_path(Path::new("scans/I-485.pdf"), None, OutputFormat::Json),
            PathBuf::from("scans/I-485.json")
        );
        assert_eq!(
            record_path(Path::new("scans/I-485.PDF"), Some(Path::new("out")), OutputFormat::Text),
            PathBuf::from("out/I-485.txt")
        );
    }
}
