//! Process command - extract identity fields from a single PDF.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use formid_core::{ExtractionResult, Status};

use super::{PipelineArgs, build_pipeline, is_pdf, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON record
    Json,
    /// CSV with a header row
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// File extension for records written in this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if !is_pdf(&args.input) {
        anyhow::bail!("Unsupported file format: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    pb.set_message("Loading pipeline...");
    let pipeline = build_pipeline(config, &args.pipeline)?;

    pb.set_message("Extracting fields...");
    let data = fs::read(&args.input)?;
    let source = args.input.display().to_string();
    let result = pipeline.process_named(Some(&source), &data);

    pb.finish_and_clear();

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    if let (Some(kind), Some(message)) = (result.failure, result.error.as_deref()) {
        anyhow::bail!("{}: {}", kind, message);
    }

    Ok(())
}

/// Render a record in the requested format.
pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(result.to_json_pretty()?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

/// Column names of CSV records.
pub const CSV_HEADER: [&str; 9] = [
    "FormNumber",
    "A-Number",
    "LastName",
    "FirstName",
    "MiddleName",
    "Status",
    "UsedOCR",
    "ErrorKind",
    "Error",
];

/// One CSV row matching [`CSV_HEADER`].
pub fn csv_row(result: &ExtractionResult) -> [String; 9] {
    let fields = &result.fields;
    [
        fields.form_number.clone(),
        fields.a_number.clone(),
        fields.last_name.clone(),
        fields.first_name.clone(),
        fields.middle_name.clone(),
        status_name(result.status).to_string(),
        result.used_ocr.to_string(),
        result.failure.map(|k| k.to_string()).unwrap_or_default(),
        result.error.clone().unwrap_or_default(),
    ]
}

pub fn status_name(status: Status) -> &'static str {
    match status {
        Status::Processed => "Processed",
        Status::Error => "Error",
    }
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(CSV_HEADER)?;
    wtr.write_record(csv_row(result))?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(result: &ExtractionResult) -> String {
    let value = |v: &str| if v.is_empty() { "-".to_string() } else { v.to_string() };
    let fields = &result.fields;
    let mut output = String::new();

    output.push_str(&format!("Form number:  {}\n", value(&fields.form_number)));
    output.push_str(&format!("A-Number:     {}\n", value(&fields.a_number)));
    output.push_str(&format!("Last name:    {}\n", value(&fields.last_name)));
    output.push_str(&format!("First name:   {}\n", value(&fields.first_name)));
    output.push_str(&format!("Middle name:  {}\n", value(&fields.middle_name)));
    output.push('\n');

    let text_source = if result.used_ocr { "OCR" } else { "embedded text" };
    output.push_str(&format!("Status: {} ({})\n", status_name(result.status), text_source));
    if let (Some(kind), Some(message)) = (result.failure, &result.error) {
        output.push_str(&format!("Error: {}: {}\n", kind, message));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use formid_core::{FailureKind, FieldRecord};

    fn record() -> ExtractionResult {
        ExtractionResult::processed(
            FieldRecord {
                form_number: "I-485".to_string(),
                a_number: "123456789".to_string(),
                last_name: "Garcia".to_string(),
                first_name: "Maria".to_string(),
                middle_name: String::new(),
            },
            true,
            None,
        )
    }

    #[test]
    fn test_format_csv() {
        let csv = format_result(&record(), OutputFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("FormNumber,A-Number,LastName,FirstName,MiddleName,Status,UsedOCR,ErrorKind,Error")
        );
        assert_eq!(lines.next(), Some("I-485,123456789,Garcia,Maria,,Processed,true,,"));
    }

    #[test]
    fn test_format_text() {
        let text = format_result(&record(), OutputFormat::Text).unwrap();
        assert!(text.contains("A-Number:     123456789"));
        assert!(text.contains("Middle name:  -"));
        assert!(text.contains("Status: Processed (OCR)"));

        let failed = ExtractionResult::failed(FailureKind::OcrUnavailable, "no engine", false, None);
        let text = format_result(&failed, OutputFormat::Text).unwrap();
        assert!(text.contains("Error: ocr_unavailable: no engine"));
    }
}
