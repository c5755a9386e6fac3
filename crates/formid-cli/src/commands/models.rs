//! Models command - download and inspect OCR models.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use futures_util::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::debug;

use formid_core::FormidConfig;

use super::load_config;

/// Arguments for the models command.
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    command: ModelsCommand,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// Download the models for the configured language
    Download(DownloadArgs),

    /// Check which model files are present
    Status(DirArgs),

    /// Remove downloaded models
    Clean(DirArgs),
}

#[derive(Args)]
struct DownloadArgs {
    /// Base URL holding the model files (overrides models.download_url)
    #[arg(long)]
    base_url: Option<String>,

    /// Force re-download even if files exist
    #[arg(long)]
    force: bool,

    #[command(flatten)]
    dir: DirArgs,
}

#[derive(Args)]
struct DirArgs {
    /// Model directory (overrides models.model_dir)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

impl DirArgs {
    fn resolve(&self, config: &FormidConfig) -> PathBuf {
        self.model_dir
            .clone()
            .unwrap_or_else(|| config.models.model_dir.clone())
    }
}

pub async fn run(args: ModelsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    match args.command {
        ModelsCommand::Download(download_args) => download_models(&config, download_args).await,
        ModelsCommand::Status(dir_args) => check_status(&config, &dir_args.resolve(&config)).map(|_| ()),
        ModelsCommand::Clean(dir_args) => clean_models(&config, &dir_args.resolve(&config)),
    }
}

fn required_files(config: &FormidConfig) -> [String; 3] {
    config.models.required_files(&config.ocr.language)
}

/// Join a base URL and a file name with exactly one slash.
fn file_url(base: &str, filename: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), filename)
}

async fn download_models(config: &FormidConfig, args: DownloadArgs) -> anyhow::Result<()> {
    let base_url = args
        .base_url
        .clone()
        .or_else(|| config.models.download_url.clone())
        .ok_or_else(|| {
            anyhow::anyhow!("No download URL configured. Pass --base-url or set models.download_url.")
        })?;

    let output_dir = args.dir.resolve(config);
    fs::create_dir_all(&output_dir)?;

    println!(
        "{} Downloading {} models to {}",
        style("ℹ").blue(),
        style(&config.ocr.language).cyan().bold(),
        output_dir.display()
    );
    println!();

    let client = reqwest::Client::builder()
        .user_agent(concat!("formid-cli/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let multi_progress = MultiProgress::new();
    let mut success_count = 0;
    let mut skip_count = 0;
    let mut error_count = 0;

    for filename in required_files(config) {
        let path = output_dir.join(&filename);

        if path.exists() && !args.force {
            println!("  {} {} (already exists)", style("✓").green(), filename);
            skip_count += 1;
            continue;
        }

        let pb = multi_progress.add(ProgressBar::new(0));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.green} {msg:<30} [{bar:25.cyan/blue}] {bytes}/{total_bytes}")
                .unwrap()
                .progress_chars("=>-"),
        );
        pb.set_message(filename.clone());

        match download_file(&client, &file_url(&base_url, &filename), &path, &pb).await {
            Ok(()) => {
                pb.finish_with_message(format!("{} {}", style("✓").green(), filename));
                success_count += 1;
            }
            Err(e) => {
                pb.finish_with_message(format!("{} {} - {}", style("✗").red(), filename, e));
                error_count += 1;
            }
        }
    }

    println!();
    println!(
        "   {} downloaded, {} already present, {} failed",
        success_count, skip_count, error_count
    );
    println!();

    if !check_status(config, &output_dir)? {
        anyhow::bail!("Model download incomplete");
    }

    Ok(())
}

async fn download_file(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
    pb: &ProgressBar,
) -> anyhow::Result<()> {
    debug!("GET {}", url);
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP {}", response.status());
    }

    if let Some(content_length) = response.content_length() {
        pb.set_length(content_length);
    }

    // Stream into a temp file, then rename into place
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    file.flush()?;
    drop(file);

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Print the state of every required file. Returns whether all are present.
fn check_status(config: &FormidConfig, model_dir: &Path) -> anyhow::Result<bool> {
    println!("{}", style("Model Status").bold());
    println!(
        "{} {} (language {})",
        style("▸").bold(),
        model_dir.display(),
        config.ocr.language
    );

    let mut all_present = true;
    let mut total_size: u64 = 0;

    for filename in required_files(config) {
        let path = model_dir.join(&filename);
        let metadata = fs::metadata(&path).ok().filter(|m| m.len() > 0);

        let (status, size_str) = match metadata {
            Some(metadata) => {
                total_size += metadata.len();
                (style("✓").green(), format_size(metadata.len()))
            }
            None => {
                all_present = false;
                (style("✗").red(), "missing".to_string())
            }
        };

        println!("    {} {:<25} {:>10}", status, filename, size_str);
    }

    if all_present {
        println!(
            "    {} Ready ({} total)",
            style("✓").green(),
            format_size(total_size)
        );
    } else {
        println!(
            "    {} Run 'formid models download' to fetch missing files",
            style("⚠").yellow()
        );
    }

    Ok(all_present)
}

fn clean_models(config: &FormidConfig, model_dir: &Path) -> anyhow::Result<()> {
    let mut total_removed = 0;
    let mut total_freed: u64 = 0;

    for filename in required_files(config) {
        let path = model_dir.join(&filename);
        if path.exists() {
            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            fs::remove_file(&path)?;
            total_removed += 1;
            total_freed += size;
            println!("  {} Removed {}", style("✓").green(), filename);
        }
    }

    if let Ok(entries) = fs::read_dir(model_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "tmp").unwrap_or(false) {
                let _ = fs::remove_file(&path);
            }
        }
    }

    if total_removed > 0 {
        println!(
            "{} Removed {} files, freed {}",
            style("✓").green(),
            total_removed,
            format_size(total_freed)
        );
    } else {
        println!("{} No model files to remove.", style("ℹ").blue());
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1}GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1}MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1}KB", bytes as f64 / 1_000.0)
    } else {
        format!("{}B", bytes)
    }
}
