//! Subcommands and the pieces they share.

pub mod batch;
pub mod config;
pub mod event;
pub mod models;
pub mod process;

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::debug;

use formid_core::{FormPipeline, FormidConfig};

/// Pipeline options shared by the commands that process documents.
#[derive(Args, Clone, Debug)]
pub struct PipelineArgs {
    /// Model directory (overrides models.model_dir)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip OCR and use only the embedded text layer
    #[arg(long)]
    text_only: bool,
}

/// Load the config named by `-c`, else the user config file, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FormidConfig> {
    let path = match config_path {
        Some(path) => PathBuf::from(path),
        None => {
            let path = config::default_config_path();
            if !path.exists() {
                return Ok(FormidConfig::default());
            }
            path
        }
    };

    debug!("Loading config from {}", path.display());
    FormidConfig::from_file(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))
}

/// Build the extraction pipeline, loading OCR models unless `--text-only`.
pub fn build_pipeline(mut config: FormidConfig, args: &PipelineArgs) -> anyhow::Result<FormPipeline> {
    if let Some(model_dir) = &args.model_dir {
        config.models.model_dir = model_dir.clone();
    }

    let mut builder = FormPipeline::builder().config(config);
    if !args.text_only {
        builder = builder.load_ocr_models();
    }

    Ok(builder.build()?)
}

/// Whether a path names a PDF by extension.
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}
