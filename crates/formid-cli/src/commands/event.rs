//! Event command - replay an S3 notification against a document store.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use formid_handler::{DocumentStore, EventHandler, LocalDocumentStore, S3DocumentStore};

use super::{PipelineArgs, build_pipeline, load_config};

/// Arguments for the event command.
#[derive(Args)]
pub struct EventArgs {
    /// S3 event notification JSON file
    #[arg(required = true)]
    event: PathBuf,

    /// Serve objects from this directory (`<root>/<bucket>/<key>`) instead of S3
    #[arg(long)]
    local_root: Option<PathBuf>,

    /// Prefix for written records (overrides store.output_prefix)
    #[arg(long)]
    output_prefix: Option<String>,

    #[command(flatten)]
    pipeline: PipelineArgs,
}

pub async fn run(args: EventArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.event.exists() {
        anyhow::bail!("Event file not found: {}", args.event.display());
    }
    let json = fs::read_to_string(&args.event)?;

    let store: Box<dyn DocumentStore> = match &args.local_root {
        Some(root) => Box::new(LocalDocumentStore::new(root)),
        None => Box::new(S3DocumentStore::from_env(&config.store)?),
    };
    info!("Using {} store", store.name());

    let output_prefix = args
        .output_prefix
        .clone()
        .unwrap_or_else(|| config.store.output_prefix.clone());
    let pipeline = build_pipeline(config, &args.pipeline)?;
    let handler = EventHandler::new(pipeline, store, output_prefix);

    let response = handler.handle_json(&json).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if response.status_code != 200 {
        anyhow::bail!("One or more objects failed (status {})", response.status_code);
    }

    println!("{} Event handled", style("✓").green());
    Ok(())
}
