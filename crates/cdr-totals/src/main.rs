mod bootstrap;

use anyhow::Result;
use cdr_core::settings::{OutputFormat, Settings};
use cdr_report::report::{render_json, render_text};
use cdr_runtime::pipeline::{Pipeline, PipelineConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("cdr-totals v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Input: {}, workers: {}, queue depth: {}",
        settings.infile.display(),
        settings.worker_count(),
        settings.queue_depth
    );

    let config = PipelineConfig {
        workers: settings.worker_count(),
        queue_depth: settings.queue_depth,
        ..PipelineConfig::default()
    };

    // Any failure here exits non-zero before anything is written to stdout.
    let outcome = Pipeline::new(config).run_path(&settings.infile).await?;

    match settings.format {
        OutputFormat::Table => print!("{}", render_text(&outcome.totals)),
        OutputFormat::Json => println!("{}", render_json(&outcome)?),
    }

    Ok(())
}
