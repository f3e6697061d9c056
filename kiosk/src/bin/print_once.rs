//! One-shot mode: normalize a single photo and print it.
//!
//! Usage: `print-once <image>`. Exits non-zero if any step fails.

use std::path::PathBuf;

use anyhow::Context;
use image_processor::normalize;
use kiosk_lib::services::print_job::{self, Footer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kiosk_lib::init_tracing();

    let source = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: print-once <image>")?;

    let config = kiosk_lib::init_foundation()?;
    let options = config.normalize_options();
    let input = source.clone();
    let artifact = tokio::task::spawn_blocking(move || normalize(&input, &options))
        .await?
        .with_context(|| format!("failed to process {}", source.display()))?;
    tracing::info!(artifact = %artifact.path().display(), "Image processed");

    let mut printer = kiosk_lib::build_printer(&config).await;
    print_job::run(&mut printer, artifact.path(), &Footer::new(config.footer_text.clone()))
        .await
        .context("print failed")?;

    tracing::info!("Printed {}", source.display());
    Ok(())
}
