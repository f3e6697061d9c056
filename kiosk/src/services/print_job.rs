//! Print orchestration for one processed artifact.
//!
//! Two printer stages run in order and fail independently:
//! 1. send-image: the artifact raster;
//! 2. footer: feed, footer text, feed, cut.
//!
//! A failed image send is logged and the footer still runs so the paper is
//! cut and the kiosk is ready for the next photo.

use std::path::{Path, PathBuf};

use image_processor::{ImageProcessError, load_artifact};
use receipt_printer::{Align, Font, Printer, PrinterError, TextStyle};

/// Lines fed between the image and the footer text.
const FOOTER_LEAD_LINES: u8 = 2;

/// Lines fed after the footer text, before the cut.
const FOOTER_TRAIL_LINES: u8 = 1;

/// Errors from a single print job. None of them stop the watcher.
#[derive(Debug, thiserror::Error)]
pub enum PrintError {
    #[error("Failed to load artifact {}: {source}", path.display())]
    LoadArtifact {
        path: PathBuf,
        #[source]
        source: ImageProcessError,
    },

    #[error("Send-image stage failed: {0}")]
    SendImage(#[source] PrinterError),

    #[error("Footer stage failed: {0}")]
    Footer(#[source] PrinterError),

    #[error("Send-image stage failed: {image}; footer also failed: {footer}")]
    Both {
        image: PrinterError,
        footer: PrinterError,
    },
}

/// What is printed under each photo.
#[derive(Debug, Clone)]
pub struct Footer {
    pub text: String,
    pub style: TextStyle,
}

impl Footer {
    /// Centered, font A, double width and height.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::new()
                .with_align(Align::Center)
                .with_font(Font::A)
                .with_size(2, 2),
        }
    }
}

/// Print the artifact at `artifact_path`, then the footer, then cut.
pub async fn run<P: Printer>(
    printer: &mut P,
    artifact_path: &Path,
    footer: &Footer,
) -> Result<(), PrintError> {
    let image = load_artifact(artifact_path).map_err(|source| PrintError::LoadArtifact {
        path: artifact_path.to_path_buf(),
        source,
    })?;

    let image_result = printer.send_raster(&image).await;
    match &image_result {
        Ok(()) => tracing::info!(artifact = %artifact_path.display(), "Image printed"),
        Err(e) => tracing::error!(artifact = %artifact_path.display(), error = %e, "Error printing image"),
    }

    let footer_result = print_footer(printer, footer).await;
    if let Err(e) = &footer_result {
        tracing::error!(error = %e, "Error printing footer");
    }

    finalize_stage_results(image_result, footer_result)
}

async fn print_footer<P: Printer>(printer: &mut P, footer: &Footer) -> Result<(), PrinterError> {
    printer.line_feed(FOOTER_LEAD_LINES).await?;
    if !footer.text.is_empty() {
        printer.write_text(&footer.text, &footer.style).await?;
        printer.line_feed(FOOTER_TRAIL_LINES).await?;
    }
    printer.cut_paper().await
}

fn finalize_stage_results(
    image_result: Result<(), PrinterError>,
    footer_result: Result<(), PrinterError>,
) -> Result<(), PrintError> {
    match (image_result, footer_result) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(image), Ok(())) => Err(PrintError::SendImage(image)),
        (Ok(()), Err(footer)) => Err(PrintError::Footer(footer)),
        (Err(image), Err(footer)) => Err(PrintError::Both { image, footer }),
    }
}
