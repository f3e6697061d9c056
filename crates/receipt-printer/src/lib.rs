//! Receipt printer collaborator.
//!
//! Defines the narrow [`Printer`] contract the kiosk pipeline talks to and
//! ships three implementations: ESC/POS printers reached over TCP or a
//! serial line, and a dry-run printer that only logs. The transport is chosen once, when the
//! [`PrinterHandle`] is built.

use std::future::Future;

use image_processor::RasterImage;

pub mod dry_run;
pub mod escpos;
pub mod network;
pub mod serial;
pub mod style;

// Re-exports for convenience
pub use dry_run::DryRunPrinter;
pub use escpos::EscPosWriter;
pub use network::NetworkPrinter;
pub use serial::SerialPrinter;
pub use style::{Align, Font, TextStyle};

/// Default raw-print TCP port used by network receipt printers.
pub const DEFAULT_PORT: u16 = 9100;

/// Errors that can occur during printer operations.
#[derive(Debug, thiserror::Error)]
pub enum PrinterError {
    #[error("Printer connection error: {0}")]
    Connection(String),

    #[error("Connection timeout after {0} seconds")]
    ConnectionTimeout(u64),

    #[error("Printer write error: {0}")]
    Write(#[from] std::io::Error),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },

    #[error("Image is not black and white")]
    NotBlackWhite,
}

/// Result type alias for printer operations.
pub type Result<T> = std::result::Result<T, PrinterError>;

/// Operations the pipeline needs from a receipt printer.
///
/// Implementations own their transport; callers never open or close it.
pub trait Printer: Send {
    /// Print a `Monochrome1` raster.
    fn send_raster(&mut self, image: &RasterImage) -> impl Future<Output = Result<()>> + Send;

    /// Print one line of text in the given style.
    fn write_text(
        &mut self,
        text: &str,
        style: &TextStyle,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Advance the paper by `lines` text lines.
    fn line_feed(&mut self, lines: u8) -> impl Future<Output = Result<()>> + Send;

    /// Cut the paper.
    fn cut_paper(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// The printer selected at startup, shared by every job in the process.
#[derive(Debug)]
pub enum PrinterHandle {
    Network(NetworkPrinter),
    Serial(SerialPrinter),
    DryRun(DryRunPrinter),
}

impl PrinterHandle {
    /// Human-readable transport name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Serial(_) => "serial",
            Self::DryRun(_) => "dry-run",
        }
    }
}

impl Printer for PrinterHandle {
    async fn send_raster(&mut self, image: &RasterImage) -> Result<()> {
        match self {
            Self::Network(p) => p.send_raster(image).await,
            Self::Serial(p) => p.send_raster(image).await,
            Self::DryRun(p) => p.send_raster(image).await,
        }
    }

    async fn write_text(&mut self, text: &str, style: &TextStyle) -> Result<()> {
        match self {
            Self::Network(p) => p.write_text(text, style).await,
            Self::Serial(p) => p.write_text(text, style).await,
            Self::DryRun(p) => p.write_text(text, style).await,
        }
    }

    async fn line_feed(&mut self, lines: u8) -> Result<()> {
        match self {
            Self::Network(p) => p.line_feed(lines).await,
            Self::Serial(p) => p.line_feed(lines).await,
            Self::DryRun(p) => p.line_feed(lines).await,
        }
    }

    async fn cut_paper(&mut self) -> Result<()> {
        match self {
            Self::Network(p) => p.cut_paper().await,
            Self::Serial(p) => p.cut_paper().await,
            Self::DryRun(p) => p.cut_paper().await,
        }
    }
}

/// Check a raster is printable: non-empty and strictly black/white.
pub(crate) fn ensure_printable(image: &RasterImage) -> Result<()> {
    if image.is_empty() {
        let (width, height) = image.dimensions();
        return Err(PrinterError::InvalidImageSize { width, height });
    }
    if image.mode() != image_processor::ColorMode::Monochrome1 {
        return Err(PrinterError::NotBlackWhite);
    }
    Ok(())
}
