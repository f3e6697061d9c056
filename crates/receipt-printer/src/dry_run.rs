//! A printer that logs instead of printing.

use image_processor::RasterImage;

use crate::{Printer, Result, TextStyle, ensure_printable};

/// Accepts every operation, logs it, and keeps simple counters.
#[derive(Debug, Default)]
pub struct DryRunPrinter {
    rasters: u64,
    cuts: u64,
}

impl DryRunPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rasters accepted so far.
    pub fn rasters_sent(&self) -> u64 {
        self.rasters
    }

    /// Cuts performed so far.
    pub fn cuts(&self) -> u64 {
        self.cuts
    }
}

impl Printer for DryRunPrinter {
    async fn send_raster(&mut self, image: &RasterImage) -> Result<()> {
        ensure_printable(image)?;
        self.rasters += 1;
        tracing::info!(
            width = image.width(),
            height = image.height(),
            "Raster accepted (dry run)"
        );
        Ok(())
    }

    async fn write_text(&mut self, text: &str, style: &TextStyle) -> Result<()> {
        tracing::info!(text, align = ?style.align, font = ?style.font, "Text accepted (dry run)");
        Ok(())
    }

    async fn line_feed(&mut self, lines: u8) -> Result<()> {
        tracing::debug!(lines, "Line feed (dry run)");
        Ok(())
    }

    async fn cut_paper(&mut self) -> Result<()> {
        self.cuts += 1;
        tracing::info!("Paper cut (dry run)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[tokio::test]
    async fn test_dry_run_counts_jobs() {
        let mut printer = DryRunPrinter::new();
        let img = RasterImage::monochrome(GrayImage::from_pixel(8, 8, Luma([0]))).unwrap();

        printer.send_raster(&img).await.unwrap();
        printer.write_text("footer", &TextStyle::new()).await.unwrap();
        printer.cut_paper().await.unwrap();

        assert_eq!(printer.rasters_sent(), 1);
        assert_eq!(printer.cuts(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_still_validates_rasters() {
        let mut printer = DryRunPrinter::new();
        let empty = RasterImage::grayscale(GrayImage::new(0, 0));
        assert!(printer.send_raster(&empty).await.is_err());
        assert_eq!(printer.rasters_sent(), 0);
    }
}
