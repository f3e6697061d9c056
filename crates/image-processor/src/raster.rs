//! Owned raster images tagged with their color mode.

use image::GrayImage;

use crate::{ImageProcessError, Result};

/// Sample interpretation of a [`RasterImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// 8-bit luminance, any value in 0..=255.
    Grayscale8,
    /// Black/white only: every sample is exactly 0 or 255.
    Monochrome1,
}

/// A width x height grid of 8-bit samples whose values always match its mode.
///
/// Stages take these by value, so a consumed input cannot be observed again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    mode: ColorMode,
    pixels: GrayImage,
}

impl RasterImage {
    /// Wrap a grayscale buffer. Every `u8` is a valid grayscale sample.
    pub fn grayscale(pixels: GrayImage) -> Self {
        Self {
            mode: ColorMode::Grayscale8,
            pixels,
        }
    }

    /// Wrap a buffer as monochrome, rejecting any sample other than 0 or 255.
    pub fn monochrome(pixels: GrayImage) -> Result<Self> {
        if let Some((x, y, value)) = pixels
            .enumerate_pixels()
            .map(|(x, y, p)| (x, y, p.0[0]))
            .find(|&(_, _, v)| v != 0 && v != 255)
        {
            return Err(ImageProcessError::InvalidInput(format!(
                "pixel ({x}, {y}) = {value} is not black or white"
            )));
        }
        Ok(Self::monochrome_unchecked(pixels))
    }

    /// Caller guarantees every sample is 0 or 255.
    pub(crate) fn monochrome_unchecked(pixels: GrayImage) -> Self {
        Self {
            mode: ColorMode::Monochrome1,
            pixels,
        }
    }

    /// Build a grayscale raster from row-major rows. Rows must share one length.
    pub fn from_rows(rows: &[&[u8]]) -> Result<Self> {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len()) as u32;
        if rows.iter().any(|r| r.len() as u32 != width) {
            return Err(ImageProcessError::InvalidInput(
                "rows have differing lengths".into(),
            ));
        }
        let samples: Vec<u8> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        GrayImage::from_raw(width, height, samples)
            .map(Self::grayscale)
            .ok_or_else(|| ImageProcessError::InvalidInput("row buffer size mismatch".into()))
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// True when either dimension is zero.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Sample at (x, y). Panics when out of bounds, like `GrayImage::get_pixel`.
    pub fn sample(&self, x: u32, y: u32) -> u8 {
        self.pixels.get_pixel(x, y).0[0]
    }

    /// Whether (x, y) should be burned by a thermal head (a dark sample).
    pub fn is_black(&self, x: u32, y: u32) -> bool {
        self.sample(x, y) < 128
    }

    /// Row-major samples.
    pub fn samples(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.pixels
    }

    pub fn into_gray(self) -> GrayImage {
        self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_monochrome_rejects_gray_samples() {
        let mut img = GrayImage::from_pixel(3, 2, Luma([255]));
        img.put_pixel(1, 1, Luma([128]));
        let err = RasterImage::monochrome(img).unwrap_err();
        assert!(err.to_string().contains("(1, 1) = 128"));
    }

    #[test]
    fn test_monochrome_accepts_black_and_white() {
        let mut img = GrayImage::from_pixel(2, 2, Luma([0]));
        img.put_pixel(0, 1, Luma([255]));
        let raster = RasterImage::monochrome(img).unwrap();
        assert_eq!(raster.mode(), ColorMode::Monochrome1);
        assert!(raster.is_black(0, 0));
        assert!(!raster.is_black(0, 1));
    }

    #[test]
    fn test_from_rows_layout() {
        let raster = RasterImage::from_rows(&[&[1, 2, 3], &[4, 5, 6]]).unwrap();
        assert_eq!(raster.dimensions(), (3, 2));
        assert_eq!(raster.mode(), ColorMode::Grayscale8);
        assert_eq!(raster.sample(2, 0), 3);
        assert_eq!(raster.sample(0, 1), 4);
    }

    #[test]
    fn test_from_rows_ragged_is_rejected() {
        assert!(RasterImage::from_rows(&[&[1, 2], &[3]]).is_err());
    }

    #[test]
    fn test_empty_raster() {
        let raster = RasterImage::grayscale(GrayImage::new(0, 4));
        assert!(raster.is_empty());
    }
}
