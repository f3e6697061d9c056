//! Halftoning: converting grayscale rasters to black-and-white.
//!
//! Provides Floyd-Steinberg error-diffusion dithering and simple threshold conversion.

use tracing::debug;

use crate::{ColorMode, ImageProcessError, RasterImage, Result};

/// Quantization threshold: accumulated values strictly above it become white.
const THRESHOLD: f64 = 128.0;

// Diffusion weights for the not-yet-visited neighbours.
const EAST: f64 = 7.0 / 16.0;
const SOUTH_WEST: f64 = 3.0 / 16.0;
const SOUTH: f64 = 5.0 / 16.0;
const SOUTH_EAST: f64 = 1.0 / 16.0;

/// How a grayscale raster is reduced to black and white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Halftone {
    /// Floyd-Steinberg error diffusion.
    #[default]
    FloydSteinberg,
    /// Hard cut: samples `>= threshold` become white, the rest black.
    Threshold(u8),
}

impl Halftone {
    /// Apply this halftone to a grayscale raster.
    pub fn apply(self, image: RasterImage) -> Result<RasterImage> {
        match self {
            Self::FloydSteinberg => floyd_steinberg_dither(image),
            Self::Threshold(threshold) => threshold_convert(image, threshold),
        }
    }
}

/// Apply Floyd-Steinberg dithering to a grayscale image.
///
/// Pixels are visited row-major, left to right, top to bottom. Each
/// accumulated value is quantized to 255 if it is above 128, else 0, and the
/// difference is pushed onto unvisited neighbours:
/// - Right:        7/16
/// - Bottom-left:  3/16
/// - Bottom:       5/16
/// - Bottom-right: 1/16
///
/// Neighbours outside the raster are skipped. The accumulator is `f64` so
/// rounding does not compound along the diffusion chain; the output is
/// always exactly 0 or 255.
///
/// Fails with [`ImageProcessError::InvalidInput`] on an empty raster or on a
/// raster that is not [`ColorMode::Grayscale8`].
pub fn floyd_steinberg_dither(image: RasterImage) -> Result<RasterImage> {
    ensure_ditherable(&image)?;
    let (width, height) = image.dimensions();
    debug!(width, height, "Applying Floyd-Steinberg dithering");

    let w = width as usize;
    let h = height as usize;
    let mut pixels = image.into_gray();
    let mut buffer: Vec<f64> = pixels.as_raw().iter().map(|&v| f64::from(v)).collect();

    {
        let out: &mut [u8] = &mut pixels;
        for y in 0..h {
            for x in 0..w {
                let idx = y * w + x;
                let old_pixel = buffer[idx];
                let new_pixel = if old_pixel > THRESHOLD { 255.0 } else { 0.0 };
                out[idx] = if new_pixel > 0.0 { 255 } else { 0 };

                let error = old_pixel - new_pixel;
                distribute_error(&mut buffer, x, y, w, h, error);
            }
        }
    }

    debug!("Floyd-Steinberg dithering complete");
    Ok(RasterImage::monochrome_unchecked(pixels))
}

/// Distribute quantization error to neighboring pixels.
fn distribute_error(buffer: &mut [f64], x: usize, y: usize, width: usize, height: usize, error: f64) {
    let idx = y * width + x;

    if x + 1 < width {
        buffer[idx + 1] += error * EAST;
    }
    if y + 1 < height {
        let below = idx + width;
        if x > 0 {
            buffer[below - 1] += error * SOUTH_WEST;
        }
        buffer[below] += error * SOUTH;
        if x + 1 < width {
            buffer[below + 1] += error * SOUTH_EAST;
        }
    }
}

/// Simple threshold conversion without dithering.
///
/// Pixels with values >= `threshold` become white (255), others become black (0).
pub fn threshold_convert(image: RasterImage, threshold: u8) -> Result<RasterImage> {
    ensure_ditherable(&image)?;
    let (width, height) = image.dimensions();
    debug!(width, height, threshold, "Applying threshold conversion");

    let mut pixels = image.into_gray();
    for p in pixels.pixels_mut() {
        p.0[0] = if p.0[0] >= threshold { 255 } else { 0 };
    }

    Ok(RasterImage::monochrome_unchecked(pixels))
}

fn ensure_ditherable(image: &RasterImage) -> Result<()> {
    if image.mode() != ColorMode::Grayscale8 {
        return Err(ImageProcessError::InvalidInput(format!(
            "expected a Grayscale8 raster, got {:?}",
            image.mode()
        )));
    }
    if image.is_empty() {
        let (width, height) = image.dimensions();
        return Err(ImageProcessError::InvalidInput(format!(
            "cannot halftone a {width}x{height} raster"
        )));
    }
    Ok(())
}
