//! Perceptual grayscale conversion.
//!
//! Uses the ITU-R BT.601 luma weights (0.299 R + 0.587 G + 0.114 B) in
//! 16-bit fixed point with round-half-up, the same weighting common photo
//! tools use for "L" mode. Alpha is discarded, not composited.

use image::{DynamicImage, GrayImage, Luma};
use tracing::debug;

use crate::RasterImage;

// Weights scaled by 65536; they sum to exactly 65536 so white stays 255.
const R_WEIGHT: u32 = 19_595;
const G_WEIGHT: u32 = 38_470;
const B_WEIGHT: u32 = 7_471;

/// Luma of a single RGB sample.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = u32::from(r) * R_WEIGHT + u32::from(g) * G_WEIGHT + u32::from(b) * B_WEIGHT;
    ((weighted + 0x8000) >> 16) as u8
}

/// Convert any decoded image to a `Grayscale8` raster.
pub fn to_grayscale(img: &DynamicImage) -> RasterImage {
    let (width, height) = (img.width(), img.height());

    if let DynamicImage::ImageLuma8(gray) = img {
        debug!(width, height, "Image already 8-bit grayscale");
        return RasterImage::grayscale(gray.clone());
    }

    debug!(width, height, "Converting image to grayscale");
    let rgb = img.to_rgb8();
    let mut out = GrayImage::new(width, height);
    for (dst, src) in out.pixels_mut().zip(rgb.pixels()) {
        let [r, g, b] = src.0;
        *dst = Luma([luma(r, g, b)]);
    }
    RasterImage::grayscale(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn test_luma_extremes() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 255, 255), 255);
    }

    #[test]
    fn test_luma_neutral_gray_is_unchanged() {
        for v in [1u8, 64, 127, 128, 200, 254] {
            assert_eq!(luma(v, v, v), v);
        }
    }

    #[test]
    fn test_luma_is_weighted_not_averaged() {
        // A flat average would give 85 for each primary.
        assert_eq!(luma(255, 0, 0), 76);
        assert_eq!(luma(0, 255, 0), 150);
        assert_eq!(luma(0, 0, 255), 29);
    }

    #[test]
    fn test_to_grayscale_rgb() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([10, 10, 10]));
        let gray = to_grayscale(&DynamicImage::ImageRgb8(img));
        assert_eq!(gray.dimensions(), (2, 1));
        assert_eq!(gray.samples(), &[76, 10]);
    }

    #[test]
    fn test_to_grayscale_drops_alpha() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([0, 255, 0, 0]));
        let gray = to_grayscale(&DynamicImage::ImageRgba8(img));
        assert_eq!(gray.samples(), &[150]);
    }

    #[test]
    fn test_to_grayscale_luma_passthrough() {
        let img = GrayImage::from_pixel(3, 3, Luma([42]));
        let gray = to_grayscale(&DynamicImage::ImageLuma8(img));
        assert!(gray.samples().iter().all(|&v| v == 42));
    }
}
