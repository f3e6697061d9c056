//! Scaling photos to the printable width.
//!
//! Only the width is fixed; the height follows the source aspect ratio.

use image::DynamicImage;
use image::imageops::FilterType;
use tracing::debug;

/// Height that keeps `orig_w x orig_h` in proportion at `width`.
///
/// `round(orig_h * width / orig_w)`, never less than 1. `orig_w` must be non-zero.
pub fn scaled_height(orig_w: u32, orig_h: u32, width: u32) -> u32 {
    let ratio = f64::from(width) / f64::from(orig_w);
    let new_height = (f64::from(orig_h) * ratio).round() as u32;
    new_height.max(1)
}

/// Scale `img` to exactly `width` pixels wide, height per [`scaled_height`].
///
/// Lanczos3 in both directions. An image already at `width` is returned as is.
pub fn resize_to_width(img: &DynamicImage, width: u32) -> DynamicImage {
    let (orig_w, orig_h) = (img.width(), img.height());

    if orig_w == width {
        debug!(width, "Image already at target width, skipping resize");
        return img.clone();
    }

    let new_height = scaled_height(orig_w, orig_h, width);

    debug!(
        orig_w,
        orig_h,
        new_width = width,
        new_height,
        "Resizing image to target width"
    );

    img.resize_exact(width, new_height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    /// Create a test DynamicImage with given dimensions.
    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        let gray = GrayImage::from_pixel(width, height, Luma([128]));
        DynamicImage::ImageLuma8(gray)
    }

    #[test]
    fn test_resize_to_width_downscale() {
        let img = create_test_image(1024, 768);
        let result = resize_to_width(&img, 512);
        assert_eq!(result.width(), 512);
        assert_eq!(result.height(), 384);
    }

    #[test]
    fn test_resize_to_width_upscale() {
        let img = create_test_image(200, 100);
        let result = resize_to_width(&img, 512);
        assert_eq!(result.width(), 512);
        assert_eq!(result.height(), 256);
    }

    #[test]
    fn test_resize_to_width_same_width() {
        let img = create_test_image(512, 700);
        let result = resize_to_width(&img, 512);
        assert_eq!(result.width(), 512);
        assert_eq!(result.height(), 700);
    }

    #[test]
    fn test_resize_to_width_paper_width() {
        let img = create_test_image(1920, 1080);
        let result = resize_to_width(&img, crate::PAPER_WIDTH);
        assert_eq!(result.width(), 512);
        // 1080 * (512/1920) = 288
        assert_eq!(result.height(), 288);
    }

    #[test]
    fn test_scaled_height_rounds_to_nearest() {
        // 333 * 512 / 1000 = 170.496
        assert_eq!(scaled_height(1000, 333, 512), 170);
        // 335 * 512 / 1000 = 171.52
        assert_eq!(scaled_height(1000, 335, 512), 172);
    }

    #[test]
    fn test_scaled_height_matches_ratio_within_one_pixel() {
        for (w, h) in [(640u32, 480u32), (3000, 4000), (1234, 567), (7, 13), (4032, 3024)] {
            let expected = f64::from(h) * 512.0 / f64::from(w);
            let got = f64::from(scaled_height(w, h, 512));
            assert!((got - expected).abs() <= 1.0, "{w}x{h}: {got} vs {expected}");
        }
    }

    #[test]
    fn test_resize_preserves_non_zero_dimensions() {
        // Very wide, very short image
        let img = create_test_image(1000, 1);
        let result = resize_to_width(&img, 10);
        assert_eq!(result.width(), 10);
        assert!(result.height() >= 1, "Height should be at least 1");
    }
}
