//! Image processing pipeline for thermal receipt printer output.
//!
//! Turns an arbitrary photo into a strictly black-and-white raster:
//! resize to the print width, perceptual grayscale, Floyd-Steinberg
//! dithering (or plain thresholding), then an all-or-nothing write of a
//! uniquely named PNG artifact.

pub mod dither;
pub mod error;
pub mod grayscale;
pub mod normalize;
pub mod raster;
pub mod resize;

// Re-exports for convenience
pub use dither::{Halftone, floyd_steinberg_dither, threshold_convert};
pub use error::{ImageProcessError, Result};
pub use grayscale::to_grayscale;
pub use normalize::{NormalizeOptions, ProcessedArtifact, load_artifact, normalize};
pub use raster::{ColorMode, RasterImage};
pub use resize::{resize_to_width, scaled_height};

/// Default print width in pixels (80mm paper head).
pub const PAPER_WIDTH: u32 = 512;
