//! Error types for the image pipeline.

use std::path::PathBuf;

/// Errors that can occur while turning a photo into a printable artifact.
#[derive(Debug, thiserror::Error)]
pub enum ImageProcessError {
    #[error("Invalid input raster: {0}")]
    InvalidInput(String),

    #[error("Failed to load image {}: {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Degenerate image dimensions {width}x{height} in {}", path.display())]
    ImageDecode {
        path: PathBuf,
        width: u32,
        height: u32,
    },

    #[error("Failed to encode processed image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Failed to persist processed image to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for image pipeline operations.
pub type Result<T> = std::result::Result<T, ImageProcessError>;
