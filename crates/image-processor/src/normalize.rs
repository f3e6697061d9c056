//! Photo normalization: decode, fit to print width, grayscale, halftone,
//! and persist a uniquely named artifact.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat, ImageReader};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{
    Halftone, ImageProcessError, PAPER_WIDTH, RasterImage, Result, resize_to_width, to_grayscale,
};

/// File name prefix of every persisted artifact.
pub const ARTIFACT_PREFIX: &str = "processed_";

/// File extension of every persisted artifact.
pub const ARTIFACT_EXTENSION: &str = "png";

/// Last timestamp handed out, in nanoseconds since the epoch.
static LAST_ARTIFACT_NANOS: AtomicI64 = AtomicI64::new(i64::MIN);

/// Parameters for [`normalize`].
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Output width in pixels. Height always follows the source aspect ratio.
    pub target_width: u32,
    /// Directory receiving artifacts; created on demand.
    pub output_dir: PathBuf,
    /// Black/white reduction applied after grayscale conversion.
    pub halftone: Halftone,
}

impl NormalizeOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_width: PAPER_WIDTH,
            output_dir: output_dir.into(),
            halftone: Halftone::default(),
        }
    }

    /// Builder: set target width.
    pub fn with_target_width(mut self, width: u32) -> Self {
        self.target_width = width;
        self
    }

    /// Builder: set halftone.
    pub fn with_halftone(mut self, halftone: Halftone) -> Self {
        self.halftone = halftone;
        self
    }
}

/// A persisted, print-ready monochrome image. Immutable once created.
#[derive(Debug, Clone)]
pub struct ProcessedArtifact {
    image: RasterImage,
    path: PathBuf,
    generated_at: DateTime<Utc>,
}

impl ProcessedArtifact {
    pub fn image(&self) -> &RasterImage {
        &self.image
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }
}

/// Turn the photo at `source` into a persisted [`ProcessedArtifact`].
///
/// Either a complete artifact file exists afterwards or an error is
/// returned and nothing new is left in `output_dir`.
pub fn normalize(source: &Path, options: &NormalizeOptions) -> Result<ProcessedArtifact> {
    if options.target_width == 0 {
        return Err(ImageProcessError::InvalidInput(
            "target width must be greater than 0".into(),
        ));
    }

    let img = decode(source)?;
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(ImageProcessError::ImageDecode {
            path: source.to_path_buf(),
            width,
            height,
        });
    }
    debug!(path = %source.display(), width, height, "Decoded source image");

    let resized = resize_to_width(&img, options.target_width);
    drop(img);
    let gray = to_grayscale(&resized);
    drop(resized);
    let mono = options.halftone.apply(gray)?;

    let generated_at = next_artifact_timestamp();
    let path = options.output_dir.join(artifact_file_name(generated_at));
    persist_png(&mono, &options.output_dir, &path)?;

    info!(
        source = %source.display(),
        artifact = %path.display(),
        width = mono.width(),
        height = mono.height(),
        "Image processed and saved"
    );

    Ok(ProcessedArtifact {
        image: mono,
        path,
        generated_at,
    })
}

/// Read a persisted artifact back, insisting it is strictly black and white.
pub fn load_artifact(path: &Path) -> Result<RasterImage> {
    let img = decode(path)?;
    RasterImage::monochrome(img.to_luma8())
}

/// `processed_<UTC timestamp with nanoseconds>.png`
pub fn artifact_file_name(generated_at: DateTime<Utc>) -> String {
    format!(
        "{ARTIFACT_PREFIX}{}.{ARTIFACT_EXTENSION}",
        generated_at.format("%Y%m%dT%H%M%S%.9fZ")
    )
}

fn decode(path: &Path) -> Result<DynamicImage> {
    let load_error = |source: image::ImageError| ImageProcessError::ImageLoad {
        path: path.to_path_buf(),
        source,
    };

    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| load_error(e.into()))?
        .decode()
        .map_err(load_error)
}

/// Wall-clock timestamp, bumped so no two calls in this process share one.
fn next_artifact_timestamp() -> DateTime<Utc> {
    let now = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let bump = |last: i64| now.max(last.saturating_add(1));
    let previous = LAST_ARTIFACT_NANOS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(bump(last)))
        .unwrap_or_else(|last| last);
    DateTime::from_timestamp_nanos(bump(previous))
}

/// Encode to PNG and move into place via a temp file in the same directory.
fn persist_png(image: &RasterImage, dir: &Path, path: &Path) -> Result<()> {
    let persist_error = |source: std::io::Error| ImageProcessError::Persist {
        path: path.to_path_buf(),
        source,
    };

    let mut bytes = Vec::new();
    image
        .as_gray()
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;

    std::fs::create_dir_all(dir).map_err(persist_error)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(persist_error)?;
    tmp.write_all(&bytes).map_err(persist_error)?;
    tmp.as_file().sync_all().map_err(persist_error)?;
    tmp.persist_noclobber(path)
        .map_err(|e| persist_error(e.error))?;
    Ok(())
}
