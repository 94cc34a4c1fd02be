use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lumen_core::frame::{Frame, FrameMetadata, RgbImage};
use tracing::debug;

/// Decode every input file into an RGB frame, in the order given.
pub fn load_frames(paths: &[PathBuf]) -> Result<Vec<Frame>> {
    paths
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let image = load_image(path)?;
            debug!(frame = i, path = %path.display(), width = image.width(), height = image.height(), "Frame loaded");
            Ok(Frame::new(
                image,
                FrameMetadata {
                    capture_timestamp_ns: i as u64,
                    ..Default::default()
                },
            ))
        })
        .collect()
}

pub fn load_image(path: &Path) -> Result<RgbImage> {
    let rgb = image::open(path)
        .with_context(|| format!("Failed to read image {}", path.display()))?
        .to_rgb8();
    let (w, h) = rgb.dimensions();
    Ok(RgbImage::from_rgb8(w as usize, h as usize, rgb.as_raw())?)
}

/// Write an 8-bit RGB file; the format follows the extension.
pub fn save_image(image: &RgbImage, path: &Path) -> Result<()> {
    let buffer = image::RgbImage::from_raw(
        image.width() as u32,
        image.height() as u32,
        image.to_rgb8(),
    )
    .context("Fused image has an inconsistent buffer size")?;
    buffer
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
