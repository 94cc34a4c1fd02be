use std::borrow::Borrow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ndarray::Axis;
use tracing::debug;

use crate::compute::{CancellationToken, WorkerPool};
use crate::consts::COLOR_CHANNEL_COUNT;
use crate::error::{FusionError, Result};
use crate::frame::{AlignmentTransform, RgbImage};
use crate::ghost::GhostMaskSet;
use crate::resources::{BufferKind, ResourceTracker};

/// Confidence-weighted per-pixel merge of aligned frames.
///
/// Each frame contributes `confidence * ghost_mask` at every pixel (the
/// reference's mask is implicitly 1.0), and the weighted channel sums are
/// normalised by the total weight. A pixel where every weight is zero takes
/// the reference's value, so the output is always defined.
///
/// Rows are partitioned into disjoint bands across the pool; each band is
/// written by exactly one worker.
pub fn weighted_merge<I>(
    images: &[I],
    transforms: &[AlignmentTransform],
    masks: &GhostMaskSet,
    pool: &WorkerPool,
    cancel: &CancellationToken,
    tracker: &Arc<ResourceTracker>,
) -> Result<RgbImage>
where
    I: Borrow<RgbImage> + Sync,
{
    validate_inputs(images, transforms, masks)?;

    let reference_idx = masks.reference_index();
    let reference = images[reference_idx].borrow();
    let (w, h) = reference.dim();

    let mut merged = RgbImage::try_zeros(w, h)?;
    let _guard = tracker.register(BufferKind::Accumulator, merged.byte_size());

    let mut fallback_pixels = AtomicUsize::new(0);
    pool.try_for_each_row_band(&mut merged.data, cancel, |first_row, mut band| {
        let rows = band.len_of(Axis(0));
        for local in 0..rows {
            let y = first_row + local;
            for x in 0..w {
                let mut total = 0.0f32;
                let mut sums = [0.0f32; COLOR_CHANNEL_COUNT];
                for (i, image) in images.iter().enumerate() {
                    let weight = transforms[i].confidence * masks.weight(i, x, y);
                    if weight <= 0.0 {
                        continue;
                    }
                    let data = &image.borrow().data;
                    for (c, sum) in sums.iter_mut().enumerate() {
                        *sum += weight * data[[y, x, c]];
                    }
                    total += weight;
                }

                if total > 0.0 {
                    for (c, sum) in sums.iter().enumerate() {
                        band[[local, x, c]] = sum / total;
                    }
                } else {
                    for c in 0..COLOR_CHANNEL_COUNT {
                        band[[local, x, c]] = reference.data[[y, x, c]];
                    }
                    fallback_pixels.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    })?;

    let fallback = *fallback_pixels.get_mut();
    if fallback > 0 {
        debug!(pixels = fallback, "Zero-weight pixels took the reference value");
    }

    Ok(merged)
}

fn validate_inputs<I: Borrow<RgbImage>>(
    images: &[I],
    transforms: &[AlignmentTransform],
    masks: &GhostMaskSet,
) -> Result<()> {
    if images.is_empty() {
        return Err(FusionError::InsufficientFrames {
            required: 1,
            provided: 0,
        });
    }
    if transforms.len() != images.len() {
        return Err(FusionError::Precondition(format!(
            "{} transforms for {} frames",
            transforms.len(),
            images.len()
        )));
    }
    if masks.frame_count() != images.len() {
        return Err(FusionError::Precondition(format!(
            "ghost masks cover {} frames, {} supplied",
            masks.frame_count(),
            images.len()
        )));
    }

    let (w, h) = images[masks.reference_index()].borrow().dim();
    for (i, image) in images.iter().enumerate() {
        let image = image.borrow();
        if image.dim() != (w, h) {
            return Err(FusionError::DimensionMismatch {
                index: i,
                expected_width: w,
                expected_height: h,
                found_width: image.width(),
                found_height: image.height(),
            });
        }
    }
    if !masks.is_empty() && masks.dim() != (w, h) {
        let (mw, mh) = masks.dim();
        return Err(FusionError::Precondition(format!(
            "ghost masks are {mw}x{mh}, frames are {w}x{h}"
        )));
    }
    Ok(())
}
