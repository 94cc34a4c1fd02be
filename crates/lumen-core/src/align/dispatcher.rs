use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::compute::{CancellationToken, WorkerPool};
use crate::error::{FusionError, Result};
use crate::frame::{AlignmentTransform, Frame, RgbImage};
use crate::pipeline::config::AlignmentConfig;
use crate::resources::{BufferKind, ResourceTracker};

use super::block_match::estimate_translation;
use super::pyramid::ImagePyramid;
use super::warp::warp_translate;

/// Frames resampled onto the reference, with the transform used for each.
///
/// The reference (and any frame with an identity transform) is borrowed
/// from the input rather than copied.
#[derive(Debug)]
pub struct AlignedBurst<'a> {
    pub images: Vec<Cow<'a, RgbImage>>,
    pub transforms: Vec<AlignmentTransform>,
}

/// Align every frame onto `frames[reference_idx]`, one pool task per frame.
///
/// The reference gets the identity transform without any search.
/// `on_frame_done` receives the number of frames finished so far.
pub fn align_frames_with_progress<'a, F>(
    frames: &'a [Frame],
    reference_idx: usize,
    config: &AlignmentConfig,
    pool: &WorkerPool,
    cancel: &CancellationToken,
    tracker: &Arc<ResourceTracker>,
    on_frame_done: F,
) -> Result<AlignedBurst<'a>>
where
    F: Fn(usize) + Send + Sync,
{
    if frames.is_empty() {
        return Err(FusionError::InsufficientFrames {
            required: 1,
            provided: 0,
        });
    }
    if reference_idx >= frames.len() {
        return Err(FusionError::Precondition(format!(
            "reference index {reference_idx} out of range (total: {})",
            frames.len()
        )));
    }

    cancel.check()?;
    let reference = &frames[reference_idx].image;
    let ref_pyramid = ImagePyramid::build(reference, config.pyramid_levels)?;
    let _ref_guard = tracker.register(BufferKind::Pyramid, ref_pyramid.byte_size());

    let counter = AtomicUsize::new(0);

    let results: Vec<Result<(Cow<'a, RgbImage>, AlignmentTransform)>> = pool.install(|| {
        frames
            .par_iter()
            .enumerate()
            .map(|(i, frame)| {
                cancel.check()?;
                let result = if i == reference_idx {
                    (Cow::Borrowed(&frame.image), AlignmentTransform::IDENTITY)
                } else {
                    let transform = {
                        let pyramid = ImagePyramid::build(&frame.image, config.pyramid_levels)?;
                        let _guard = tracker.register(BufferKind::Pyramid, pyramid.byte_size());
                        estimate_translation(&ref_pyramid, &pyramid, config)
                    };
                    debug!(
                        frame = i,
                        dx = transform.offset_x,
                        dy = transform.offset_y,
                        "Frame aligned"
                    );
                    (warp_translate(&frame.image, &transform)?, transform)
                };
                let done = counter.fetch_add(1, Ordering::AcqRel) + 1;
                on_frame_done(done);
                Ok(result)
            })
            .collect()
    });

    let mut images = Vec::with_capacity(frames.len());
    let mut transforms = Vec::with_capacity(frames.len());
    for result in results {
        let (image, transform) = result?;
        images.push(image);
        transforms.push(transform);
    }

    Ok(AlignedBurst { images, transforms })
}
