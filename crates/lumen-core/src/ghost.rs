//! Per-pixel trust masks that keep moving content out of the composite.
//!
//! A non-reference pixel whose colour stays within the threshold of the
//! reference is trusted fully. Beyond the threshold its weight falls off
//! along a Gaussian.

use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ndarray::{Array3, ArrayView2, ArrayViewMut2, Axis, Zip};
use rayon::prelude::*;

use crate::compute::{CancellationToken, WorkerPool};
use crate::consts::CHANNEL_MAX;
use crate::error::{FusionError, Result};
use crate::frame::{try_zeros_array3, RgbImage};
use crate::pipeline::config::GhostConfig;
use crate::resources::{AllocationGuard, BufferKind, ResourceTracker};

/// Mean absolute RGB difference, normalised to [0, 1].
pub fn normalized_difference(a: [f32; 3], b: [f32; 3]) -> f32 {
    let sum = (a[0] - b[0]).abs() + (a[1] - b[1]).abs() + (a[2] - b[2]).abs();
    sum / (3.0 * CHANNEL_MAX)
}

/// Trust weight for a normalised colour difference.
///
/// A NaN difference (non-finite input) is not trusted at all.
pub fn ghost_weight(diff: f32, config: &GhostConfig) -> f32 {
    if diff.is_nan() {
        return 0.0;
    }
    if diff <= config.threshold {
        return 1.0;
    }
    let excess = diff - config.threshold;
    let s2 = 2.0 * config.sigma * config.sigma;
    (-(excess * excess) / s2).exp().clamp(0.0, 1.0)
}

/// Ghost masks for every non-reference frame of one run, stored contiguously.
///
/// Shape of the backing array is `(frames - 1, height, width)`. The
/// reference frame has no stored mask and reads as all ones.
#[derive(Clone, Debug)]
pub struct GhostMaskSet {
    reference_idx: usize,
    frame_count: usize,
    data: Array3<f32>,
    guard: Option<Arc<AllocationGuard>>,
}

impl GhostMaskSet {
    /// All-ones masks: every pixel of every frame trusted.
    pub fn try_trusting(
        frame_count: usize,
        reference_idx: usize,
        width: usize,
        height: usize,
    ) -> Result<Self> {
        if reference_idx >= frame_count {
            return Err(FusionError::Precondition(format!(
                "reference index {reference_idx} out of range (total: {frame_count})"
            )));
        }
        let mut data = try_zeros_array3((frame_count - 1, height, width))?;
        data.fill(1.0);
        Ok(Self {
            reference_idx,
            frame_count,
            data,
            guard: None,
        })
    }

    /// Register the arena with `tracker`. It stays live until this set and
    /// every clone of it are dropped.
    pub fn track(mut self, tracker: &Arc<ResourceTracker>) -> Self {
        let guard = tracker.register(BufferKind::GhostMask, self.byte_size());
        self.guard = Some(Arc::new(guard));
        self
    }

    pub fn is_tracked(&self) -> bool {
        self.guard.is_some()
    }

    /// Number of stored masks (one per non-reference frame).
    pub fn len(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn reference_index(&self) -> usize {
        self.reference_idx
    }

    /// (width, height) of every mask.
    pub fn dim(&self) -> (usize, usize) {
        let (_, h, w) = self.data.dim();
        (w, h)
    }

    pub fn byte_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }

    /// Mask for `frame_idx`; `None` for the reference or an out-of-range index.
    pub fn mask(&self, frame_idx: usize) -> Option<ArrayView2<'_, f32>> {
        self.slot(frame_idx)
            .map(|slot| self.data.index_axis(Axis(0), slot))
    }

    /// Trust weight of one pixel of one frame; 1.0 for the reference.
    pub fn weight(&self, frame_idx: usize, x: usize, y: usize) -> f32 {
        match self.slot(frame_idx) {
            Some(slot) => self.data[[slot, y, x]],
            None => 1.0,
        }
    }

    /// `(frame index, mask)` for every non-reference frame in frame order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, ArrayView2<'_, f32>)> {
        self.data
            .axis_iter(Axis(0))
            .enumerate()
            .map(|(slot, mask)| (self.frame_index(slot), mask))
    }

    fn slot(&self, frame_idx: usize) -> Option<usize> {
        if frame_idx == self.reference_idx || frame_idx >= self.frame_count {
            None
        } else if frame_idx < self.reference_idx {
            Some(frame_idx)
        } else {
            Some(frame_idx - 1)
        }
    }

    fn frame_index(&self, slot: usize) -> usize {
        if slot < self.reference_idx {
            slot
        } else {
            slot + 1
        }
    }
}

/// Fill `out` with the ghost mask of `aligned` against `reference`.
pub fn compute_mask_into(
    reference: &RgbImage,
    aligned: &RgbImage,
    config: &GhostConfig,
    mut out: ArrayViewMut2<'_, f32>,
) {
    let ref_px = reference.data.lanes(Axis(2));
    let tgt_px = aligned.data.lanes(Axis(2));
    Zip::from(&mut out)
        .and(ref_px)
        .and(tgt_px)
        .for_each(|m, r, t| {
            let diff = normalized_difference([r[0], r[1], r[2]], [t[0], t[1], t[2]]);
            *m = ghost_weight(diff, config);
        });
}

/// Compute one mask per non-reference frame, one pool task per frame.
///
/// With `enabled == false` every mask is all ones.
pub fn compute_ghost_masks<F>(
    aligned: &[Cow<'_, RgbImage>],
    reference_idx: usize,
    config: &GhostConfig,
    enabled: bool,
    pool: &WorkerPool,
    cancel: &CancellationToken,
    on_frame_done: F,
) -> Result<GhostMaskSet>
where
    F: Fn(usize) + Send + Sync,
{
    let reference = aligned.get(reference_idx).ok_or_else(|| {
        FusionError::Precondition(format!(
            "reference index {reference_idx} out of range (total: {})",
            aligned.len()
        ))
    })?;
    let (w, h) = reference.dim();
    if let Some((i, img)) = aligned.iter().enumerate().find(|(_, img)| img.dim() != (w, h)) {
        return Err(FusionError::DimensionMismatch {
            index: i,
            expected_width: w,
            expected_height: h,
            found_width: img.width(),
            found_height: img.height(),
        });
    }

    let mut masks = GhostMaskSet::try_trusting(aligned.len(), reference_idx, w, h)?;
    if !enabled {
        return Ok(masks);
    }

    let counter = AtomicUsize::new(0);
    let reference: &RgbImage = reference;
    pool.install(|| {
        masks
            .data
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .try_for_each(|(slot, out)| {
                cancel.check()?;
                let frame_idx = if slot < reference_idx { slot } else { slot + 1 };
                compute_mask_into(reference, &aligned[frame_idx], config, out);
                let done = counter.fetch_add(1, Ordering::AcqRel) + 1;
                on_frame_done(done);
                Ok(())
            })
    })?;

    Ok(masks)
}
