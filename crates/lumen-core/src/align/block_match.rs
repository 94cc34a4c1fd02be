//! Coarse-to-fine block matching for a single global translation.
//!
//! At every pyramid level, from coarsest to finest, a sparse grid of pixels
//! is compared between reference and target for each integer candidate
//! offset in a square window around the current best guess. The candidate
//! with the smallest sum of squared RGB differences wins and, doubled,
//! seeds the next finer level.

use tracing::debug;

use crate::frame::{AlignmentTransform, RgbImage};
use crate::pipeline::config::AlignmentConfig;

use super::pyramid::ImagePyramid;

/// Estimate the translation that maps `target` onto `reference`.
///
/// Confidence is always 1.0. Featureless input has equal SSD for every
/// candidate and settles on (0, 0).
pub fn estimate_translation(
    reference: &ImagePyramid<'_>,
    target: &ImagePyramid<'_>,
    config: &AlignmentConfig,
) -> AlignmentTransform {
    let levels = reference.len().min(target.len());
    let mut best = (0isize, 0isize);

    for level in (0..levels).rev() {
        if level + 1 < levels {
            best = (best.0 * 2, best.1 * 2);
        }
        let radius = level_radius(config, level);
        best = search_level(
            reference.level(level),
            target.level(level),
            best,
            radius,
            config.grid_divisor,
        );
        debug!(level, radius, dx = best.0, dy = best.1, "Block match level done");
    }

    AlignmentTransform::translation(best.0 as f32, best.1 as f32)
}

/// Search radius used at `level`: the full-resolution radius halved per
/// level, never below the configured floor.
pub fn level_radius(config: &AlignmentConfig, level: usize) -> usize {
    config
        .search_radius
        .checked_shr(level as u32)
        .unwrap_or(0)
        .max(config.min_search_radius)
}

/// Spacing of the sparse sampling grid for an image of this size.
pub fn grid_stride(width: usize, height: usize, grid_divisor: usize) -> usize {
    (width.min(height) / grid_divisor.max(1)).max(1)
}

/// Best integer offset within `radius` of `guess` at one level.
fn search_level(
    reference: &RgbImage,
    target: &RgbImage,
    guess: (isize, isize),
    radius: usize,
    grid_divisor: usize,
) -> (isize, isize) {
    let (w, h) = reference.dim();
    let (tw, th) = target.dim();
    let w = w.min(tw);
    let h = h.min(th);

    // Restrict samples so every candidate in the window stays inside both
    // images; all candidates are then scored over the same pixels.
    let margin_x = guess.0.unsigned_abs() + radius;
    let margin_y = guess.1.unsigned_abs() + radius;
    if 2 * margin_x >= w || 2 * margin_y >= h {
        return guess;
    }

    let stride = grid_stride(w, h, grid_divisor);
    let samples: Vec<(usize, usize)> = (margin_y..h - margin_y)
        .step_by(stride)
        .flat_map(|y| (margin_x..w - margin_x).step_by(stride).map(move |x| (x, y)))
        .collect();

    let mut best = guess;
    let mut best_ssd = sum_squared_diff(reference, target, &samples, guess);
    let r = radius as isize;
    for oy in -r..=r {
        for ox in -r..=r {
            if ox == 0 && oy == 0 {
                continue;
            }
            let candidate = (guess.0 + ox, guess.1 + oy);
            let ssd = sum_squared_diff(reference, target, &samples, candidate);
            if ssd < best_ssd {
                best_ssd = ssd;
                best = candidate;
            }
        }
    }
    best
}

fn sum_squared_diff(
    reference: &RgbImage,
    target: &RgbImage,
    samples: &[(usize, usize)],
    offset: (isize, isize),
) -> f64 {
    let mut sum = 0.0f64;
    for &(x, y) in samples {
        let tx = (x as isize + offset.0) as usize;
        let ty = (y as isize + offset.1) as usize;
        for c in 0..3 {
            let d = (reference.data[[y, x, c]] - target.data[[ty, tx, c]]) as f64;
            sum += d * d;
        }
    }
    sum
}
