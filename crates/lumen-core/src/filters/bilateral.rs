use std::sync::Arc;

use ndarray::Axis;
use tracing::debug;

use crate::compute::{CancellationToken, WorkerPool};
use crate::consts::{COLOR_CHANNEL_COUNT, EPSILON};
use crate::error::Result;
use crate::frame::RgbImage;
use crate::pipeline::config::DenoiseConfig;
use crate::resources::{BufferKind, ResourceTracker};

/// Edge-preserving bilateral smoothing of the merged image.
///
/// Each neighbour within `config.radius` is weighted by a spatial Gaussian
/// (`sigma_space`) times a colour Gaussian on its RGB distance to the centre
/// pixel, with colour sigma `config.sigma_color * strength`.
///
/// `strength` is clamped to [0, 1]. At 0 the colour sigma collapses and
/// only the centre pixel carries weight, so the input is returned
/// unchanged. Pixels closer than `radius` to any edge are copied through.
pub fn bilateral_denoise(
    image: &RgbImage,
    strength: f32,
    config: &DenoiseConfig,
    pool: &WorkerPool,
    cancel: &CancellationToken,
    tracker: &Arc<ResourceTracker>,
) -> Result<RgbImage> {
    let strength = strength.clamp(0.0, 1.0);
    let sigma_color = config.sigma_color * strength;
    if sigma_color <= EPSILON || config.radius == 0 {
        debug!(strength, "Denoise is a no-op at this strength");
        return image.try_clone();
    }

    let (w, h) = image.dim();
    let radius = config.radius;
    let spatial = spatial_kernel(radius, config.sigma_space);
    let color_denom = 2.0 * sigma_color * sigma_color;

    let mut out = RgbImage::try_zeros(w, h)?;
    let _guard = tracker.register(BufferKind::Denoise, out.byte_size());

    let src = &image.data;
    pool.try_for_each_row_band(&mut out.data, cancel, |first_row, mut band| {
        for local in 0..band.len_of(Axis(0)) {
            let y = first_row + local;
            for x in 0..w {
                let interior = y >= radius && y + radius < h && x >= radius && x + radius < w;
                if !interior {
                    for c in 0..COLOR_CHANNEL_COUNT {
                        band[[local, x, c]] = src[[y, x, c]];
                    }
                    continue;
                }

                let center = [src[[y, x, 0]], src[[y, x, 1]], src[[y, x, 2]]];
                let mut total = 0.0f32;
                let mut sums = [0.0f32; COLOR_CHANNEL_COUNT];
                let size = 2 * radius + 1;
                for ky in 0..size {
                    let ny = y + ky - radius;
                    for kx in 0..size {
                        let nx = x + kx - radius;
                        let px = [src[[ny, nx, 0]], src[[ny, nx, 1]], src[[ny, nx, 2]]];
                        let dist2 = (px[0] - center[0]).powi(2)
                            + (px[1] - center[1]).powi(2)
                            + (px[2] - center[2]).powi(2);
                        let weight = spatial[ky * size + kx] * (-dist2 / color_denom).exp();
                        total += weight;
                        for c in 0..COLOR_CHANNEL_COUNT {
                            sums[c] += weight * px[c];
                        }
                    }
                }

                // The centre always contributes weight 1, so total > 0.
                for c in 0..COLOR_CHANNEL_COUNT {
                    band[[local, x, c]] = sums[c] / total;
                }
            }
        }
    })?;

    Ok(out)
}

/// Row-major `(2r+1)^2` spatial Gaussian weights; the centre weight is 1.
fn spatial_kernel(radius: usize, sigma_space: f32) -> Vec<f32> {
    let size = 2 * radius + 1;
    let denom = 2.0 * sigma_space * sigma_space;
    let mut kernel = Vec::with_capacity(size * size);
    for ky in 0..size {
        for kx in 0..size {
            let dy = ky as f32 - radius as f32;
            let dx = kx as f32 - radius as f32;
            kernel.push((-(dx * dx + dy * dy) / denom).exp());
        }
    }
    kernel
}
