use lumen_core::compute::{CancellationToken, WorkerPool};
use lumen_core::frame::{Frame, FrameMetadata, RgbImage};

/// Solid-colour frame.
pub fn solid_frame(width: usize, height: usize, rgb: [f32; 3]) -> Frame {
    Frame::from_image(RgbImage::filled(width, height, rgb))
}

/// `count` identical solid-gray frames with increasing timestamps.
pub fn gray_burst(count: usize, width: usize, height: usize, value: f32) -> Vec<Frame> {
    (0..count)
        .map(|i| {
            Frame::new(
                RgbImage::filled(width, height, [value; 3]),
                FrameMetadata {
                    capture_timestamp_ns: i as u64 * 33_000_000,
                    exposure_duration_ns: 10_000_000,
                    iso: 100,
                    ev_offset: 0.0,
                },
            )
        })
        .collect()
}

/// Paint an axis-aligned block of one colour.
pub fn paint_block(image: &mut RgbImage, x0: usize, y0: usize, size: usize, rgb: [f32; 3]) {
    for y in y0..(y0 + size).min(image.height()) {
        for x in x0..(x0 + size).min(image.width()) {
            for c in 0..3 {
                image.data[[y, x, c]] = rgb[c];
            }
        }
    }
}

/// Smooth textured scene: a few coloured Gaussian blobs on a flat background,
/// with every blob centre moved by (shift_x, shift_y).
pub fn blob_scene(width: usize, height: usize, shift_x: f32, shift_y: f32) -> RgbImage {
    let blobs: [(f32, f32, f32, [f32; 3]); 4] = [
        (0.40, 0.40, 4.0, [180.0, 40.0, 20.0]),
        (0.62, 0.45, 3.0, [20.0, 160.0, 60.0]),
        (0.48, 0.63, 5.0, [30.0, 50.0, 170.0]),
        (0.58, 0.58, 2.5, [120.0, 120.0, 0.0]),
    ];
    let mut pixels = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let mut px = [40.0f32, 40.0, 40.0];
            for &(fx, fy, sigma, color) in &blobs {
                let cx = fx * width as f32 + shift_x;
                let cy = fy * height as f32 + shift_y;
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let g = (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp();
                for c in 0..3 {
                    px[c] += color[c] * g;
                }
            }
            pixels.extend(px.iter().map(|v| v.min(255.0)));
        }
    }
    RgbImage::from_rgb_f32(width, height, pixels).expect("valid scene")
}

pub fn pool(threads: usize) -> WorkerPool {
    WorkerPool::new(Some(threads)).expect("worker pool")
}

pub fn token() -> CancellationToken {
    CancellationToken::new()
}

pub fn max_abs_diff(a: &RgbImage, b: &RgbImage) -> f32 {
    a.data
        .iter()
        .zip(b.data.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f32::max)
}
