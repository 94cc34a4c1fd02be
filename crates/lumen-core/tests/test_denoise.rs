#[allow(dead_code)]
mod common;

use lumen_core::filters::bilateral_denoise;
use lumen_core::frame::RgbImage;
use lumen_core::pipeline::DenoiseConfig;
use lumen_core::resources::ResourceTracker;

fn denoise(image: &RgbImage, strength: f32) -> RgbImage {
    bilateral_denoise(
        image,
        strength,
        &DenoiseConfig::default(),
        &common::pool(2),
        &common::token(),
        &ResourceTracker::new(),
    )
    .unwrap()
}

/// Deterministic +/- noise around a base value.
fn noisy(width: usize, height: usize, base: f32, amplitude: f32) -> RgbImage {
    let mut image = RgbImage::filled(width, height, [base; 3]);
    let mut state = 12345u32;
    for v in image.data.iter_mut() {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let unit = (state >> 16) as f32 / 65_535.0;
        *v += (unit * 2.0 - 1.0) * amplitude;
    }
    image
}

fn variance(image: &RgbImage, x0: usize, x1: usize, y0: usize, y1: usize) -> f32 {
    let mut values = Vec::new();
    for y in y0..y1 {
        for x in x0..x1 {
            values.extend(image.pixel(x, y));
        }
    }
    let mean = values.iter().sum::<f32>() / values.len() as f32;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / values.len() as f32
}

#[test]
fn test_zero_strength_is_identity() {
    let image = noisy(24, 24, 120.0, 10.0);
    assert_eq!(denoise(&image, 0.0), image);
}

#[test]
fn test_full_strength_reduces_noise() {
    let image = noisy(32, 32, 120.0, 8.0);
    let out = denoise(&image, 1.0);
    let before = variance(&image, 2, 30, 2, 30);
    let after = variance(&out, 2, 30, 2, 30);
    assert!(after < before * 0.5, "variance {before} -> {after}");
}

#[test]
fn test_border_pixels_pass_through() {
    let image = noisy(20, 20, 100.0, 10.0);
    let out = denoise(&image, 1.0);
    let radius = DenoiseConfig::default().radius;
    for y in 0..20 {
        for x in 0..20 {
            let border = x < radius || y < radius || x >= 20 - radius || y >= 20 - radius;
            if border {
                assert_eq!(out.pixel(x, y), image.pixel(x, y), "({x}, {y})");
            }
        }
    }
}

#[test]
fn test_strong_edge_survives() {
    let mut image = RgbImage::filled(20, 20, [20.0; 3]);
    common::paint_block(&mut image, 10, 0, 20, [230.0; 3]);
    let out = denoise(&image, 1.0);
    // Across a 210-level step the colour weight is negligible.
    assert!((out.pixel(9, 10)[0] - 20.0).abs() < 0.5);
    assert!((out.pixel(10, 10)[0] - 230.0).abs() < 0.5);
}

#[test]
fn test_uniform_image_is_unchanged() {
    let image = RgbImage::filled(16, 16, [128.0; 3]);
    let out = denoise(&image, 1.0);
    assert!(common::max_abs_diff(&image, &out) < 1e-4);
}
