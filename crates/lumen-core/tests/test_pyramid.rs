#[allow(dead_code)]
mod common;

use approx::assert_abs_diff_eq;

use lumen_core::align::pyramid::{clamp_levels, downsample_box_2x, ImagePyramid};
use lumen_core::frame::RgbImage;

#[test]
fn test_pyramid_halves_each_level() {
    let image = RgbImage::filled(64, 48, [10.0, 20.0, 30.0]);
    let pyramid = ImagePyramid::build(&image, 4).unwrap();
    assert_eq!(pyramid.len(), 4);
    assert_eq!(pyramid.level(0).dim(), (64, 48));
    assert_eq!(pyramid.level(1).dim(), (32, 24));
    assert_eq!(pyramid.level(2).dim(), (16, 12));
    assert_eq!(pyramid.level(3).dim(), (8, 6));
}

#[test]
fn test_level_zero_is_the_input() {
    let image = common::blob_scene(32, 32, 0.0, 0.0);
    let pyramid = ImagePyramid::build(&image, 3).unwrap();
    assert_eq!(pyramid.level(0), &image);
}

#[test]
fn test_box_filter_averages_2x2_blocks() {
    // Checkerboard of 0 and 200: nearest-neighbour would keep 0 or 200,
    // area averaging gives 100 everywhere.
    let mut pixels = Vec::new();
    for y in 0..4 {
        for x in 0..4 {
            let v = if (x + y) % 2 == 0 { 0.0 } else { 200.0 };
            pixels.extend([v, v, v]);
        }
    }
    let image = RgbImage::from_rgb_f32(4, 4, pixels).unwrap();
    let half = downsample_box_2x(&image).unwrap();
    assert_eq!(half.dim(), (2, 2));
    for v in half.data.iter() {
        assert_abs_diff_eq!(*v, 100.0, epsilon = 1e-5);
    }
}

#[test]
fn test_box_filter_keeps_channels_separate() {
    let mut image = RgbImage::filled(2, 2, [0.0, 0.0, 0.0]);
    image.data[[0, 0, 0]] = 40.0;
    image.data[[1, 1, 2]] = 80.0;
    let half = downsample_box_2x(&image).unwrap();
    assert_eq!(half.pixel(0, 0), [10.0, 0.0, 20.0]);
}

#[test]
fn test_odd_dimensions_drop_trailing_row_and_column() {
    let image = RgbImage::filled(7, 5, [50.0; 3]);
    let half = downsample_box_2x(&image).unwrap();
    assert_eq!(half.dim(), (3, 2));
    assert_abs_diff_eq!(half.data[[1, 2, 1]], 50.0, epsilon = 1e-6);
}

#[test]
fn test_small_frame_clamps_level_count() {
    // 6 px on the short side fits 2^2 = 4 but not 2^3 = 8.
    let image = RgbImage::filled(40, 6, [1.0; 3]);
    let pyramid = ImagePyramid::build(&image, 4).unwrap();
    assert_eq!(pyramid.len(), 3);
    assert_eq!(pyramid.level(2).dim(), (10, 1));
}

#[test]
fn test_clamp_levels() {
    assert_eq!(clamp_levels(64, 64, 4), 4);
    assert_eq!(clamp_levels(8, 8, 4), 4);
    assert_eq!(clamp_levels(7, 64, 4), 3);
    assert_eq!(clamp_levels(1, 1, 4), 1);
    assert_eq!(clamp_levels(64, 64, 0), 1);
}

#[test]
fn test_base_level_is_borrowed() {
    let image = RgbImage::filled(64, 64, [1.0; 3]);
    let pyramid = ImagePyramid::build(&image, 3).unwrap();
    assert!(std::ptr::eq(pyramid.level(0), &image));
    // Only the 32x32 and 16x16 levels are owned.
    let owned = (32 * 32 + 16 * 16) * 3 * std::mem::size_of::<f32>();
    assert_eq!(pyramid.byte_size(), owned);
}

#[test]
fn test_single_level_owns_nothing() {
    let image = RgbImage::filled(1, 1, [5.0; 3]);
    let pyramid = ImagePyramid::build(&image, 4).unwrap();
    assert_eq!(pyramid.len(), 1);
    assert_eq!(pyramid.byte_size(), 0);
}
