#[allow(dead_code)]
mod common;

use std::borrow::Cow;

use approx::assert_abs_diff_eq;

use lumen_core::frame::RgbImage;
use lumen_core::ghost::{compute_ghost_masks, ghost_weight, normalized_difference, GhostMaskSet};
use lumen_core::pipeline::GhostConfig;

#[test]
fn test_difference_is_normalised() {
    assert_eq!(normalized_difference([0.0; 3], [0.0; 3]), 0.0);
    assert_abs_diff_eq!(
        normalized_difference([0.0; 3], [255.0; 3]),
        1.0,
        epsilon = 1e-6
    );
    assert_abs_diff_eq!(
        normalized_difference([10.0, 20.0, 30.0], [40.0, 20.0, 0.0]),
        60.0 / 765.0,
        epsilon = 1e-6
    );
}

#[test]
fn test_weight_is_one_at_or_below_threshold() {
    let config = GhostConfig::default();
    assert_eq!(ghost_weight(0.0, &config), 1.0);
    assert_eq!(ghost_weight(0.1, &config), 1.0);
    assert_eq!(ghost_weight(config.threshold, &config), 1.0);
}

#[test]
fn test_weight_follows_gaussian_falloff() {
    let config = GhostConfig::default();
    // One sigma above the threshold: exp(-0.5)
    let w = ghost_weight(config.threshold + config.sigma, &config);
    assert_abs_diff_eq!(w, (-0.5f32).exp(), epsilon = 1e-5);
}

#[test]
fn test_weight_is_monotone_and_bounded() {
    let config = GhostConfig::default();
    let mut previous = f32::INFINITY;
    for step in 0..=1000 {
        let diff = step as f32 / 1000.0;
        let w = ghost_weight(diff, &config);
        assert!((0.0..=1.0).contains(&w), "weight {w} at diff {diff}");
        assert!(w <= previous, "weight rose at diff {diff}");
        previous = w;
    }
}

#[test]
fn test_mask_set_slots_skip_reference() {
    let masks = GhostMaskSet::try_trusting(5, 2, 4, 3).unwrap();
    assert_eq!(masks.len(), 4);
    assert_eq!(masks.frame_count(), 5);
    assert_eq!(masks.dim(), (4, 3));
    assert!(masks.mask(2).is_none());
    assert!(masks.mask(5).is_none());
    assert!(masks.mask(4).is_some());
    let frames: Vec<usize> = masks.iter().map(|(i, _)| i).collect();
    assert_eq!(frames, vec![0, 1, 3, 4]);
    assert_eq!(masks.weight(2, 0, 0), 1.0);
}

#[test]
fn test_masks_mark_moving_block() {
    let gray = RgbImage::filled(32, 32, [128.0; 3]);
    let mut moved = gray.clone();
    common::paint_block(&mut moved, 24, 24, 8, [255.0; 3]);
    let images = vec![
        Cow::Borrowed(&gray),
        Cow::Borrowed(&gray),
        Cow::Borrowed(&moved),
    ];

    let masks = compute_ghost_masks(
        &images,
        1,
        &GhostConfig::default(),
        true,
        &common::pool(2),
        &common::token(),
        |_| {},
    )
    .unwrap();

    assert_eq!(masks.len(), 2);
    let moved_mask = masks.mask(2).unwrap();
    assert!(moved_mask[[28, 28]] < 0.01, "got {}", moved_mask[[28, 28]]);
    assert_eq!(moved_mask[[0, 0]], 1.0);
    assert!(masks.mask(0).unwrap().iter().all(|&v| v == 1.0));
    for (_, mask) in masks.iter() {
        assert!(mask.iter().all(|v| (0.0..=1.0).contains(v)));
    }
}

#[test]
fn test_disabled_ghost_elimination_trusts_everything() {
    let black = RgbImage::filled(8, 8, [0.0; 3]);
    let white = RgbImage::filled(8, 8, [255.0; 3]);
    let images = vec![Cow::Borrowed(&black), Cow::Borrowed(&white)];
    let masks = compute_ghost_masks(
        &images,
        0,
        &GhostConfig::default(),
        false,
        &common::pool(1),
        &common::token(),
        |_| {},
    )
    .unwrap();
    assert_eq!(masks.len(), 1);
    assert!(masks.mask(1).unwrap().iter().all(|&v| v == 1.0));
}

#[test]
fn test_mismatched_dimensions_are_rejected() {
    let a = RgbImage::filled(8, 8, [0.0; 3]);
    let b = RgbImage::filled(8, 4, [0.0; 3]);
    let images = vec![Cow::Borrowed(&a), Cow::Borrowed(&b)];
    let result = compute_ghost_masks(
        &images,
        0,
        &GhostConfig::default(),
        true,
        &common::pool(1),
        &common::token(),
        |_| {},
    );
    assert!(result.is_err());
}

#[test]
fn test_nan_difference_is_untrusted() {
    assert_eq!(ghost_weight(f32::NAN, &GhostConfig::default()), 0.0);
    assert_eq!(ghost_weight(f32::INFINITY, &GhostConfig::default()), 0.0);
}

#[test]
fn test_nan_pixel_keeps_mask_in_range() {
    let reference = RgbImage::filled(4, 4, [100.0; 3]);
    let mut corrupt = reference.clone();
    corrupt.data[[1, 1, 0]] = f32::NAN;
    let images = vec![Cow::Borrowed(&reference), Cow::Borrowed(&corrupt)];

    let masks = compute_ghost_masks(
        &images,
        0,
        &GhostConfig::default(),
        true,
        &common::pool(1),
        &common::token(),
        |_| {},
    )
    .unwrap();

    let mask = masks.mask(1).unwrap();
    assert_eq!(mask[[1, 1]], 0.0);
    assert_eq!(mask[[0, 0]], 1.0);
    assert!(mask.iter().all(|v| (0.0..=1.0).contains(v)));
}
