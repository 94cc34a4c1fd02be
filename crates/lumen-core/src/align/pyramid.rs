//! Multi-resolution image pyramid for coarse-to-fine alignment.
//!
//! Each level halves the previous one with a 2x2 box average.

use ndarray::{s, Zip};

use crate::consts::COLOR_CHANNEL_COUNT;
use crate::error::Result;
use crate::frame::{try_zeros_array3, RgbImage};

/// Ordered pyramid levels; index 0 is the full-resolution input, borrowed.
#[derive(Clone, Debug)]
pub struct ImagePyramid<'a> {
    base: &'a RgbImage,
    coarse: Vec<RgbImage>,
}

impl<'a> ImagePyramid<'a> {
    /// Build a pyramid with up to `levels` levels.
    ///
    /// The level count is clamped so the coarsest level is at least one
    /// pixel on each axis; `levels == 0` is treated as 1.
    pub fn build(image: &'a RgbImage, levels: usize) -> Result<Self> {
        let levels = clamp_levels(image.width(), image.height(), levels);
        let mut coarse: Vec<RgbImage> = Vec::with_capacity(levels - 1);
        for _ in 1..levels {
            let next = downsample_box_2x(coarse.last().unwrap_or(image))?;
            coarse.push(next);
        }
        Ok(Self {
            base: image,
            coarse,
        })
    }

    pub fn len(&self) -> usize {
        self.coarse.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn level(&self, index: usize) -> &RgbImage {
        match index {
            0 => self.base,
            _ => &self.coarse[index - 1],
        }
    }

    /// Bytes owned by the pyramid; the borrowed base level is not counted.
    pub fn byte_size(&self) -> usize {
        self.coarse.iter().map(RgbImage::byte_size).sum()
    }
}

/// Largest level count <= `requested` whose coarsest level is still >= 1 px.
pub fn clamp_levels(width: usize, height: usize, requested: usize) -> usize {
    let min_side = width.min(height).max(1);
    // floor(log2(min_side)) + 1 levels fit
    let fit = (usize::BITS - min_side.leading_zeros()) as usize;
    requested.max(1).min(fit)
}

/// Halve an image with a 2x2 area average. An odd trailing row or column is dropped.
pub fn downsample_box_2x(image: &RgbImage) -> Result<RgbImage> {
    let new_h = (image.height() / 2).max(1);
    let new_w = (image.width() / 2).max(1);
    let mut data = try_zeros_array3((new_h, new_w, COLOR_CHANNEL_COUNT))?;

    let src = &image.data;
    let (h, w, _) = src.dim();
    let y_step = if h > 1 { 2 } else { 1 };
    let x_step = if w > 1 { 2 } else { 1 };

    let a = src.slice(s![0..new_h * y_step;y_step, 0..new_w * x_step;x_step, ..]);
    let b = src.slice(s![0..new_h * y_step;y_step, x_step - 1..new_w * x_step;x_step, ..]);
    let c = src.slice(s![y_step - 1..new_h * y_step;y_step, 0..new_w * x_step;x_step, ..]);
    let d = src.slice(s![y_step - 1..new_h * y_step;y_step, x_step - 1..new_w * x_step;x_step, ..]);

    Zip::from(&mut data)
        .and(&a)
        .and(&b)
        .and(&c)
        .and(&d)
        .for_each(|out, &a, &b, &c, &d| *out = (a + b + c + d) * 0.25);

    Ok(RgbImage { data })
}
