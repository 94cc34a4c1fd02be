use std::borrow::Cow;

use crate::consts::COLOR_CHANNEL_COUNT;
use crate::error::Result;
use crate::frame::{try_zeros_array3, AlignmentTransform, RgbImage};

/// Resample `image` so it lines up with the reference under `transform`.
///
/// `aligned(x, y) = image(x + offset_x, y + offset_y)`, bilinear, with
/// samples outside the frame clamped to the nearest edge pixel. The
/// identity transform borrows the input unchanged.
pub fn warp_translate<'a>(
    image: &'a RgbImage,
    transform: &AlignmentTransform,
) -> Result<Cow<'a, RgbImage>> {
    if transform.offset_x == 0.0 && transform.offset_y == 0.0 {
        return Ok(Cow::Borrowed(image));
    }

    let (w, h) = image.dim();
    let mut data = try_zeros_array3((h, w, COLOR_CHANNEL_COUNT))?;
    let dx = transform.offset_x as f64;
    let dy = transform.offset_y as f64;

    for row in 0..h {
        for col in 0..w {
            let px = bilinear_sample(image, col as f64 + dx, row as f64 + dy);
            for c in 0..COLOR_CHANNEL_COUNT {
                data[[row, col, c]] = px[c];
            }
        }
    }

    Ok(Cow::Owned(RgbImage { data }))
}

/// Bilinear RGB sample at fractional (x, y), clamped to the image bounds.
pub fn bilinear_sample(image: &RgbImage, x: f64, y: f64) -> [f32; 3] {
    let (w, h) = image.dim();
    let x = x.clamp(0.0, (w - 1) as f64);
    let y = y.clamp(0.0, (h - 1) as f64);

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = (x - x0 as f64) as f32;
    let fy = (y - y0 as f64) as f32;

    let d = &image.data;
    let mut out = [0.0f32; 3];
    for (c, v) in out.iter_mut().enumerate() {
        let top = d[[y0, x0, c]] * (1.0 - fx) + d[[y0, x1, c]] * fx;
        let bottom = d[[y1, x0, c]] * (1.0 - fx) + d[[y1, x1, c]] * fx;
        *v = top * (1.0 - fy) + bottom * fy;
    }
    out
}
