use ndarray::{Array3, Axis};
use serde::{Deserialize, Serialize};

use crate::consts::{CHANNEL_MAX, COLOR_CHANNEL_COUNT};
use crate::error::{FusionError, Result};

/// An RGB image buffer.
/// Channel values are f32 on the 8-bit scale [0.0, 255.0].
#[derive(Clone, Debug, PartialEq)]
pub struct RgbImage {
    /// Pixel data, row-major, shape = (height, width, 3)
    pub data: Array3<f32>,
}

impl RgbImage {
    /// Wrap an existing array. The last axis must hold exactly three channels.
    pub fn from_array(data: Array3<f32>) -> Result<Self> {
        let (h, w, c) = data.dim();
        if c != COLOR_CHANNEL_COUNT {
            return Err(FusionError::Precondition(format!(
                "expected {COLOR_CHANNEL_COUNT} channels, got {c}"
            )));
        }
        if h == 0 || w == 0 {
            return Err(FusionError::InvalidDimensions {
                width: w,
                height: h,
            });
        }
        Self { data }.ensure_finite()
    }

    /// Build an image from interleaved 8-bit RGB bytes.
    pub fn from_rgb8(width: usize, height: usize, pixels: &[u8]) -> Result<Self> {
        let floats: Vec<f32> = pixels.iter().map(|&v| v as f32).collect();
        Self::from_rgb_f32(width, height, floats)
    }

    /// Build an image from interleaved f32 RGB values on the 8-bit scale.
    pub fn from_rgb_f32(width: usize, height: usize, pixels: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(FusionError::InvalidDimensions { width, height });
        }
        let expected = width * height * COLOR_CHANNEL_COUNT;
        if pixels.len() != expected {
            return Err(FusionError::Precondition(format!(
                "pixel buffer holds {} values, {width}x{height} RGB needs {expected}",
                pixels.len()
            )));
        }
        let data = Array3::from_shape_vec((height, width, COLOR_CHANNEL_COUNT), pixels)
            .map_err(|e| FusionError::Precondition(e.to_string()))?;
        Self { data }.ensure_finite()
    }

    /// A solid-colour image.
    pub fn filled(width: usize, height: usize, rgb: [f32; 3]) -> Self {
        let mut data = Array3::<f32>::zeros((height, width, COLOR_CHANNEL_COUNT));
        for mut px in data.lanes_mut(Axis(2)) {
            px[0] = rgb[0];
            px[1] = rgb[1];
            px[2] = rgb[2];
        }
        Self { data }
    }

    /// Copy the image through the fallible allocator.
    pub fn try_clone(&self) -> Result<Self> {
        let mut data = try_zeros_array3(self.data.dim())?;
        data.assign(&self.data);
        Ok(Self { data })
    }

    /// `(x, y)` of the first pixel holding a NaN or infinite channel.
    pub fn first_non_finite(&self) -> Option<(usize, usize)> {
        self.data
            .indexed_iter()
            .find(|(_, v)| !v.is_finite())
            .map(|((y, x, _), _)| (x, y))
    }

    /// `Err(Precondition)` naming the first non-finite pixel.
    pub fn ensure_finite(self) -> Result<Self> {
        match self.first_non_finite() {
            Some((x, y)) => Err(FusionError::Precondition(format!(
                "non-finite pixel value at ({x}, {y})"
            ))),
            None => Ok(self),
        }
    }

    /// Allocate a zeroed image, reporting allocation failure instead of aborting.
    pub fn try_zeros(width: usize, height: usize) -> Result<Self> {
        Ok(Self {
            data: try_zeros_array3((height, width, COLOR_CHANNEL_COUNT))?,
        })
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    /// RGB values at (x, y).
    pub fn pixel(&self, x: usize, y: usize) -> [f32; 3] {
        [
            self.data[[y, x, 0]],
            self.data[[y, x, 1]],
            self.data[[y, x, 2]],
        ]
    }

    /// Size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }

    /// Interleaved 8-bit RGB, rounded and clamped.
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.data
            .iter()
            .map(|&v| v.round().clamp(0.0, CHANNEL_MAX) as u8)
            .collect()
    }
}

/// Zero-filled array whose backing storage is reserved fallibly.
pub(crate) fn try_zeros_array3(shape: (usize, usize, usize)) -> Result<Array3<f32>> {
    let len = shape.0 * shape.1 * shape.2;
    let mut buf: Vec<f32> = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| FusionError::Allocation {
            bytes: len * std::mem::size_of::<f32>(),
        })?;
    buf.resize(len, 0.0);
    Array3::from_shape_vec(shape, buf).map_err(|e| FusionError::Precondition(e.to_string()))
}

/// Exposure metadata captured alongside each frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameMetadata {
    pub capture_timestamp_ns: u64,
    pub exposure_duration_ns: u64,
    pub iso: u32,
    pub ev_offset: f32,
}

/// A single captured exposure.
#[derive(Clone, Debug)]
pub struct Frame {
    pub image: RgbImage,
    pub metadata: FrameMetadata,
}

impl Frame {
    pub fn new(image: RgbImage, metadata: FrameMetadata) -> Self {
        Self { image, metadata }
    }

    /// Frame with default (zeroed) metadata.
    pub fn from_image(image: RgbImage) -> Self {
        Self::new(image, FrameMetadata::default())
    }

    pub fn width(&self) -> usize {
        self.image.width()
    }

    pub fn height(&self) -> usize {
        self.image.height()
    }
}

/// Global transform mapping a frame onto the reference.
///
/// `reference(x, y) ~ target(x + offset_x, y + offset_y)`. Rotation and
/// scale are reserved and always 0 and 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignmentTransform {
    pub offset_x: f32,
    pub offset_y: f32,
    pub rotation: f32,
    pub scale: f32,
    pub confidence: f32,
}

impl AlignmentTransform {
    pub const IDENTITY: Self = Self {
        offset_x: 0.0,
        offset_y: 0.0,
        rotation: 0.0,
        scale: 1.0,
        confidence: 1.0,
    };

    pub fn translation(dx: f32, dy: f32) -> Self {
        Self {
            offset_x: dx,
            offset_y: dy,
            ..Self::IDENTITY
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for AlignmentTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
