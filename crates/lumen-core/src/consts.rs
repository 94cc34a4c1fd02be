/// Number of channels in an RGB image.
pub const COLOR_CHANNEL_COUNT: usize = 3;

/// Largest channel value on the 8-bit scale used for pixel data.
pub const CHANNEL_MAX: f32 = 255.0;

/// Default number of pyramid levels for coarse-to-fine alignment.
pub const DEFAULT_PYRAMID_LEVELS: usize = 4;

/// Default block-matching search radius at full resolution, in pixels.
pub const DEFAULT_SEARCH_RADIUS: usize = 16;

/// Smallest search radius used at any pyramid level.
pub const MIN_SEARCH_RADIUS: usize = 2;

/// The sparse sampling grid stride is `min(width, height) / GRID_DIVISOR`.
pub const GRID_DIVISOR: usize = 32;

/// Normalized colour difference at or below which a pixel is fully trusted.
pub const DEFAULT_GHOST_THRESHOLD: f32 = 0.15;

/// Width of the Gaussian falloff above the ghost threshold.
pub const DEFAULT_GHOST_SIGMA: f32 = 0.1;

/// Bilateral filter kernel radius.
pub const DEFAULT_DENOISE_RADIUS: usize = 2;

/// Bilateral filter spatial sigma.
pub const DEFAULT_DENOISE_SIGMA_SPACE: f32 = 3.0;

/// Colour sigma at full denoise strength (8-bit scale).
pub const DEFAULT_DENOISE_SIGMA_COLOR: f32 = 30.0;

/// Minimum frame count accepted by the orchestrator.
pub const DEFAULT_MIN_FRAMES: usize = 4;

/// Default frame-count target for a burst.
pub const DEFAULT_FRAME_COUNT: usize = 8;

/// Rows handed to one worker task in the row-partitioned pixel loops.
pub const ROW_BAND_HEIGHT: usize = 16;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f32 = 1e-10;
