use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_DENOISE_RADIUS, DEFAULT_DENOISE_SIGMA_COLOR, DEFAULT_DENOISE_SIGMA_SPACE,
    DEFAULT_FRAME_COUNT, DEFAULT_GHOST_SIGMA, DEFAULT_GHOST_THRESHOLD, DEFAULT_MIN_FRAMES,
    DEFAULT_PYRAMID_LEVELS, DEFAULT_SEARCH_RADIUS, GRID_DIVISOR, MIN_SEARCH_RADIUS,
};
use crate::error::{FusionError, Result};

/// Caller-supplied settings for one fusion run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Number of frames the capture aimed for. A burst of a different size
    /// is still fused in full; the mismatch is only logged. 0 disables the
    /// check.
    pub frame_count: usize,
    /// Trim larger bursts to the centred window of this many frames.
    /// 0 (the default) keeps every input frame.
    pub max_frames: usize,
    pub enable_ghost_elimination: bool,
    /// Run the dynamic-range optimisation stage after denoising.
    pub enable_hdr: bool,
    /// Bilateral denoise strength in [0, 1]; 0 leaves the merge untouched.
    pub denoise_strength: f32,
    /// Trade alignment accuracy for speed (smaller search, sparser grid).
    pub prefer_speed: bool,
    /// Runs with fewer frames fail before any stage starts.
    pub min_frames: usize,
    /// Worker pool size; `None` uses every available core.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_threads: Option<usize>,
    pub alignment: AlignmentConfig,
    pub ghost: GhostConfig,
    pub denoise: DenoiseConfig,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            frame_count: DEFAULT_FRAME_COUNT,
            max_frames: 0,
            enable_ghost_elimination: true,
            enable_hdr: true,
            denoise_strength: 0.5,
            prefer_speed: false,
            min_frames: DEFAULT_MIN_FRAMES,
            worker_threads: None,
            alignment: AlignmentConfig::default(),
            ghost: GhostConfig::default(),
            denoise: DenoiseConfig::default(),
        }
    }
}

impl FusionConfig {
    /// Reject values no run could honour.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.denoise_strength) {
            return Err(FusionError::InvalidConfig(format!(
                "denoise_strength must be in [0, 1], got {}",
                self.denoise_strength
            )));
        }
        if self.min_frames == 0 {
            return Err(FusionError::InvalidConfig(
                "min_frames must be at least 1".to_string(),
            ));
        }
        if self.max_frames != 0 && self.max_frames < self.min_frames {
            return Err(FusionError::InvalidConfig(format!(
                "max_frames {} is below min_frames {}",
                self.max_frames, self.min_frames
            )));
        }
        if self.worker_threads == Some(0) {
            return Err(FusionError::InvalidConfig(
                "worker_threads must be at least 1".to_string(),
            ));
        }
        self.alignment.validate()?;
        self.ghost.validate()?;
        self.denoise.validate()
    }

    /// Alignment parameters after applying `prefer_speed`.
    pub fn effective_alignment(&self) -> AlignmentConfig {
        if self.prefer_speed {
            self.alignment.for_speed()
        } else {
            self.alignment.clone()
        }
    }
}

/// Block-matching alignment parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub pyramid_levels: usize,
    /// Search radius at full resolution; halved per coarser level.
    pub search_radius: usize,
    pub min_search_radius: usize,
    /// Sampling grid stride is `min(width, height) / grid_divisor`.
    pub grid_divisor: usize,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            pyramid_levels: DEFAULT_PYRAMID_LEVELS,
            search_radius: DEFAULT_SEARCH_RADIUS,
            min_search_radius: MIN_SEARCH_RADIUS,
            grid_divisor: GRID_DIVISOR,
        }
    }
}

impl AlignmentConfig {
    /// Half the search radius and twice the grid stride.
    pub fn for_speed(&self) -> Self {
        Self {
            pyramid_levels: self.pyramid_levels,
            search_radius: (self.search_radius / 2).max(self.min_search_radius),
            min_search_radius: self.min_search_radius,
            grid_divisor: (self.grid_divisor / 2).max(1),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.pyramid_levels == 0 {
            return Err(FusionError::InvalidConfig(
                "alignment.pyramid_levels must be at least 1".to_string(),
            ));
        }
        if self.grid_divisor == 0 {
            return Err(FusionError::InvalidConfig(
                "alignment.grid_divisor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Display for AlignmentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Block matching ({} levels, radius {})",
            self.pyramid_levels, self.search_radius
        )
    }
}

/// Ghost detection parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhostConfig {
    /// Normalised colour difference trusted fully.
    pub threshold: f32,
    /// Gaussian falloff width above the threshold.
    pub sigma: f32,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_GHOST_THRESHOLD,
            sigma: DEFAULT_GHOST_SIGMA,
        }
    }
}

impl GhostConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(FusionError::InvalidConfig(format!(
                "ghost.threshold must be in [0, 1], got {}",
                self.threshold
            )));
        }
        if self.sigma.partial_cmp(&0.0) != Some(std::cmp::Ordering::Greater) {
            return Err(FusionError::InvalidConfig(format!(
                "ghost.sigma must be positive, got {}",
                self.sigma
            )));
        }
        Ok(())
    }
}

/// Bilateral denoise parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseConfig {
    pub radius: usize,
    pub sigma_space: f32,
    /// Colour sigma at strength 1.0, on the 8-bit scale.
    pub sigma_color: f32,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_DENOISE_RADIUS,
            sigma_space: DEFAULT_DENOISE_SIGMA_SPACE,
            sigma_color: DEFAULT_DENOISE_SIGMA_COLOR,
        }
    }
}

impl DenoiseConfig {
    fn validate(&self) -> Result<()> {
        if self.sigma_space.partial_cmp(&0.0) != Some(std::cmp::Ordering::Greater) {
            return Err(FusionError::InvalidConfig(format!(
                "denoise.sigma_space must be positive, got {}",
                self.sigma_space
            )));
        }
        if self.sigma_color.is_nan() || self.sigma_color < 0.0 {
            return Err(FusionError::InvalidConfig(format!(
                "denoise.sigma_color must be non-negative, got {}",
                self.sigma_color
            )));
        }
        Ok(())
    }
}
