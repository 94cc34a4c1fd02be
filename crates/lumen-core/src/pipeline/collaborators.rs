//! Downstream stages the fused image is handed to.
//!
//! Their internals live outside this crate. Each receives the previous
//! stage's image by value and must return an image of the same dimensions.

use std::sync::Arc;

use crate::frame::RgbImage;

/// Error type returned by post-processing collaborators.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Tone-maps the denoised merge.
pub trait DynamicRangeOptimizer: Send + Sync {
    fn optimize(&self, image: RgbImage) -> Result<RgbImage, CollaboratorError>;
}

/// Sharpens the tone-mapped image.
pub trait DetailEnhancer: Send + Sync {
    fn enhance(&self, image: RgbImage) -> Result<RgbImage, CollaboratorError>;
}

/// Final colour correction; its output is the run's result.
pub trait ColorFidelityCorrector: Send + Sync {
    fn correct(&self, image: RgbImage) -> Result<RgbImage, CollaboratorError>;
}

/// Returns its input unchanged. Stands in for every collaborator by default.
#[derive(Clone, Copy, Debug, Default)]
pub struct Passthrough;

impl DynamicRangeOptimizer for Passthrough {
    fn optimize(&self, image: RgbImage) -> Result<RgbImage, CollaboratorError> {
        Ok(image)
    }
}

impl DetailEnhancer for Passthrough {
    fn enhance(&self, image: RgbImage) -> Result<RgbImage, CollaboratorError> {
        Ok(image)
    }
}

impl ColorFidelityCorrector for Passthrough {
    fn correct(&self, image: RgbImage) -> Result<RgbImage, CollaboratorError> {
        Ok(image)
    }
}

/// The three collaborators, called in this order after denoising.
#[derive(Clone)]
pub struct PostProcessors {
    pub dynamic_range: Arc<dyn DynamicRangeOptimizer>,
    pub detail: Arc<dyn DetailEnhancer>,
    pub color_fidelity: Arc<dyn ColorFidelityCorrector>,
}

impl Default for PostProcessors {
    fn default() -> Self {
        Self {
            dynamic_range: Arc::new(Passthrough),
            detail: Arc::new(Passthrough),
            color_fidelity: Arc::new(Passthrough),
        }
    }
}
