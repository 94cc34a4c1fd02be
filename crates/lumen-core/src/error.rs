use thiserror::Error;

#[derive(Error, Debug)]
pub enum FusionError {
    #[error("Not enough frames: {provided} provided, at least {required} required")]
    InsufficientFrames { required: usize, provided: usize },

    #[error("Frame {index} is {found_width}x{found_height}, expected {expected_width}x{expected_height}")]
    DimensionMismatch {
        index: usize,
        expected_width: usize,
        expected_height: usize,
        found_width: usize,
        found_height: usize,
    },

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Failed to allocate {bytes} bytes")]
    Allocation { bytes: usize },

    #[error("Post-processing stage '{stage}' failed: {reason}")]
    Collaborator { stage: String, reason: String },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("Run cancelled")]
    Cancelled,
}

impl FusionError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, FusionError>;
