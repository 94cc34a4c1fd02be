pub mod collaborators;
pub mod config;
mod orchestrator;
mod state;
mod types;

pub use collaborators::{
    ColorFidelityCorrector, CollaboratorError, DetailEnhancer, DynamicRangeOptimizer,
    Passthrough, PostProcessors,
};
pub use config::{AlignmentConfig, DenoiseConfig, FusionConfig, GhostConfig};
pub use orchestrator::{fuse, FusionPipeline, FusionPipelineBuilder};
pub use state::{PipelineState, PostStage, StateHandle};
pub use types::{
    ChannelReporter, FnReporter, FusionResult, NoOpReporter, RunOutcome, StageTimings,
    StateReporter,
};
