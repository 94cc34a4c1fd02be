use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::align::align_frames_with_progress;
use crate::compute::{CancellationToken, WorkerPool};
use crate::error::{FusionError, Result};
use crate::filters::bilateral_denoise;
use crate::frame::{Frame, RgbImage};
use crate::ghost::compute_ghost_masks;
use crate::resources::ResourceTracker;
use crate::stack::weighted_merge;

use super::collaborators::{CollaboratorError, PostProcessors};
use super::config::FusionConfig;
use super::state::{PipelineState, PostStage, StateHandle, StateMachine};
use super::types::{FusionResult, NoOpReporter, RunOutcome, StageTimings, StateReporter};

/// Sequences alignment, ghost masking, merging, denoising and the external
/// post-processing stages for one burst at a time.
pub struct FusionPipeline {
    config: FusionConfig,
    pool: WorkerPool,
    post: PostProcessors,
    tracker: Arc<ResourceTracker>,
    state: StateMachine,
}

impl FusionPipeline {
    /// Pipeline with pass-through collaborators and no state observer.
    pub fn new(config: FusionConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: FusionConfig) -> FusionPipelineBuilder {
        FusionPipelineBuilder {
            config,
            post: PostProcessors::default(),
            reporter: Arc::new(NoOpReporter),
            tracker: None,
        }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn tracker(&self) -> &Arc<ResourceTracker> {
        &self.tracker
    }

    /// Handle for polling the current state from another thread.
    pub fn state_handle(&self) -> StateHandle {
        self.state.handle()
    }

    pub fn state(&self) -> PipelineState {
        self.state.handle().current()
    }

    /// Fuse a burst.
    ///
    /// Precondition failures, allocation failures and collaborator failures
    /// end in `PipelineState::Error` and are returned as `Err`. Cancellation
    /// through `cancel` ends in `PipelineState::Cancelled` and returns
    /// `Ok(RunOutcome::Cancelled)`. Every intermediate buffer is dropped
    /// before the terminal state is published.
    pub fn run(&mut self, frames: Vec<Frame>, cancel: &CancellationToken) -> Result<RunOutcome> {
        self.state.reset();

        match self.run_stages(frames, cancel) {
            Ok(result) => {
                let result = Arc::new(result);
                self.state
                    .transition(PipelineState::Completed(Arc::clone(&result)))?;
                info!(
                    frames = result.frames_used,
                    elapsed_ms = result.timings.total().as_millis() as u64,
                    "Fusion complete"
                );
                Ok(RunOutcome::Completed(result))
            }
            Err(FusionError::Cancelled) => {
                info!("Fusion cancelled");
                self.state.transition(PipelineState::Cancelled)?;
                Ok(RunOutcome::Cancelled)
            }
            Err(e) => {
                warn!(error = %e, "Fusion failed");
                if let Err(transition_err) = self.state.transition(PipelineState::Error {
                    reason: e.to_string(),
                }) {
                    warn!(error = %transition_err, "Could not publish error state");
                }
                Err(e)
            }
        }
    }

    fn run_stages(&self, frames: Vec<Frame>, cancel: &CancellationToken) -> Result<FusionResult> {
        let config = &self.config;
        config.validate()?;

        if config.frame_count != 0 && frames.len() != config.frame_count {
            warn!(
                supplied = frames.len(),
                target = config.frame_count,
                "Burst size differs from the configured frame count"
            );
        }
        let frames = select_window(frames, config.max_frames);
        let n = frames.len();
        if n < config.min_frames {
            return Err(FusionError::InsufficientFrames {
                required: config.min_frames,
                provided: n,
            });
        }
        validate_frames(&frames)?;

        let reference_idx = n / 2;
        let (width, height) = frames[reference_idx].image.dim();
        info!(
            frames = n,
            width,
            height,
            reference = reference_idx,
            workers = self.pool.threads(),
            "Starting fusion"
        );
        let mut timings = StageTimings::default();

        // Alignment
        let started = Instant::now();
        self.state
            .transition(PipelineState::Aligning { progress: 0.0 })?;
        cancel.check()?;
        let alignment = config.effective_alignment();
        let aligned = align_frames_with_progress(
            &frames,
            reference_idx,
            &alignment,
            &self.pool,
            cancel,
            &self.tracker,
            |done| self.state.advance_progress(done as f32 / n as f32),
        )?;
        timings.align = started.elapsed();
        info!(
            elapsed_ms = timings.align.as_millis() as u64,
            method = %alignment,
            "Alignment complete"
        );

        // Ghost masks + weighted merge. Progress counts one step per mask
        // and one for the merge itself.
        let started = Instant::now();
        self.state.transition(PipelineState::Merging { progress: 0.0 })?;
        cancel.check()?;
        let merge_steps = n as f32;
        let masks = compute_ghost_masks(
            &aligned.images,
            reference_idx,
            &config.ghost,
            config.enable_ghost_elimination,
            &self.pool,
            cancel,
            |done| self.state.advance_progress(done as f32 / merge_steps),
        )?
        .track(&self.tracker);

        let merged = weighted_merge(
            &aligned.images,
            &aligned.transforms,
            &masks,
            &self.pool,
            cancel,
            &self.tracker,
        )?;
        self.state.advance_progress(1.0);
        let transforms = aligned.transforms;
        drop(aligned.images);
        drop(frames);
        timings.merge = started.elapsed();
        info!(
            elapsed_ms = timings.merge.as_millis() as u64,
            ghost_elimination = config.enable_ghost_elimination,
            "Merge complete"
        );

        // Post-processing
        let started = Instant::now();
        self.state.transition(PipelineState::PostProcessing {
            stage: PostStage::Denoise,
        })?;
        cancel.check()?;
        let mut image = bilateral_denoise(
            &merged,
            config.denoise_strength,
            &config.denoise,
            &self.pool,
            cancel,
            &self.tracker,
        )?;
        drop(merged);

        if config.enable_hdr {
            image = self.post_stage(PostStage::DynamicRange, image, cancel, |img| {
                self.post.dynamic_range.optimize(img)
            })?;
        }
        image = self.post_stage(PostStage::DetailEnhancement, image, cancel, |img| {
            self.post.detail.enhance(img)
        })?;
        image = self.post_stage(PostStage::ColorFidelity, image, cancel, |img| {
            self.post.color_fidelity.correct(img)
        })?;
        timings.post_process = started.elapsed();

        Ok(FusionResult {
            image,
            transforms,
            ghost_masks: masks,
            reference_index: reference_idx,
            frames_used: n,
            timings,
        })
    }

    /// Run one external collaborator and check it kept the dimensions.
    fn post_stage<F>(
        &self,
        stage: PostStage,
        image: RgbImage,
        cancel: &CancellationToken,
        apply: F,
    ) -> Result<RgbImage>
    where
        F: FnOnce(RgbImage) -> std::result::Result<RgbImage, CollaboratorError>,
    {
        self.state.transition(PipelineState::PostProcessing { stage })?;
        cancel.check()?;
        let expected = image.dim();
        let out = apply(image).map_err(|e| FusionError::Collaborator {
            stage: stage.to_string(),
            reason: e.to_string(),
        })?;
        if out.dim() != expected {
            let (w, h) = out.dim();
            return Err(FusionError::Collaborator {
                stage: stage.to_string(),
                reason: format!(
                    "returned {w}x{h}, expected {}x{}",
                    expected.0, expected.1
                ),
            });
        }
        Ok(out)
    }
}

/// Configures collaborators, observer and tracker before building a pipeline.
pub struct FusionPipelineBuilder {
    config: FusionConfig,
    post: PostProcessors,
    reporter: Arc<dyn StateReporter>,
    tracker: Option<Arc<ResourceTracker>>,
}

impl FusionPipelineBuilder {
    pub fn post_processors(mut self, post: PostProcessors) -> Self {
        self.post = post;
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn StateReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn tracker(mut self, tracker: Arc<ResourceTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn build(self) -> Result<FusionPipeline> {
        self.config.validate()?;
        let pool = WorkerPool::new(self.config.worker_threads)?;
        Ok(FusionPipeline {
            config: self.config,
            pool,
            post: self.post,
            tracker: self.tracker.unwrap_or_else(ResourceTracker::new),
            state: StateMachine::new(self.reporter),
        })
    }
}

/// Fuse a burst with default collaborators.
pub fn fuse(frames: Vec<Frame>, config: FusionConfig) -> Result<RunOutcome> {
    let mut pipeline = FusionPipeline::new(config)?;
    pipeline.run(frames, &CancellationToken::new())
}

/// Keep the centred window of `target` frames; `target == 0` keeps all.
fn select_window(mut frames: Vec<Frame>, target: usize) -> Vec<Frame> {
    if target == 0 || frames.len() <= target {
        return frames;
    }
    let start = (frames.len() - target) / 2;
    info!(
        supplied = frames.len(),
        target, "Trimming burst to the centred frame window"
    );
    frames.truncate(start + target);
    frames.drain(..start);
    frames
}

/// Equal, non-empty dimensions and finite pixel values across the burst.
fn validate_frames(frames: &[Frame]) -> Result<()> {
    let (w, h) = frames[0].image.dim();
    if w == 0 || h == 0 {
        return Err(FusionError::InvalidDimensions {
            width: w,
            height: h,
        });
    }
    for (i, frame) in frames.iter().enumerate().skip(1) {
        if frame.image.dim() != (w, h) {
            return Err(FusionError::DimensionMismatch {
                index: i,
                expected_width: w,
                expected_height: h,
                found_width: frame.width(),
                found_height: frame.height(),
            });
        }
    }
    for (i, frame) in frames.iter().enumerate() {
        if let Some((x, y)) = frame.image.first_non_finite() {
            return Err(FusionError::Precondition(format!(
                "frame {i} has a non-finite value at ({x}, {y})"
            )));
        }
    }
    Ok(())
}
