use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{FusionError, Result};

use super::types::{FusionResult, StateReporter};

/// Post-processing steps, in the order they run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PostStage {
    Denoise,
    DynamicRange,
    DetailEnhancement,
    ColorFidelity,
}

impl std::fmt::Display for PostStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Denoise => write!(f, "denoise"),
            Self::DynamicRange => write!(f, "dynamic-range"),
            Self::DetailEnhancement => write!(f, "detail"),
            Self::ColorFidelity => write!(f, "color-fidelity"),
        }
    }
}

/// Observable state of a fusion run.
///
/// Transitions only move forward; `Completed`, `Error` and `Cancelled` are
/// terminal. Every run starts again from `Idle`.
#[derive(Clone, Debug)]
pub enum PipelineState {
    Idle,
    /// Fraction of frames aligned, in [0, 1].
    Aligning { progress: f32 },
    /// Fraction of the merge done, in [0, 1].
    Merging { progress: f32 },
    PostProcessing { stage: PostStage },
    Completed(Arc<FusionResult>),
    Error { reason: String },
    Cancelled,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed(_) | Self::Error { .. } | Self::Cancelled
        )
    }

    /// Progress fraction of the Aligning and Merging states.
    pub fn progress(&self) -> Option<f32> {
        match self {
            Self::Aligning { progress } | Self::Merging { progress } => Some(*progress),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Aligning { .. } => "Aligning",
            Self::Merging { .. } => "Merging",
            Self::PostProcessing { .. } => "PostProcessing",
            Self::Completed(_) => "Completed",
            Self::Error { .. } => "Error",
            Self::Cancelled => "Cancelled",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Aligning { .. } => 1,
            Self::Merging { .. } => 2,
            Self::PostProcessing { .. } => 3,
            Self::Completed(_) | Self::Error { .. } | Self::Cancelled => 4,
        }
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: &PipelineState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (_, Self::Error { .. } | Self::Cancelled) => true,
            (Self::PostProcessing { .. }, Self::Completed(_)) => true,
            (_, Self::Completed(_)) => false,
            (Self::Aligning { progress: a }, Self::Aligning { progress: b })
            | (Self::Merging { progress: a }, Self::Merging { progress: b }) => b >= a,
            (Self::PostProcessing { stage: a }, Self::PostProcessing { stage: b }) => b > a,
            _ => next.rank() > self.rank(),
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aligning { progress } | Self::Merging { progress } => {
                write!(f, "{} ({:.0}%)", self.name(), progress * 100.0)
            }
            Self::PostProcessing { stage } => write!(f, "PostProcessing ({stage})"),
            Self::Error { reason } => write!(f, "Error: {reason}"),
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// Read-only view of a pipeline's current state, for polling from other threads.
#[derive(Clone, Debug)]
pub struct StateHandle {
    current: Arc<Mutex<PipelineState>>,
}

impl StateHandle {
    pub fn current(&self) -> PipelineState {
        self.current.lock().clone()
    }
}

/// The single owned state value of a pipeline.
///
/// `publish` serialises updates so observers see states in exactly the
/// order they were set. The reporter runs after `current` is unlocked, so
/// it may poll a [`StateHandle`] from inside `on_state`.
pub(crate) struct StateMachine {
    current: Arc<Mutex<PipelineState>>,
    publish: Mutex<()>,
    reporter: Arc<dyn StateReporter>,
}

impl StateMachine {
    pub(crate) fn new(reporter: Arc<dyn StateReporter>) -> Self {
        Self {
            current: Arc::new(Mutex::new(PipelineState::Idle)),
            publish: Mutex::new(()),
            reporter,
        }
    }

    pub(crate) fn handle(&self) -> StateHandle {
        StateHandle {
            current: Arc::clone(&self.current),
        }
    }

    /// Back to `Idle` for a new run.
    pub(crate) fn reset(&self) {
        let _publish = self.publish.lock();
        *self.current.lock() = PipelineState::Idle;
        self.reporter.on_state(&PipelineState::Idle);
    }

    pub(crate) fn transition(&self, next: PipelineState) -> Result<()> {
        let _publish = self.publish.lock();
        let published = {
            let mut current = self.current.lock();
            if !current.can_transition_to(&next) {
                return Err(FusionError::InvalidTransition {
                    from: current.to_string(),
                    to: next.to_string(),
                });
            }
            debug!(from = %*current, to = %next, "Pipeline state");
            *current = next;
            current.clone()
        };
        self.reporter.on_state(&published);
        Ok(())
    }

    /// Raise the progress of the current Aligning/Merging state.
    ///
    /// Updates that would lower the fraction (late reports from a worker
    /// pool) are dropped, keeping published progress monotone.
    pub(crate) fn advance_progress(&self, fraction: f32) {
        let fraction = fraction.clamp(0.0, 1.0);
        let _publish = self.publish.lock();
        let published = {
            let mut current = self.current.lock();
            let next = match &*current {
                PipelineState::Aligning { progress } if fraction > *progress => {
                    PipelineState::Aligning { progress: fraction }
                }
                PipelineState::Merging { progress } if fraction > *progress => {
                    PipelineState::Merging { progress: fraction }
                }
                _ => return,
            };
            *current = next.clone();
            next
        };
        self.reporter.on_state(&published);
    }
}
