use std::sync::{mpsc, Arc};
use std::time::Duration;

use crate::frame::{AlignmentTransform, RgbImage};
use crate::ghost::GhostMaskSet;

use super::state::PipelineState;

/// Wall-clock time spent in each stage of a run.
#[derive(Clone, Copy, Debug, Default)]
pub struct StageTimings {
    pub align: Duration,
    pub merge: Duration,
    pub post_process: Duration,
}

impl StageTimings {
    pub fn total(&self) -> Duration {
        self.align + self.merge + self.post_process
    }
}

/// Everything a successful run produces.
#[derive(Clone, Debug)]
pub struct FusionResult {
    /// Final image after every post-processing stage.
    pub image: RgbImage,
    /// One transform per frame used, in input order.
    pub transforms: Vec<AlignmentTransform>,
    /// One mask per non-reference frame.
    pub ghost_masks: GhostMaskSet,
    /// Index of the reference among the frames used.
    pub reference_index: usize,
    /// Number of input frames that took part in the merge.
    pub frames_used: usize,
    pub timings: StageTimings,
}

/// How a run ended when it did not fail.
#[derive(Clone, Debug)]
pub enum RunOutcome {
    Completed(Arc<FusionResult>),
    /// The caller cancelled the run; no output was produced.
    Cancelled,
}

impl RunOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn result(&self) -> Option<&FusionResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Cancelled => None,
        }
    }
}

/// Thread-safe observer of pipeline state changes.
///
/// Called synchronously for every published state, in order. The state
/// lock is released first, so `on_state` may read a
/// [`StateHandle`](super::StateHandle). Other updates wait until it
/// returns, so implementors should return quickly.
pub trait StateReporter: Send + Sync {
    fn on_state(&self, _state: &PipelineState) {}
}

/// Reporter that ignores every update.
pub struct NoOpReporter;
impl StateReporter for NoOpReporter {}

/// Forwards every state over an mpsc channel.
///
/// Sending never blocks; once the receiver is gone updates are dropped.
pub struct ChannelReporter {
    tx: mpsc::Sender<PipelineState>,
}

impl ChannelReporter {
    pub fn new(tx: mpsc::Sender<PipelineState>) -> Self {
        Self { tx }
    }

    /// A reporter together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::Receiver<PipelineState>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }
}

impl StateReporter for ChannelReporter {
    fn on_state(&self, state: &PipelineState) {
        let _ = self.tx.send(state.clone());
    }
}

/// Adapts a closure into a [`StateReporter`].
pub struct FnReporter<F>(pub F);

impl<F> StateReporter for FnReporter<F>
where
    F: Fn(&PipelineState) + Send + Sync,
{
    fn on_state(&self, state: &PipelineState) {
        (self.0)(state)
    }
}
