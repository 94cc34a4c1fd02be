use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{FusionError, Result};

/// Shared flag a caller flips to stop a running fusion.
///
/// Clones share the same flag. Workers poll it between frames and between
/// row bands, so cancellation takes effect within one unit of work.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once the token has been cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(FusionError::Cancelled)
        } else {
            Ok(())
        }
    }
}
