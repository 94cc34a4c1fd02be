use ndarray::{Array3, ArrayViewMut3, Axis};
use rayon::prelude::*;

use crate::consts::ROW_BAND_HEIGHT;
use crate::error::{FusionError, Result};

use super::CancellationToken;

/// Bounded worker pool for the per-frame and per-row stages of a run.
///
/// All parallel work of a run executes inside this pool, so a run never
/// spawns more than `threads` workers no matter how many frames it has.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    threads: usize,
}

impl WorkerPool {
    /// Build a pool with `threads` workers, or one per available core.
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let threads = match threads {
            Some(0) => {
                return Err(FusionError::WorkerPool(
                    "worker thread count must be >= 1".to_string(),
                ))
            }
            Some(n) => n,
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|idx| format!("lumen-worker-{idx}"))
            .build()
            .map_err(|e| FusionError::WorkerPool(format!("failed to build thread pool: {e}")))?;
        Ok(Self { pool, threads })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `f` with this pool as the rayon context.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(f)
    }

    /// Partition `out` into disjoint bands of rows and hand each band to `f`
    /// together with the index of its first row.
    ///
    /// The token is checked before each band; a cancelled run stops handing
    /// out work and returns [`FusionError::Cancelled`].
    pub fn try_for_each_row_band<F>(
        &self,
        out: &mut Array3<f32>,
        cancel: &CancellationToken,
        f: F,
    ) -> Result<()>
    where
        F: Fn(usize, ArrayViewMut3<'_, f32>) + Send + Sync,
    {
        self.pool.install(|| {
            out.axis_chunks_iter_mut(Axis(0), ROW_BAND_HEIGHT)
                .into_par_iter()
                .enumerate()
                .try_for_each(|(band, rows)| {
                    cancel.check()?;
                    f(band * ROW_BAND_HEIGHT, rows);
                    Ok(())
                })
        })
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .finish()
    }
}
