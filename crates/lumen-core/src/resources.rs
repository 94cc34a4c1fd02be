//! Allocation accounting for the large intermediate buffers of a run.
//!
//! Every pyramid, ghost-mask arena, accumulation buffer and denoise output
//! registers an [`AllocationGuard`] while it is alive. The guard decrements
//! the live counters when dropped. Intermediates are released when a run
//! ends; the ghost masks handed back in the result stay live until that
//! result is dropped.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Category of tracked buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    Pyramid,
    GhostMask,
    Accumulator,
    Denoise,
}

impl BufferKind {
    pub const ALL: [BufferKind; 4] = [
        BufferKind::Pyramid,
        BufferKind::GhostMask,
        BufferKind::Accumulator,
        BufferKind::Denoise,
    ];

    fn slot(self) -> usize {
        match self {
            Self::Pyramid => 0,
            Self::GhostMask => 1,
            Self::Accumulator => 2,
            Self::Denoise => 3,
        }
    }
}

impl std::fmt::Display for BufferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pyramid => write!(f, "pyramid"),
            Self::GhostMask => write!(f, "ghost mask"),
            Self::Accumulator => write!(f, "accumulator"),
            Self::Denoise => write!(f, "denoise"),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    allocated: AtomicUsize,
    live: AtomicUsize,
    live_bytes: AtomicUsize,
}

/// Thread-safe counters of buffer allocations, per [`BufferKind`].
#[derive(Debug, Default)]
pub struct ResourceTracker {
    counters: [Counters; 4],
}

impl ResourceTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record a new buffer. It stays live until the returned guard is dropped.
    pub fn register(self: &Arc<Self>, kind: BufferKind, bytes: usize) -> AllocationGuard {
        let c = &self.counters[kind.slot()];
        c.allocated.fetch_add(1, Ordering::Relaxed);
        c.live.fetch_add(1, Ordering::AcqRel);
        c.live_bytes.fetch_add(bytes, Ordering::AcqRel);
        AllocationGuard {
            tracker: Arc::clone(self),
            kind,
            bytes,
        }
    }

    /// Number of buffers of `kind` ever registered.
    pub fn allocated(&self, kind: BufferKind) -> usize {
        self.counters[kind.slot()].allocated.load(Ordering::Relaxed)
    }

    /// Number of buffers of `kind` currently alive.
    pub fn live(&self, kind: BufferKind) -> usize {
        self.counters[kind.slot()].live.load(Ordering::Acquire)
    }

    pub fn total_allocated(&self) -> usize {
        BufferKind::ALL.iter().map(|&k| self.allocated(k)).sum()
    }

    pub fn total_live(&self) -> usize {
        BufferKind::ALL.iter().map(|&k| self.live(k)).sum()
    }

    pub fn live_bytes(&self) -> usize {
        self.counters
            .iter()
            .map(|c| c.live_bytes.load(Ordering::Acquire))
            .sum()
    }
}

/// RAII marker for one live tracked buffer.
#[derive(Debug)]
pub struct AllocationGuard {
    tracker: Arc<ResourceTracker>,
    kind: BufferKind,
    bytes: usize,
}

impl AllocationGuard {
    pub fn kind(&self) -> BufferKind {
        self.kind
    }
}

impl Drop for AllocationGuard {
    fn drop(&mut self) {
        let c = &self.tracker.counters[self.kind.slot()];
        c.live.fetch_sub(1, Ordering::AcqRel);
        c.live_bytes.fetch_sub(self.bytes, Ordering::AcqRel);
    }
}
