mod cancel;
mod pool;

pub use cancel::CancellationToken;
pub use pool::WorkerPool;
