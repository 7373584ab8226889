use thiserror::Error;

/// An error returned from the [`WorkerPool`] and its builder.
///
/// [`WorkerPool`]: crate::WorkerPool
#[derive(Error, Debug)]
pub enum PoolError {
    /// The pool has been shut down. A task rejected with this error was
    /// never scheduled and has been dropped without running.
    #[error("the worker pool is closed")]
    Closed,

    /// A pool needs at least one worker to ever drain its queue.
    #[error("worker count can not be 0")]
    ZeroWorkers,

    /// A buffered queue needs a positive capacity. Use
    /// [`QueueMode::Unbuffered`] for a zero-capacity handoff.
    ///
    /// [`QueueMode::Unbuffered`]: crate::QueueMode::Unbuffered
    #[error("buffered queue capacity can not be 0")]
    ZeroCapacity,

    /// The operating system refused to start a worker thread.
    #[error("failed to spawn a worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}
