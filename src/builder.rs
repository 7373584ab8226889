use std::{sync::Arc, thread};

use crate::{PoolError, WorkerPool};

/// A function that creates the thread builder for the worker with the
/// given id.
pub type ThreadFactory = dyn Fn(usize) -> thread::Builder + Send + Sync + 'static;

/// The discipline of the intake queue between submitters and workers.
///
/// The mode is fixed when the pool is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueMode {
    /// Holds up to `capacity` pending tasks. [`submit`] blocks only
    /// while the queue is full.
    ///
    /// [`submit`]: crate::WorkerPool::submit
    Buffered(usize),

    /// A zero-capacity handoff. [`submit`] blocks until a worker takes
    /// the task.
    ///
    /// [`submit`]: crate::WorkerPool::submit
    Unbuffered,
}

impl QueueMode {
    pub(crate) fn capacity(self) -> usize {
        match self {
            QueueMode::Buffered(capacity) => capacity,
            QueueMode::Unbuffered => 0,
        }
    }
}

/// A builder of the [`WorkerPool`], which can be used to configure
/// the properties of a new pool.
///
/// # Examples
///
/// ```
/// use workerpool::{QueueMode, WorkerPoolBuilder};
///
/// let pool = WorkerPoolBuilder::default()
///     .worker_count(4)
///     .queue(QueueMode::Buffered(16))
///     .thread_factory_fn(|id| {
///         std::thread::Builder::new()
///             .name(format!("resizer-{id}"))
///             .stack_size(1024 * 64)
///     })
///     .build()
///     .unwrap();
///
/// pool.submit(|| println!("Hello World")).unwrap();
/// pool.shutdown().unwrap();
/// ```
pub struct WorkerPoolBuilder {
    pub(crate) worker_count: usize,
    pub(crate) queue: QueueMode,
    pub(crate) thread_factory: Arc<ThreadFactory>,
}

impl Default for WorkerPoolBuilder {
    /// Creates a new builder with the default configuration.
    ///
    /// # Default Configuration
    /// - `worker_count`: the number of physical cores of the current
    /// system, at least 1
    /// - `queue`: [`QueueMode::Buffered`] with a capacity of 1000
    /// - `thread_factory`: `|id| thread::Builder::new().name(format!("workerpool-{id}"))`
    fn default() -> Self {
        Self {
            worker_count: usize::max(1, num_cpus::get_physical()),
            queue: QueueMode::Buffered(1000),
            thread_factory: Arc::new(|id: usize| {
                thread::Builder::new().name(format!("workerpool-{id}"))
            }),
        }
    }
}

impl WorkerPoolBuilder {
    /// Creates the base configuration for the new pool.
    ///
    /// See: [`WorkerPoolBuilder::default`]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of workers.
    #[must_use]
    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Sets the discipline of the intake queue.
    #[must_use]
    pub fn queue(mut self, mode: QueueMode) -> Self {
        self.queue = mode;
        self
    }

    /// Sets the factory function that is used to create the thread
    /// of each worker. It receives the worker id.
    #[must_use]
    pub fn thread_factory_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) -> thread::Builder + Send + Sync + 'static,
    {
        self.thread_factory = Arc::new(f);
        self
    }

    /// Creates a pool with the arguments. All workers are running when
    /// this returns.
    ///
    /// # Errors
    ///
    /// 1. [`ZeroWorkers`]: the worker count is 0.
    ///
    /// 2. [`ZeroCapacity`]: the queue is [`QueueMode::Buffered`] with a
    /// capacity of 0.
    ///
    /// 3. [`Spawn`]: a worker thread could not be started. Workers that
    /// were already started are stopped before this returns.
    ///
    /// [`ZeroWorkers`]: crate::PoolError::ZeroWorkers
    /// [`ZeroCapacity`]: crate::PoolError::ZeroCapacity
    /// [`Spawn`]: crate::PoolError::Spawn
    pub fn build(self) -> Result<WorkerPool, PoolError> {
        self.check_arguments()?;
        WorkerPool::from_builder(self)
    }

    fn check_arguments(&self) -> Result<(), PoolError> {
        if self.worker_count == 0 {
            return Err(PoolError::ZeroWorkers);
        }

        if self.queue == QueueMode::Buffered(0) {
            return Err(PoolError::ZeroCapacity);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{QueueMode, WorkerPoolBuilder};
    use crate::PoolError;
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread,
        time::Duration,
    };

    #[test]
    fn test_builder_zero_workers() {
        let result = WorkerPoolBuilder::default().worker_count(0).build();
        assert!(matches!(result, Err(PoolError::ZeroWorkers)));
    }

    #[test]
    fn test_builder_zero_capacity() {
        let result = WorkerPoolBuilder::default()
            .worker_count(2)
            .queue(QueueMode::Buffered(0))
            .build();
        assert!(matches!(result, Err(PoolError::ZeroCapacity)));
    }

    #[test]
    fn test_builder_defaults() {
        let builder = WorkerPoolBuilder::new();
        assert!(builder.worker_count >= 1);
        assert_eq!(QueueMode::Buffered(1000), builder.queue);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_spawn_failure_stops_started_workers() {
        let requested = Arc::new(AtomicUsize::new(0));
        let factory_requested = requested.clone();
        let builder = WorkerPoolBuilder::new()
            .worker_count(4)
            .thread_factory_fn(move |id| {
                factory_requested.fetch_add(1, Ordering::SeqCst);
                let thread_builder = thread::Builder::new().name(format!("spawn-test-{id}"));
                if id == 2 {
                    // No system maps a 64 TiB stack.
                    thread_builder.stack_size(1 << 46)
                } else {
                    thread_builder
                }
            });

        // `build` joins the workers it started before returning the error.
        let (result_sender, result_receiver) = crossbeam_channel::bounded(1);
        thread::spawn(move || {
            let result = builder.build().map(|_| ());
            result_sender.send(result).unwrap();
        });
        let result = result_receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("build never returned");

        assert!(matches!(result, Err(PoolError::Spawn(_))));
        assert_eq!(3, requested.load(Ordering::SeqCst));
    }

    #[test]
    fn test_queue_capacity() {
        assert_eq!(8, QueueMode::Buffered(8).capacity());
        assert_eq!(0, QueueMode::Unbuffered.capacity());
    }
}
