use crate::{
    task::{Message, Task},
    worker::Worker,
    PoolError, QueueMode, WorkerPoolBuilder,
};

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use std::sync::atomic::{AtomicBool, Ordering};

/// A `WorkerPool` consists of a fixed set of worker threads and an
/// intake queue that hands submitted tasks to them.
///
/// # Intake Queue
///
/// The queue is either buffered, holding a fixed number of pending
/// tasks, or unbuffered, where every submission is a direct handoff
/// to an idle worker (see [`QueueMode`]). Tasks leave the queue in
/// submission order. With one worker they also complete in that order;
/// with several workers completion order is unconstrained.
///
/// # Workers
///
/// Each worker has a stable id in `0..worker_count` and runs one task
/// at a time to completion before taking the next. A task that panics
/// is logged and the worker carries on, so the number of workers never
/// changes during the life of the pool.
///
/// # Shutdown
///
/// [`shutdown`] closes the pool and then puts one shutdown signal per
/// worker on the intake queue, behind every task that was accepted
/// before the pool closed. Accepted tasks are therefore always drained:
/// a task is either rejected by [`submit`] with [`PoolError::Closed`],
/// or it runs exactly once. A worker that takes a signal acknowledges
/// it and stops for good. `shutdown` returns once every worker has
/// acknowledged and its thread has ended.
///
/// `shutdown` may also run on one of the pool's own workers, for example
/// when a task drops the last `Arc<WorkerPool>`. That worker gets no
/// signal: `shutdown` waits for the other workers only, and the calling
/// worker leaves its loop through the disconnected queue once its task
/// returns.
///
/// Dropping an open pool shuts it down.
///
/// [`shutdown`]: WorkerPool::shutdown
/// [`submit`]: WorkerPool::submit
pub struct WorkerPool {
    sender: RwLock<Option<Sender<Message>>>,
    receiver: Receiver<Message>,
    ack_receiver: Receiver<usize>,
    workers: Mutex<Option<Vec<Worker>>>,
    worker_count: usize,
    closed: AtomicBool,
}

impl WorkerPool {
    /// Creates a pool of `worker_count` workers with a buffered queue
    /// that holds up to `worker_count` pending tasks.
    ///
    /// # Errors
    ///
    /// See [`WorkerPoolBuilder::build`].
    pub fn buffered(worker_count: usize) -> Result<Self, PoolError> {
        WorkerPoolBuilder::new()
            .worker_count(worker_count)
            .queue(QueueMode::Buffered(worker_count))
            .build()
    }

    /// Creates a pool of `worker_count` workers with an unbuffered
    /// queue.
    ///
    /// # Errors
    ///
    /// See [`WorkerPoolBuilder::build`].
    pub fn unbuffered(worker_count: usize) -> Result<Self, PoolError> {
        WorkerPoolBuilder::new()
            .worker_count(worker_count)
            .queue(QueueMode::Unbuffered)
            .build()
    }

    /// Builds a pool from a configuration(builder) and starts all of
    /// its workers.
    ///
    /// This assumes arguments of the builder are valid.
    pub(crate) fn from_builder(builder: WorkerPoolBuilder) -> Result<Self, PoolError> {
        let (sender, receiver) = bounded(builder.queue.capacity());
        let (ack_sender, ack_receiver) = bounded(builder.worker_count);

        let mut workers = Vec::with_capacity(builder.worker_count);
        for id in 0..builder.worker_count {
            match Worker::spawn(
                id,
                builder.thread_factory.as_ref(),
                receiver.clone(),
                ack_sender.clone(),
            ) {
                Ok(worker) => workers.push(worker),
                Err(err) => {
                    error!(worker = id, %err, "failed to spawn worker thread");
                    Self::stop_workers(&sender, &ack_receiver, workers);
                    return Err(PoolError::Spawn(err));
                }
            }
        }

        info!(
            workers = builder.worker_count,
            queue = ?builder.queue,
            "worker pool started"
        );
        Ok(Self {
            sender: RwLock::new(Some(sender)),
            receiver,
            ack_receiver,
            workers: Mutex::new(Some(workers)),
            worker_count: builder.worker_count,
            closed: AtomicBool::new(false),
        })
    }

    /// Puts the given task on the intake queue.
    ///
    /// With a buffered queue this blocks only while the queue is full,
    /// with an unbuffered queue it blocks until a worker takes the task.
    /// There is no timeout.
    ///
    /// # Errors
    ///
    /// [`Closed`]: the pool has been shut down. The task is dropped
    /// without running.
    ///
    /// [`Closed`]: crate::PoolError::Closed
    ///
    /// # Examples
    ///
    /// ```
    /// use workerpool::{PoolError, WorkerPool};
    ///
    /// let pool = WorkerPool::buffered(2).unwrap();
    /// pool.submit(|| println!("resizing image_1.jpg")).unwrap();
    ///
    /// pool.shutdown().unwrap();
    /// assert!(matches!(pool.submit(|| ()), Err(PoolError::Closed)));
    /// ```
    pub fn submit<T: Task>(&self, task: T) -> Result<(), PoolError> {
        self.submit_boxed(Box::new(task))
    }

    /// Like [`submit`], for a task that is already boxed, such as an
    /// element of a `Vec<Box<dyn Task>>` holding different work items.
    ///
    /// # Errors
    ///
    /// [`Closed`]: the pool has been shut down.
    ///
    /// [`submit`]: WorkerPool::submit
    /// [`Closed`]: crate::PoolError::Closed
    pub fn submit_boxed(&self, task: Box<dyn Task>) -> Result<(), PoolError> {
        // Shutdown waits for every submission holding this guard.
        let guard = self.sender.read();
        let Some(sender) = guard.as_ref() else {
            warn!("task rejected, the worker pool is closed");
            return Err(PoolError::Closed);
        };
        sender
            .send(Message::Run(task))
            .map_err(|_| PoolError::Closed)
    }

    /// Closes the pool, stops every worker and waits for all of them.
    ///
    /// Tasks accepted before this call are run before the workers stop.
    /// A task that is already running is never interrupted.
    ///
    /// # Errors
    ///
    /// [`Closed`]: the pool was already closed. Nothing is done.
    ///
    /// [`Closed`]: crate::PoolError::Closed
    pub fn shutdown(&self) -> Result<(), PoolError> {
        let sender = {
            let mut guard = self.sender.write();
            let sender = guard.take();
            self.closed.store(true, Ordering::SeqCst);
            sender
        };
        let Some(sender) = sender else {
            warn!("shutdown ignored, the worker pool is already closed");
            return Err(PoolError::Closed);
        };

        info!(workers = self.worker_count, "worker pool shutting down");
        let workers = self.workers.lock().take();
        if let Some(workers) = workers {
            Self::stop_workers(&sender, &self.ack_receiver, workers);
        }
        info!("worker pool shut down");
        Ok(())
    }

    /// Returns `true` if the pool is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Returns the number of workers.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Returns the number of tasks waiting in the intake queue.
    /// Always 0 for an unbuffered queue.
    ///
    /// While [`shutdown`] is running the count also includes the
    /// shutdown signals not yet taken by a worker.
    ///
    /// [`shutdown`]: WorkerPool::shutdown
    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.receiver.len()
    }

    /// Sends one shutdown signal per worker, collects one
    /// acknowledgment per worker, then joins their threads.
    ///
    /// A worker running the caller is skipped. It can not take a signal
    /// until the caller returns, and it exits on the disconnected queue
    /// instead.
    fn stop_workers(sender: &Sender<Message>, acks: &Receiver<usize>, workers: Vec<Worker>) {
        let stopping = workers.iter().filter(|worker| !worker.is_current()).count();
        if stopping < workers.len() {
            debug!("stopping the pool from one of its own workers");
        }

        for _ in 0..stopping {
            // The pool keeps a receiver, so the queue can not disconnect.
            if sender.send(Message::Stop).is_err() {
                error!("intake queue disconnected while stopping workers");
                break;
            }
        }

        for _ in 0..stopping {
            match acks.recv() {
                Ok(id) => debug!(worker = id, "shutdown acknowledged"),
                Err(_) => {
                    error!("acknowledgment channel disconnected while stopping workers");
                    break;
                }
            }
        }

        for worker in workers {
            let id = worker.id;
            if worker.join().is_err() {
                error!(worker = id, "worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if !self.is_closed() {
            let _ = self.shutdown();
        }
    }
}
