//! # Worker Pool
//!
//! A worker pool runs submitted tasks on a fixed set of background
//! threads. Producers hand tasks to an intake queue, one of the
//! workers picks each task up and runs it to completion, and the pool
//! can be shut down deterministically: shutdown returns once every
//! worker has acknowledged its stop signal and its thread has ended.
//!
//! # Build a worker pool
//!
//! [`WorkerPool::buffered`] and [`WorkerPool::unbuffered`] cover the
//! common cases. Use the [`WorkerPoolBuilder`] for a custom
//! configuration.
//!
//! # Shutdown semantics
//!
//! Every task accepted by [`WorkerPool::submit`] runs exactly once,
//! including tasks still queued when [`WorkerPool::shutdown`] is
//! called. Submissions made after shutdown began are rejected with
//! [`PoolError::Closed`].
//!
//! # Examples
//!
//! ```
//! use workerpool::WorkerPool;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let pool = WorkerPool::buffered(4).unwrap();
//!
//! let sum = Arc::new(AtomicUsize::new(0));
//! for _ in 0..10 {
//!     let sum = sum.clone();
//!     pool.submit(move || {
//!         sum.fetch_add(1, Ordering::SeqCst);
//!     })
//!     .unwrap();
//! }
//!
//! // Close the pool and wait for all workers to end.
//! pool.shutdown().unwrap();
//! assert_eq!(10, sum.load(Ordering::SeqCst));
//! ```

mod builder;
mod error;
mod worker_pool;

pub(crate) mod task;
pub(crate) mod worker;

pub use builder::*;
pub use error::PoolError;
pub use task::Task;
pub use worker_pool::*;
