/// A unit of work that can be submitted to a [`WorkerPool`].
///
/// A task exposes exactly one operation: [`execute`], which performs
/// some side effect and returns nothing. Failures inside a task are
/// the task's own business; the pool neither reports nor retries them.
///
/// Every `FnOnce() + Send + 'static` closure is a task, so the simplest
/// way to submit work is a closure. Named work items implement the
/// trait directly:
///
/// ```
/// use workerpool::Task;
///
/// struct Resize {
///     name: String,
///     size: u32,
/// }
///
/// impl Task for Resize {
///     fn execute(self: Box<Self>) {
///         println!("resizing {} to {}", self.name, self.size);
///     }
/// }
/// ```
///
/// [`WorkerPool`]: crate::WorkerPool
/// [`execute`]: Task::execute
pub trait Task: Send + 'static {
    /// Runs the task to completion on a worker thread.
    fn execute(self: Box<Self>);
}

impl<F> Task for F
where
    F: FnOnce() + Send + 'static,
{
    fn execute(self: Box<Self>) {
        (*self)()
    }
}

/// What travels through the intake queue.
///
/// Shutdown signals share the queue with tasks, so every task accepted
/// before the pool closed sits ahead of every signal.
pub(crate) enum Message {
    Run(Box<dyn Task>),
    Stop,
}
