use std::{
    any::Any,
    io,
    panic::{self, AssertUnwindSafe},
    thread::{self, JoinHandle},
};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, info, warn};

use crate::{task::Message, ThreadFactory};

/// A worker holds the id and the thread handle of one execution loop.
pub(crate) struct Worker {
    pub(crate) id: usize,
    pub(crate) handle: JoinHandle<()>,
}

impl Worker {
    /// Starts the execution loop of the worker `id` on a thread created
    /// by `thread_factory`.
    pub(crate) fn spawn(
        id: usize,
        thread_factory: &ThreadFactory,
        receiver: Receiver<Message>,
        acks: Sender<usize>,
    ) -> io::Result<Self> {
        let handle = thread_factory(id).spawn(move || run(id, &receiver, &acks))?;
        Ok(Worker { id, handle })
    }

    /// Returns `true` if the caller is running on this worker's thread.
    #[inline]
    pub(crate) fn is_current(&self) -> bool {
        self.handle.thread().id() == thread::current().id()
    }

    /// Waits for the thread of the worker to end.
    ///
    /// A worker never joins itself.
    pub(crate) fn join(self) -> thread::Result<()> {
        if !self.is_current() {
            self.handle.join()?
        }
        Ok(())
    }
}

/// The execution loop. Tasks run one at a time until the worker takes
/// a shutdown signal off the queue, which is acknowledged with the id
/// of the worker.
fn run(id: usize, receiver: &Receiver<Message>, acks: &Sender<usize>) {
    while let Ok(message) = receiver.recv() {
        match message {
            Message::Run(task) => {
                debug!(worker = id, "received task, starting");
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| task.execute())) {
                    error!(
                        worker = id,
                        panic = panic_message(payload.as_ref()),
                        "task panicked"
                    );
                }
                debug!(worker = id, "finished task, waiting for more tasks");
            }
            Message::Stop => {
                info!(worker = id, "shutdown signal received, worker going home");
                if acks.send(id).is_err() {
                    warn!(worker = id, "nobody is waiting for the acknowledgment");
                }
                return;
            }
        }
    }
    debug!(worker = id, "intake queue disconnected");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::Worker;
    use crate::task::Message;
    use crossbeam_channel::{bounded, unbounded};
    use std::{sync::Arc, thread};

    fn factory() -> Arc<crate::ThreadFactory> {
        Arc::new(|id: usize| thread::Builder::new().name(format!("test-worker-{id}")))
    }

    #[test]
    fn test_runs_tasks_then_acknowledges() {
        let (sender, receiver) = bounded(4);
        let (ack_sender, ack_receiver) = bounded(1);
        let (results, observed) = unbounded();

        let worker = Worker::spawn(7, factory().as_ref(), receiver, ack_sender).unwrap();
        for i in 0..3 {
            let results = results.clone();
            sender
                .send(Message::Run(Box::new(move || results.send(i).unwrap())))
                .unwrap();
        }
        sender.send(Message::Stop).unwrap();

        assert_eq!(7, ack_receiver.recv().unwrap());
        assert_eq!(7, worker.id);
        worker.join().unwrap();
        assert_eq!(vec![0, 1, 2], observed.try_iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_nothing_runs_after_stop() {
        let (sender, receiver) = unbounded();
        let (ack_sender, ack_receiver) = bounded(1);
        let (results, observed) = unbounded();

        sender.send(Message::Stop).unwrap();
        sender
            .send(Message::Run(Box::new(move || results.send(()).unwrap())))
            .unwrap();

        let worker = Worker::spawn(0, factory().as_ref(), receiver, ack_sender).unwrap();
        assert_eq!(0, ack_receiver.recv().unwrap());
        worker.join().unwrap();

        assert!(observed.try_recv().is_err());
        assert_eq!(1, sender.len());
    }

    #[test]
    fn test_survives_panicking_task() {
        let (sender, receiver) = unbounded();
        let (ack_sender, ack_receiver) = bounded(1);
        let (results, observed) = unbounded();

        let worker = Worker::spawn(1, factory().as_ref(), receiver, ack_sender).unwrap();
        sender
            .send(Message::Run(Box::new(|| panic!("boom"))))
            .unwrap();
        sender
            .send(Message::Run(Box::new(move || {
                results.send(thread::current().name().map(str::to_owned)).unwrap()
            })))
            .unwrap();
        sender.send(Message::Stop).unwrap();

        assert_eq!(1, ack_receiver.recv().unwrap());
        worker.join().unwrap();
        assert_eq!(Some("test-worker-1".to_owned()), observed.recv().unwrap());
    }

    #[test]
    fn test_exits_on_disconnect() {
        let (sender, receiver) = bounded::<Message>(0);
        let (ack_sender, ack_receiver) = bounded(1);

        let worker = Worker::spawn(2, factory().as_ref(), receiver, ack_sender).unwrap();
        drop(sender);
        worker.join().unwrap();
        assert!(ack_receiver.try_recv().is_err());
    }
}
