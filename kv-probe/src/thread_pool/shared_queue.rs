use super::ThreadPool;
use crate::{ProbeErrorKind, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{error, trace};

type Job = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Run(Job),
    Terminate,
}

struct Worker {
    id: usize,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(id: usize, receiver: Arc<Mutex<mpsc::Receiver<Message>>>) -> Result<Self> {
        let handle = thread::Builder::new()
            .name(format!("kv-worker-{}", id))
            .spawn(move || loop {
                // the guard is released before the job runs
                let message = match receiver.lock() {
                    Ok(receiver) => receiver.recv(),
                    Err(_) => break,
                };
                match message {
                    Ok(Message::Run(job)) => {
                        // a panicking job must not take the worker down with it
                        if catch_unwind(AssertUnwindSafe(job)).is_err() {
                            error!("Worker {}: {}", id, ProbeErrorKind::ThreadPanic);
                        }
                    }
                    Ok(Message::Terminate) | Err(_) => break,
                }
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
        })
    }
}

/// Shared Queue ThreadPool
/// It maintains a fixed number of workers and sends incoming jobs to
/// them through one mpsc channel.
///
/// # Note:
/// Dropping the pool waits for every worker to finish its current job, so a
/// job that never returns (a connection whose peer never hangs up, for one)
/// blocks the drop.
///
/// # Example:
///
/// ```
/// use kv_probe::thread_pool::{ThreadPool, SharedQueueThreadPool};
/// use std::sync::{Arc, Mutex};
///
/// let pool = SharedQueueThreadPool::new(4).unwrap();
///
/// let counter: Arc<Mutex<i32>> = Arc::new(Mutex::new(0));
/// for _ in 0..4 {
///     let counter = Arc::clone(&counter);
///     pool.spawn(move || *counter.lock().unwrap() += 1).unwrap();
/// }
///
/// // dropping the pool joins all its workers
/// drop(pool);
/// assert_eq!(4, *counter.lock().unwrap());
/// ```
pub struct SharedQueueThreadPool {
    workers: Vec<Worker>,
    sender: mpsc::Sender<Message>,
}

impl ThreadPool for SharedQueueThreadPool {
    fn new(threads: usize) -> Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(threads);
        for id in 0..threads.max(1) {
            workers.push(Worker::spawn(id, Arc::clone(&receiver))?);
        }

        Ok(Self { workers, sender })
    }

    fn spawn<F: FnOnce() + Send + 'static>(&self, f: F) -> Result<()> {
        self.sender
            .send(Message::Run(Box::new(f)))
            .map_err(|_| ProbeErrorKind::PoolClosed.into())
    }
}

impl Drop for SharedQueueThreadPool {
    fn drop(&mut self) {
        for _ in 0..self.workers.len() {
            // a failed send means every worker is already gone
            let _ = self.sender.send(Message::Terminate);
        }

        for worker in &mut self.workers {
            trace!("Dropping Worker {}", worker.id);
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    error!("Worker {} exited abnormally", worker.id);
                }
            }
        }
    }
}
