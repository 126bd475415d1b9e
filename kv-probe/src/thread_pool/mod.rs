//! Thread pools used by `KvServer` to serve connections.

use crate::Result;

/// ThreadPool trait that describes
/// the functionality of a thread pool capable of
/// spawning and managing threads to perform tasks
pub trait ThreadPool: Sized {
    /// create a new instance with the given number of threads
    fn new(threads: usize) -> Result<Self>;

    /// run a job on the pool
    fn spawn<F: FnOnce() + Send + 'static>(&self, f: F) -> Result<()>;
}

mod naive;
mod shared_queue;

pub use naive::NaiveThreadPool;
pub use shared_queue::SharedQueueThreadPool;
