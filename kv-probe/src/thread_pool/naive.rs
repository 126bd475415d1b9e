use super::ThreadPool;
use crate::Result;
use std::thread;

/// Spawns a fresh thread for every job and never joins it
pub struct NaiveThreadPool;

impl ThreadPool for NaiveThreadPool {
    fn new(_threads: usize) -> Result<Self> {
        Ok(NaiveThreadPool)
    }

    fn spawn<F: FnOnce() + Send + 'static>(&self, f: F) -> Result<()> {
        thread::Builder::new().spawn(f)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn every_job_gets_a_thread() {
        let pool = NaiveThreadPool::new(0).unwrap();
        let (tx, rx) = mpsc::channel();
        for i in 0..4 {
            let tx = tx.clone();
            pool.spawn(move || tx.send(i).unwrap()).unwrap();
        }
        drop(tx);

        let mut got: Vec<i32> = rx.iter().collect();
        got.sort_unstable();
        assert_eq!(vec![0, 1, 2, 3], got);
    }
}
