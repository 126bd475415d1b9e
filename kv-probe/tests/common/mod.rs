//! An in-process store server for integration tests.

#![allow(dead_code)]

use kv_probe::thread_pool::{SharedQueueThreadPool, ThreadPool};
use kv_probe::{KvServer, MemoryStore, ShutdownHandle};
use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};

/// A `KvServer` on a free local port, running on its own thread.
///
/// Dropping it stops the server and waits for it. Every client connected to
/// it must be dropped first, since the server's pool joins its workers.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: ShutdownHandle,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    pub fn start() -> Self {
        Self::with_threads(4)
    }

    pub fn with_threads(threads: usize) -> Self {
        let pool = SharedQueueThreadPool::new(threads).expect("unable to create thread pool");
        let server = KvServer::new("127.0.0.1:0", MemoryStore::new(), pool)
            .expect("unable to bind test server");
        let addr = server.local_addr().unwrap();
        let shutdown = server.shutdown_handle().unwrap();
        let handle = thread::spawn(move || server.run().expect("server failed"));

        Self {
            addr,
            shutdown,
            handle: Some(handle),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// An address nothing listens on.
pub fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}
