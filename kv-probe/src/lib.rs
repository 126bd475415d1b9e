#![deny(missing_docs)]
#![warn(rust_2018_idioms)]

//! This crate provides `KvClient`, a blocking client for Key-Value stores speaking
//! the Redis serialization protocol, and a set of probes built on top of it that
//! exercise a store with short, fixed command sequences (set/get/delete, hash, list).
//!
//! Besides, the crate also provides `KvServer`, a small multi-threaded store server
//! backed by any `KvsEngine`, so a probe can be run without an external store.

mod config;
mod error;
mod network;
pub mod probe;
mod storage;
pub mod thread_pool;

#[macro_use]
extern crate failure;
pub use config::ProbeConfig;
pub use error::ProbeError;
pub use error::ProbeErrorKind;
pub use network::{protocol, Command, Frame, KvClient, KvServer, ShutdownHandle};
pub use storage::{KvsEngine, MemoryStore};

/// Result type used by this crate
pub type Result<T> = core::result::Result<T, ProbeError>;
