mod client;
mod command;
pub mod protocol;
mod server;

pub use client::KvClient;
pub use command::Command;
pub use protocol::Frame;
pub use server::{KvServer, ShutdownHandle};
