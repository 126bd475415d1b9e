use failure::{Backtrace, Context, Fail};
use std::fmt;
use std::io;

/// Error Type for the probe and the store server
#[derive(Debug)]
pub struct ProbeError {
    inner: Context<ProbeErrorKind>,
}

/// Kinds of possible Errors
#[derive(Debug, Clone, PartialEq, Eq, Fail)]
pub enum ProbeErrorKind {
    /// The store could not be reached
    #[fail(display = "Cannot connect to store")]
    ConnectionError,
    /// The peer closed the connection before a reply arrived
    #[fail(display = "Connection closed by peer")]
    ConnectionClosed,
    /// IoError triggered by network I/Os
    #[fail(display = "Io Error")]
    IoError,
    /// Malformed frame or command on the wire
    #[fail(display = "Protocol error: {}", _0)]
    ProtocolError(String),
    /// The store answered with an error reply
    #[fail(display = "Store replied with error: {}", _0)]
    ServerError(String),
    /// The store answered with a frame of the wrong type for the command
    #[fail(display = "Unexpected reply from store")]
    UnexpectedReply,
    /// Operation against a key holding the wrong kind of value
    #[fail(display = "Operation against a key holding the wrong kind of value")]
    WrongType,
    /// Configuration could not be loaded
    #[fail(display = "Configuration error")]
    ConfigError,
    /// Serialization/Deserialization Error triggered by serde
    #[fail(display = "Json error")]
    JsonError,
    /// ThreadPool Panic Error
    #[fail(display = "ThreadPool thread Panicked")]
    ThreadPanic,
    /// Every worker of the pool has exited, so no job can be queued
    #[fail(display = "ThreadPool has no running workers")]
    PoolClosed,
    /// A shared lock was poisoned by a panicking holder
    #[fail(display = "Lock poisoned")]
    LockPoisoned,
    /// A probe sequence completed but its result broke the expected contract
    #[fail(display = "Probe failed: {}", _0)]
    ProbeFailed(String),
}

impl ProbeError {
    /// get the kind of the error
    pub fn kind(&self) -> ProbeErrorKind {
        self.inner.get_context().clone()
    }
}

impl Fail for ProbeError {
    fn cause(&self) -> Option<&dyn Fail> {
        self.inner.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.inner.backtrace()
    }
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl From<ProbeErrorKind> for ProbeError {
    fn from(kind: ProbeErrorKind) -> ProbeError {
        ProbeError {
            inner: Context::new(kind),
        }
    }
}

impl From<Context<ProbeErrorKind>> for ProbeError {
    fn from(context: Context<ProbeErrorKind>) -> ProbeError {
        ProbeError { inner: context }
    }
}

impl From<io::Error> for ProbeError {
    fn from(error: io::Error) -> ProbeError {
        error.context(ProbeErrorKind::IoError).into()
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(error: serde_json::Error) -> ProbeError {
        error.context(ProbeErrorKind::JsonError).into()
    }
}
