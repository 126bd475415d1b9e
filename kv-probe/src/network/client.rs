use super::command::Command;
use super::protocol::{self, Frame};
use crate::{ProbeError, ProbeErrorKind, Result};
use failure::ResultExt;
use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use tracing::{debug, trace};

/// KvClient structure that handles
/// communication with a RESP store.
///
/// Every operation sends one command and blocks until its reply arrives.
/// There is no retry: a failed operation is reported to the caller as is.
/// The connection is shut down when the client is dropped, so it is released
/// on every exit path.
pub struct KvClient {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl KvClient {
    /// create a new client instance and connect to
    /// given store address
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).context(ProbeErrorKind::ConnectionError)?;
        let reader = BufReader::new(stream.try_clone()?);
        let writer = BufWriter::new(stream);
        Ok(Self { reader, writer })
    }

    /// send a command to the store and return its reply;
    /// an error reply is turned into `ProbeErrorKind::ServerError`
    pub fn send(&mut self, command: Command) -> Result<Frame> {
        debug!("Sending {:?}", command);
        protocol::write_frame(&mut self.writer, &command.into_frame())?;
        self.writer.flush()?;

        match protocol::read_frame(&mut self.reader)? {
            Some(Frame::Error(message)) => Err(ProbeErrorKind::ServerError(message).into()),
            Some(frame) => Ok(frame),
            None => Err(ProbeErrorKind::ConnectionClosed.into()),
        }
    }

    /// check that the store answers
    pub fn ping(&mut self) -> Result<()> {
        match self.send(Command::Ping)? {
            Frame::Simple(_) => Ok(()),
            _ => Err(ProbeErrorKind::UnexpectedReply.into()),
        }
    }

    /// set key to val
    pub fn set(&mut self, key: String, val: String) -> Result<()> {
        match self.send(Command::Set { key, val })? {
            Frame::Simple(_) => Ok(()),
            _ => Err(ProbeErrorKind::UnexpectedReply.into()),
        }
    }

    /// get the value of key, `None` if the key does not exist
    pub fn get(&mut self, key: String) -> Result<Option<String>> {
        match self.send(Command::Get { key })? {
            Frame::Bulk(val) => Ok(Some(val)),
            Frame::Null => Ok(None),
            _ => Err(ProbeErrorKind::UnexpectedReply.into()),
        }
    }

    /// remove key, return how many keys were removed (0 or 1)
    pub fn del(&mut self, key: String) -> Result<u64> {
        let keys = vec![key];
        non_negative(self.send(Command::Del { keys })?)
    }

    /// set one field of the hash at key, return whether the field is new
    pub fn hset(&mut self, key: String, field: String, val: String) -> Result<bool> {
        let pairs = vec![(field, val)];
        Ok(non_negative(self.send(Command::HSet { key, pairs })?)? > 0)
    }

    /// all fields and values of the hash at key; empty if the key does not exist
    pub fn hgetall(&mut self, key: String) -> Result<BTreeMap<String, String>> {
        let items = strings(self.send(Command::HGetAll { key })?)?;
        if items.len() % 2 != 0 {
            return Err(ProbeErrorKind::UnexpectedReply.into());
        }

        let mut hash = BTreeMap::new();
        let mut items = items.into_iter();
        while let (Some(field), Some(val)) = (items.next(), items.next()) {
            hash.insert(field, val);
        }
        Ok(hash)
    }

    /// prepend vals to the list at key, return the new length of the list
    pub fn lpush(&mut self, key: String, vals: Vec<String>) -> Result<u64> {
        non_negative(self.send(Command::LPush { key, vals })?)
    }

    /// inclusive range of the list at key; negative indices count from the tail
    pub fn lrange(&mut self, key: String, start: i64, stop: i64) -> Result<Vec<String>> {
        strings(self.send(Command::LRange { key, start, stop })?)
    }

    /// shutdown the connection and drop the client
    pub fn shutdown(self) -> Result<()> {
        self.writer.get_ref().shutdown(Shutdown::Both)?;
        Ok(())
    }
}

impl Drop for KvClient {
    fn drop(&mut self) {
        if let Err(error) = self.writer.get_ref().shutdown(Shutdown::Both) {
            trace!("Connection already closed: {}", error);
        }
    }
}

fn non_negative(frame: Frame) -> Result<u64> {
    match frame {
        Frame::Integer(n) if n >= 0 => Ok(n as u64),
        _ => Err(ProbeErrorKind::UnexpectedReply.into()),
    }
}

fn strings(frame: Frame) -> Result<Vec<String>> {
    match frame {
        Frame::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Frame::Bulk(s) | Frame::Simple(s) => Ok(s),
                _ => Err(ProbeError::from(ProbeErrorKind::UnexpectedReply)),
            })
            .collect(),
        Frame::Null => Ok(vec![]),
        _ => Err(ProbeErrorKind::UnexpectedReply.into()),
    }
}
