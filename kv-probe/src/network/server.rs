use super::command::Command;
use super::protocol::{self, Frame};
use crate::thread_pool::ThreadPool;
use crate::{KvsEngine, ProbeError, ProbeErrorKind, Result};
use std::io::{BufReader, BufWriter, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// A store server answering RESP commands from any `KvsEngine`.
///
/// Every accepted connection is handed to the thread pool and served until the
/// peer closes it.
pub struct KvServer<E: KvsEngine, P: ThreadPool> {
    listener: TcpListener,
    engine: E,
    pool: P,
    shutdown: Arc<AtomicBool>,
}

/// Stops a running `KvServer` from another thread.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    addr: SocketAddr,
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask the server to stop accepting connections.
    ///
    /// The accept loop blocks, so the handle also opens one throwaway
    /// connection to wake it up. Connections already being served are not
    /// interrupted.
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
        // the server may already be gone, in which case nobody needs waking
        let _ = TcpStream::connect(self.addr);
    }
}

impl<E: KvsEngine, P: ThreadPool> KvServer<E, P> {
    /// bind a new server to addr; port 0 picks a free port
    pub fn new(addr: impl ToSocketAddrs, engine: E, pool: P) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        Ok(Self {
            listener,
            engine,
            pool,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// the address the server is listening on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// a handle that stops `run` from another thread
    pub fn shutdown_handle(&self) -> Result<ShutdownHandle> {
        Ok(ShutdownHandle {
            addr: self.local_addr()?,
            flag: Arc::clone(&self.shutdown),
        })
    }

    /// accept connections until shut down
    pub fn run(self) -> Result<()> {
        info!("Serving on {}", self.local_addr()?);

        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            match stream {
                Ok(stream) => {
                    let engine = self.engine.clone();
                    self.pool.spawn(move || {
                        if let Err(error) = serve(engine, stream) {
                            error!("Connection Error: {}", error);
                        }
                    })?;
                }
                Err(error) => error!("Accept Error: {}", error),
            }
        }

        info!("Server stopped accepting connections");
        Ok(())
    }
}

// answer commands on one connection until the peer hangs up
fn serve<E: KvsEngine>(engine: E, stream: TcpStream) -> Result<()> {
    let peer = stream.peer_addr()?;
    debug!("Accepted connection from {}", peer);

    let mut reader = BufReader::new(&stream);
    let mut writer = BufWriter::new(&stream);

    loop {
        let frame = match protocol::read_frame(&mut reader) {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            // the stream cannot be resynchronized after a bad frame
            Err(error) => {
                if let ProbeErrorKind::ProtocolError(_) = error.kind() {
                    protocol::write_frame(&mut writer, &error_reply(&error))?;
                    writer.flush()?;
                }
                return Err(error);
            }
        };
        let reply = match Command::from_frame(frame) {
            Ok(command) => {
                debug!("{} -> {:?}", peer, command);
                execute(&engine, command)
            }
            Err(error) => error_reply(&error),
        };
        protocol::write_frame(&mut writer, &reply)?;
        writer.flush()?;
    }

    debug!("Connection from {} closed", peer);
    Ok(())
}

/// run one command against the engine and build the RESP reply
fn execute<E: KvsEngine>(engine: &E, command: Command) -> Frame {
    let result = match command {
        Command::Ping => Ok(Frame::Simple("PONG".to_owned())),
        Command::Get { key } => engine
            .get(key)
            .map(|val| val.map_or(Frame::Null, Frame::Bulk)),
        Command::Set { key, val } => engine.set(key, val).map(|_| Frame::ok()),
        Command::Del { keys } => keys
            .into_iter()
            .try_fold(0, |removed, key| {
                engine.remove(key).map(|existed| removed + existed as i64)
            })
            .map(Frame::Integer),
        Command::HSet { key, pairs } => pairs
            .into_iter()
            .try_fold(0, |added, (field, val)| {
                engine
                    .hset(key.clone(), field, val)
                    .map(|new| added + new as i64)
            })
            .map(Frame::Integer),
        Command::HGetAll { key } => engine.hgetall(key).map(|pairs| {
            Frame::Array(
                pairs
                    .into_iter()
                    .flat_map(|(field, val)| vec![Frame::Bulk(field), Frame::Bulk(val)])
                    .collect(),
            )
        }),
        Command::LPush { key, vals } => engine
            .lpush(key, vals)
            .map(|len| Frame::Integer(len as i64)),
        Command::LRange { key, start, stop } => engine
            .lrange(key, start, stop)
            .map(|items| Frame::Array(items.into_iter().map(Frame::Bulk).collect())),
    };

    result.unwrap_or_else(|error| error_reply(&error))
}

// error text may echo client input, which must not break the reply onto new lines
fn error_reply(error: &ProbeError) -> Frame {
    let message = match error.kind() {
        ProbeErrorKind::WrongType => format!("WRONGTYPE {}", error),
        ProbeErrorKind::ProtocolError(msg) => format!("ERR {}", msg),
        _ => format!("ERR {}", error),
    };
    Frame::Error(message.replace(|c: char| c == '\r' || c == '\n', " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn run(engine: &MemoryStore, parts: &[&str]) -> Frame {
        let frame = Frame::Array(parts.iter().map(|s| Frame::bulk(*s)).collect());
        match Command::from_frame(frame) {
            Ok(command) => execute(engine, command),
            Err(error) => error_reply(&error),
        }
    }

    #[test]
    fn string_commands_follow_redis_replies() {
        let engine = MemoryStore::new();
        assert_eq!(Frame::ok(), run(&engine, &["SET", "c", "xxxxx"]));
        assert_eq!(Frame::bulk("xxxxx"), run(&engine, &["GET", "c"]));
        assert_eq!(Frame::Integer(1), run(&engine, &["DEL", "c", "d"]));
        assert_eq!(Frame::Null, run(&engine, &["GET", "c"]));
        assert_eq!(Frame::Integer(0), run(&engine, &["DEL", "c"]));
        assert_eq!(Frame::Simple("PONG".to_owned()), run(&engine, &["PING"]));
    }

    #[test]
    fn hash_and_list_replies() {
        let engine = MemoryStore::new();
        assert_eq!(
            Frame::Integer(2),
            run(&engine, &["HSET", "hhh", "name", "sxc", "sex", "19"])
        );
        assert_eq!(
            Frame::Array(vec![
                Frame::bulk("name"),
                Frame::bulk("sxc"),
                Frame::bulk("sex"),
                Frame::bulk("19")
            ]),
            run(&engine, &["HGETALL", "hhh"])
        );

        assert_eq!(
            Frame::Integer(3),
            run(&engine, &["LPUSH", "mylist", "111", "222", "333"])
        );
        assert_eq!(
            Frame::Array(vec![
                Frame::bulk("333"),
                Frame::bulk("222"),
                Frame::bulk("111")
            ]),
            run(&engine, &["LRANGE", "mylist", "0", "-1"])
        );
    }

    #[test]
    fn errors_become_error_replies() {
        let engine = MemoryStore::new();
        run(&engine, &["LPUSH", "mylist", "1"]);

        assert_eq!(
            Frame::Error(
                "WRONGTYPE Operation against a key holding the wrong kind of value".to_owned()
            ),
            run(&engine, &["GET", "mylist"])
        );
        assert_eq!(
            Frame::Error("ERR unknown command 'NOPE'".to_owned()),
            run(&engine, &["nope"])
        );
        assert_eq!(
            Frame::Error("ERR wrong number of arguments for 'get' command".to_owned()),
            run(&engine, &["GET"])
        );
    }

    #[test]
    fn command_name_with_crlf_gets_one_reply() -> Result<()> {
        let engine = MemoryStore::new();
        let reply = run(&engine, &["X\r\n$1\r\nZ\r\n:7"]);
        assert_eq!(
            Frame::Error("ERR unknown command 'X  $1  Z  :7'".to_owned()),
            reply
        );

        let mut bytes = Vec::new();
        protocol::write_frame(&mut bytes, &reply)?;
        let mut reader = std::io::Cursor::new(bytes);
        assert_eq!(Some(reply), protocol::read_frame(&mut reader)?);
        assert_eq!(None, protocol::read_frame(&mut reader)?);
        Ok(())
    }
}
