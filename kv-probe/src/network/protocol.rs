//! RESP2 frames and the blocking reader/writer used on both ends of a connection.
//!
//! Only text payloads are supported: bulk strings must be valid UTF-8.

use crate::{ProbeErrorKind, Result};
use std::io::{BufRead, Read, Write};

// refuse bulk strings over 512MB, same limit as redis
const MAX_BULK_LEN: usize = 512 * 1024 * 1024;
const MAX_ARRAY_LEN: usize = 1024 * 1024;
const MAX_DEPTH: usize = 32;
// headers are a marker and a number; simple strings and errors are short
const MAX_LINE_LEN: usize = 64 * 1024;

/// One RESP2 frame.
///
/// The null bulk string (`$-1`) and the null array (`*-1`) both decode to
/// [`Frame::Null`]; a `Null` is always written back as `$-1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// `+OK\r\n`
    Simple(String),
    /// `-ERR message\r\n`
    Error(String),
    /// `:42\r\n`
    Integer(i64),
    /// `$5\r\nhello\r\n`
    Bulk(String),
    /// `*2\r\n...`
    Array(Vec<Frame>),
    /// `$-1\r\n` or `*-1\r\n`
    Null,
}

impl Frame {
    /// construct a bulk string frame
    pub fn bulk(s: impl Into<String>) -> Self {
        Frame::Bulk(s.into())
    }

    /// the `+OK` acknowledgement
    pub fn ok() -> Self {
        Frame::Simple("OK".to_owned())
    }
}

/// Read one frame from `reader`.
///
/// Returns `Ok(None)` when the stream ends cleanly before a new frame starts.
/// Ending in the middle of a frame is a protocol error.
pub fn read_frame<R: BufRead>(reader: &mut R) -> Result<Option<Frame>> {
    match read_line(reader)? {
        Some(line) => parse_frame(reader, &line, 0).map(Some),
        None => Ok(None),
    }
}

/// Write `frame` to `writer`. The caller decides when to flush.
///
/// Simple strings and errors are single-line frames, so any CR or LF inside
/// them is written as a space.
pub fn write_frame<W: Write>(writer: &mut W, frame: &Frame) -> Result<()> {
    match frame {
        Frame::Simple(s) => write!(writer, "+{}\r\n", single_line(s))?,
        Frame::Error(s) => write!(writer, "-{}\r\n", single_line(s))?,
        Frame::Integer(i) => write!(writer, ":{}\r\n", i)?,
        Frame::Bulk(s) => {
            write!(writer, "${}\r\n", s.len())?;
            writer.write_all(s.as_bytes())?;
            writer.write_all(b"\r\n")?;
        }
        Frame::Array(items) => {
            write!(writer, "*{}\r\n", items.len())?;
            for item in items {
                write_frame(writer, item)?;
            }
        }
        Frame::Null => writer.write_all(b"$-1\r\n")?,
    }
    Ok(())
}

fn parse_frame<R: BufRead>(reader: &mut R, line: &str, depth: usize) -> Result<Frame> {
    if depth > MAX_DEPTH {
        return Err(protocol_error("nesting too deep"));
    }

    let mut chars = line.chars();
    let marker = chars.next().ok_or_else(|| protocol_error("empty line"))?;
    let body = chars.as_str();

    match marker {
        '+' => Ok(Frame::Simple(body.to_owned())),
        '-' => Ok(Frame::Error(body.to_owned())),
        ':' => Ok(Frame::Integer(parse_int(body)?)),
        '$' => {
            let len = parse_int(body)?;
            if len == -1 {
                return Ok(Frame::Null);
            }
            let len = to_length(len, MAX_BULK_LEN)?;

            // payload plus the trailing CRLF
            let mut buf = vec![0u8; len + 2];
            reader.read_exact(&mut buf).map_err(|_| protocol_error("truncated bulk string"))?;
            if &buf[len..] != b"\r\n" {
                return Err(protocol_error("bulk string not terminated by CRLF"));
            }
            buf.truncate(len);
            let s = String::from_utf8(buf).map_err(|_| protocol_error("bulk string is not utf-8"))?;
            Ok(Frame::Bulk(s))
        }
        '*' => {
            let len = parse_int(body)?;
            if len == -1 {
                return Ok(Frame::Null);
            }
            let len = to_length(len, MAX_ARRAY_LEN)?;

            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                let line = read_line(reader)?.ok_or_else(|| protocol_error("truncated array"))?;
                items.push(parse_frame(reader, &line, depth + 1)?);
            }
            Ok(Frame::Array(items))
        }
        other => Err(protocol_error(&format!("invalid type marker {:?}", other))),
    }
}

fn single_line(s: &str) -> std::borrow::Cow<'_, str> {
    if s.contains(|c: char| c == '\r' || c == '\n') {
        s.replace(|c: char| c == '\r' || c == '\n', " ").into()
    } else {
        s.into()
    }
}

// read a CRLF terminated line of at most MAX_LINE_LEN bytes, without its terminator
fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>> {
    let mut line = Vec::new();
    let n = reader
        .by_ref()
        .take(MAX_LINE_LEN as u64)
        .read_until(b'\n', &mut line)?;
    if n == 0 {
        return Ok(None);
    }
    if !line.ends_with(b"\n") && n == MAX_LINE_LEN {
        return Err(protocol_error("line too long"));
    }
    if !line.ends_with(b"\r\n") {
        return Err(protocol_error("line not terminated by CRLF"));
    }
    line.truncate(line.len() - 2);
    String::from_utf8(line)
        .map(Some)
        .map_err(|_| protocol_error("line is not utf-8"))
}

fn parse_int(s: &str) -> Result<i64> {
    s.parse::<i64>()
        .map_err(|_| protocol_error(&format!("invalid integer {:?}", s)))
}

fn to_length(len: i64, max: usize) -> Result<usize> {
    if len < 0 || len as u64 > max as u64 {
        return Err(protocol_error(&format!("invalid length {}", len)));
    }
    Ok(len as usize)
}

fn protocol_error(msg: &str) -> crate::ProbeError {
    ProbeErrorKind::ProtocolError(msg.to_owned()).into()
}
