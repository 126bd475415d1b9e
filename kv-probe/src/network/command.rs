use super::protocol::Frame;
use crate::{ProbeErrorKind, Result};

/// A client's Command, which describes what operation client intends to perform
/// on the store and the arguments provided to that operation.
///
/// On the wire every command is an array of bulk strings whose first element
/// is the (case-insensitive) command name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// check the connection
    Ping,

    /// get the string value of key
    Get {
        /// the string key
        key: String,
    },

    /// set the value of key
    Set {
        /// the string key
        key: String,
        /// the value
        val: String,
    },

    /// remove keys of any kind
    Del {
        /// the keys to remove
        keys: Vec<String>,
    },

    /// set fields of the hash stored at key
    HSet {
        /// the hash key
        key: String,
        /// field-value pairs, in order
        pairs: Vec<(String, String)>,
    },

    /// get all fields and values of the hash stored at key
    HGetAll {
        /// the hash key
        key: String,
    },

    /// prepend values to the list stored at key
    LPush {
        /// the list key
        key: String,
        /// values, pushed one after another
        vals: Vec<String>,
    },

    /// get an inclusive range of the list stored at key
    LRange {
        /// the list key
        key: String,
        /// first index, negative counts from the tail
        start: i64,
        /// last index, negative counts from the tail
        stop: i64,
    },
}

impl Command {
    /// the command name as sent on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "PING",
            Command::Get { .. } => "GET",
            Command::Set { .. } => "SET",
            Command::Del { .. } => "DEL",
            Command::HSet { .. } => "HSET",
            Command::HGetAll { .. } => "HGETALL",
            Command::LPush { .. } => "LPUSH",
            Command::LRange { .. } => "LRANGE",
        }
    }

    /// encode the command as an array of bulk strings
    pub fn into_frame(self) -> Frame {
        let mut parts = vec![Frame::bulk(self.name())];
        match self {
            Command::Ping => {}
            Command::Get { key } | Command::HGetAll { key } => parts.push(Frame::bulk(key)),
            Command::Set { key, val } => {
                parts.push(Frame::bulk(key));
                parts.push(Frame::bulk(val));
            }
            Command::Del { keys } => parts.extend(keys.into_iter().map(Frame::bulk)),
            Command::HSet { key, pairs } => {
                parts.push(Frame::bulk(key));
                for (field, val) in pairs {
                    parts.push(Frame::bulk(field));
                    parts.push(Frame::bulk(val));
                }
            }
            Command::LPush { key, vals } => {
                parts.push(Frame::bulk(key));
                parts.extend(vals.into_iter().map(Frame::bulk));
            }
            Command::LRange { key, start, stop } => {
                parts.push(Frame::bulk(key));
                parts.push(Frame::bulk(start.to_string()));
                parts.push(Frame::bulk(stop.to_string()));
            }
        }
        Frame::Array(parts)
    }

    /// decode a command sent by a client
    pub fn from_frame(frame: Frame) -> Result<Command> {
        let parts = match frame {
            Frame::Array(parts) => parts,
            _ => return Err(invalid("expected array of bulk strings")),
        };

        let mut args = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Frame::Bulk(s) | Frame::Simple(s) => args.push(s),
                _ => return Err(invalid("expected array of bulk strings")),
            }
        }

        if args.is_empty() {
            return Err(invalid("empty command"));
        }
        let name = args.remove(0).to_ascii_uppercase();
        let mut args = args.into_iter();

        let command = match name.as_str() {
            "PING" => {
                arity(&name, args.len() == 0)?;
                Command::Ping
            }
            "GET" => {
                arity(&name, args.len() == 1)?;
                Command::Get { key: next(&mut args)? }
            }
            "SET" => {
                arity(&name, args.len() == 2)?;
                Command::Set {
                    key: next(&mut args)?,
                    val: next(&mut args)?,
                }
            }
            "DEL" => {
                arity(&name, args.len() >= 1)?;
                Command::Del {
                    keys: args.collect(),
                }
            }
            "HSET" => {
                arity(&name, args.len() >= 3 && args.len() % 2 == 1)?;
                let key = next(&mut args)?;
                let mut pairs = vec![];
                while let Some(field) = args.next() {
                    pairs.push((field, next(&mut args)?));
                }
                Command::HSet { key, pairs }
            }
            "HGETALL" => {
                arity(&name, args.len() == 1)?;
                Command::HGetAll { key: next(&mut args)? }
            }
            "LPUSH" => {
                arity(&name, args.len() >= 2)?;
                Command::LPush {
                    key: next(&mut args)?,
                    vals: args.collect(),
                }
            }
            "LRANGE" => {
                arity(&name, args.len() == 3)?;
                Command::LRange {
                    key: next(&mut args)?,
                    start: index(next(&mut args)?)?,
                    stop: index(next(&mut args)?)?,
                }
            }
            _ => return Err(invalid(&format!("unknown command '{}'", name))),
        };

        Ok(command)
    }
}

fn next(args: &mut std::vec::IntoIter<String>) -> Result<String> {
    args.next().ok_or_else(|| invalid("missing argument"))
}

fn arity(name: &str, ok: bool) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(invalid(&format!(
            "wrong number of arguments for '{}' command",
            name.to_ascii_lowercase()
        )))
    }
}

fn index(s: String) -> Result<i64> {
    s.parse()
        .map_err(|_| invalid("value is not an integer or out of range"))
}

fn invalid(msg: &str) -> crate::ProbeError {
    ProbeErrorKind::ProtocolError(msg.to_owned()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(parts: &[&str]) -> Frame {
        Frame::Array(parts.iter().map(|s| Frame::bulk(*s)).collect())
    }

    #[test]
    fn set_frame_layout() {
        let frame = Command::Set {
            key: "c".to_owned(),
            val: "xxxxx".to_owned(),
        }
        .into_frame();
        assert_eq!(request(&["SET", "c", "xxxxx"]), frame);
    }

    #[test]
    fn lrange_bounds_are_sent_as_text() {
        let frame = Command::LRange {
            key: "mylist".to_owned(),
            start: 0,
            stop: -1,
        }
        .into_frame();
        assert_eq!(request(&["LRANGE", "mylist", "0", "-1"]), frame);
    }

    #[test]
    fn server_side_decode_is_case_insensitive() {
        let cmd = Command::from_frame(request(&["get", "c"])).unwrap();
        assert_eq!(Command::Get { key: "c".to_owned() }, cmd);
    }

    #[test]
    fn every_command_decodes_to_itself() {
        let commands = vec![
            Command::Ping,
            Command::Del {
                keys: vec!["a".to_owned(), "b".to_owned()],
            },
            Command::HSet {
                key: "hhh".to_owned(),
                pairs: vec![
                    ("name".to_owned(), "sxc".to_owned()),
                    ("sex".to_owned(), "19".to_owned()),
                ],
            },
            Command::HGetAll {
                key: "hhh".to_owned(),
            },
            Command::LPush {
                key: "mylist".to_owned(),
                vals: vec!["111".to_owned(), "222".to_owned()],
            },
        ];
        for cmd in commands {
            assert_eq!(cmd, Command::from_frame(cmd.clone().into_frame()).unwrap());
        }
    }

    #[test]
    fn wrong_arity_is_rejected() {
        for parts in [
            &["GET"][..],
            &["SET", "k"][..],
            &["DEL"][..],
            &["HSET", "h", "f"][..],
            &["LPUSH", "l"][..],
            &["LRANGE", "l", "0"][..],
        ] {
            let err = Command::from_frame(request(parts)).unwrap_err();
            assert!(matches!(err.kind(), ProbeErrorKind::ProtocolError(_)));
        }
    }

    #[test]
    fn unknown_and_malformed_commands() {
        let err = Command::from_frame(request(&["FLUSHALL"])).unwrap_err();
        assert_eq!(
            ProbeErrorKind::ProtocolError("unknown command 'FLUSHALL'".to_owned()),
            err.kind()
        );

        assert!(Command::from_frame(request(&["LRANGE", "l", "zero", "-1"])).is_err());
        assert!(Command::from_frame(Frame::Integer(1)).is_err());
        assert!(Command::from_frame(Frame::Array(vec![])).is_err());
    }
}
