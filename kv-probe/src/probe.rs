//! Probe sequences run against a store through a [`KvClient`].
//!
//! Each probe is a short, linear series of blocking commands. It returns a
//! report of what the store answered; reports can be rendered as plain text,
//! one value per line, or serialized with serde.
//!
//! ```no_run
//! use kv_probe::{probe, KvClient};
//!
//! let mut client = KvClient::connect("127.0.0.1:6379").unwrap();
//! let report = probe::run_strings(&mut client, "c", "xxxxx").unwrap();
//! assert_eq!(Some("xxxxx".to_owned()), report.fetched);
//! assert_eq!(None, report.after_delete);
//! ```

use crate::{KvClient, ProbeErrorKind, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::info;

/// How absence is printed in plain text output
pub const ABSENT: &str = "null";

/// Common behavior of probe reports
pub trait Report: Serialize {
    /// write the plain text form, one line per value
    fn render<W: Write>(&self, out: &mut W) -> Result<()>;

    /// check that the store honored the probe's contract
    fn verify(&self) -> Result<()> {
        Ok(())
    }
}

/// Outcome of the set/get/delete/get probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringReport {
    /// probed key
    pub key: String,
    /// value written with SET
    pub value: String,
    /// GET right after SET
    pub fetched: Option<String>,
    /// number of keys DEL removed
    pub removed: u64,
    /// GET right after DEL
    pub after_delete: Option<String>,
}

impl Report for StringReport {
    fn render<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{}", self.fetched.as_deref().unwrap_or(ABSENT))?;
        writeln!(out, "{}", self.after_delete.as_deref().unwrap_or(ABSENT))?;
        Ok(())
    }

    fn verify(&self) -> Result<()> {
        if self.fetched.as_deref() != Some(self.value.as_str()) {
            return Err(ProbeErrorKind::ProbeFailed(format!(
                "GET {} returned {:?}, expected {:?}",
                self.key, self.fetched, self.value
            ))
            .into());
        }
        if let Some(stale) = &self.after_delete {
            return Err(ProbeErrorKind::ProbeFailed(format!(
                "GET {} returned {:?} after DEL",
                self.key, stale
            ))
            .into());
        }
        Ok(())
    }
}

/// Outcome of the hash probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashReport {
    /// probed key
    pub key: String,
    /// how many of the written fields were new
    pub added: u64,
    /// HGETALL after writing
    pub entries: BTreeMap<String, String>,
}

impl Report for HashReport {
    fn render<W: Write>(&self, out: &mut W) -> Result<()> {
        for (field, val) in &self.entries {
            writeln!(out, "{}: {}", field, val)?;
        }
        Ok(())
    }
}

/// Outcome of the list probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListReport {
    /// probed key
    pub key: String,
    /// list length reported by LPUSH
    pub length: u64,
    /// LRANGE 0 -1 after pushing
    pub items: Vec<String>,
}

impl Report for ListReport {
    fn render<W: Write>(&self, out: &mut W) -> Result<()> {
        for item in &self.items {
            writeln!(out, "{}", item)?;
        }
        Ok(())
    }
}

/// SET key value, GET key, DEL key, GET key.
///
/// A missing key is never an error here: it shows up as `None` in the report.
pub fn run_strings(client: &mut KvClient, key: &str, value: &str) -> Result<StringReport> {
    info!("Probing strings with key {:?}", key);

    client.set(key.to_owned(), value.to_owned())?;
    let fetched = client.get(key.to_owned())?;
    let removed = client.del(key.to_owned())?;
    let after_delete = client.get(key.to_owned())?;

    Ok(StringReport {
        key: key.to_owned(),
        value: value.to_owned(),
        fetched,
        removed,
        after_delete,
    })
}

/// HSET key field value for every pair, then HGETALL key.
pub fn run_hash(
    client: &mut KvClient,
    key: &str,
    fields: &[(String, String)],
) -> Result<HashReport> {
    info!("Probing hash with key {:?}", key);

    let mut added = 0;
    for (field, val) in fields {
        if client.hset(key.to_owned(), field.clone(), val.clone())? {
            added += 1;
        }
    }
    let entries = client.hgetall(key.to_owned())?;

    Ok(HashReport {
        key: key.to_owned(),
        added,
        entries,
    })
}

/// LPUSH key values..., then LRANGE key 0 -1.
pub fn run_list(client: &mut KvClient, key: &str, values: &[String]) -> Result<ListReport> {
    info!("Probing list with key {:?}", key);

    let length = client.lpush(key.to_owned(), values.to_vec())?;
    let items = client.lrange(key.to_owned(), 0, -1)?;

    Ok(ListReport {
        key: key.to_owned(),
        length,
        items,
    })
}
