use super::KvsEngine;
use crate::{ProbeErrorKind, Result};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
enum Value {
    Str(String),
    Hash(BTreeMap<String, String>),
    List(VecDeque<String>),
}

/// In-memory storage engine holding strings, hashes and lists.
///
/// Cloning is cheap and every clone sees the same data.
///
/// ```
/// use kv_probe::{KvsEngine, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.set("c".to_owned(), "xxxxx".to_owned()).unwrap();
/// assert_eq!(Some("xxxxx".to_owned()), store.get("c".to_owned()).unwrap());
///
/// assert!(store.remove("c".to_owned()).unwrap());
/// assert_eq!(None, store.get("c".to_owned()).unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    database: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl MemoryStore {
    /// create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Value>>> {
        self.database
            .lock()
            .map_err(|_| ProbeErrorKind::LockPoisoned.into())
    }
}

impl KvsEngine for MemoryStore {
    fn get(&self, key: String) -> Result<Option<String>> {
        match self.lock()?.get(&key) {
            Some(Value::Str(val)) => Ok(Some(val.clone())),
            Some(_) => Err(ProbeErrorKind::WrongType.into()),
            None => Ok(None),
        }
    }

    fn set(&self, key: String, val: String) -> Result<()> {
        self.lock()?.insert(key, Value::Str(val));
        Ok(())
    }

    fn remove(&self, key: String) -> Result<bool> {
        Ok(self.lock()?.remove(&key).is_some())
    }

    fn hset(&self, key: String, field: String, val: String) -> Result<bool> {
        let mut database = self.lock()?;
        let entry = database
            .entry(key)
            .or_insert_with(|| Value::Hash(BTreeMap::new()));
        match entry {
            Value::Hash(hash) => Ok(hash.insert(field, val).is_none()),
            _ => Err(ProbeErrorKind::WrongType.into()),
        }
    }

    fn hgetall(&self, key: String) -> Result<Vec<(String, String)>> {
        match self.lock()?.get(&key) {
            Some(Value::Hash(hash)) => Ok(hash
                .iter()
                .map(|(field, val)| (field.clone(), val.clone()))
                .collect()),
            Some(_) => Err(ProbeErrorKind::WrongType.into()),
            None => Ok(vec![]),
        }
    }

    fn lpush(&self, key: String, vals: Vec<String>) -> Result<usize> {
        let mut database = self.lock()?;
        let entry = database
            .entry(key)
            .or_insert_with(|| Value::List(VecDeque::new()));
        match entry {
            Value::List(list) => {
                for val in vals {
                    list.push_front(val);
                }
                Ok(list.len())
            }
            _ => Err(ProbeErrorKind::WrongType.into()),
        }
    }

    fn lrange(&self, key: String, start: i64, stop: i64) -> Result<Vec<String>> {
        match self.lock()?.get(&key) {
            Some(Value::List(list)) => Ok(match range_bounds(list.len(), start, stop) {
                Some((from, to)) => list.range(from..=to).cloned().collect(),
                None => vec![],
            }),
            Some(_) => Err(ProbeErrorKind::WrongType.into()),
            None => Ok(vec![]),
        }
    }
}

// resolve possibly negative inclusive bounds against a list of `len` items
fn range_bounds(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (start + len).max(0) } else { start };
    let stop = if stop < 0 { stop + len } else { stop.min(len - 1) };
    if start > stop || start >= len {
        None
    } else {
        Some((start as usize, stop as usize))
    }
}
