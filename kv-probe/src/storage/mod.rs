mod memory;

pub use memory::MemoryStore;

use crate::Result;

/// Trait that describe the behavior of the storage engine behind `KvServer`.
///
/// An engine is cloned into every worker thread, so all clones must share the
/// same underlying data.
pub trait KvsEngine: Clone + Send + 'static {
    /// get the string value of key, `None` if absent
    fn get(&self, key: String) -> Result<Option<String>>;

    /// set the string value of key, replacing a value of any kind
    fn set(&self, key: String, val: String) -> Result<()>;

    /// remove key of any kind, return whether it existed
    fn remove(&self, key: String) -> Result<bool>;

    /// set one field of the hash at key, return whether the field is new
    fn hset(&self, key: String, field: String, val: String) -> Result<bool>;

    /// all field-value pairs of the hash at key, ordered by field
    fn hgetall(&self, key: String) -> Result<Vec<(String, String)>>;

    /// prepend vals one by one to the list at key, return the new length
    fn lpush(&self, key: String, vals: Vec<String>) -> Result<usize>;

    /// inclusive range of the list at key; negative indices count from the tail
    fn lrange(&self, key: String, start: i64, stop: i64) -> Result<Vec<String>>;
}
