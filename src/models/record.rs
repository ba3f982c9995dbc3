//! Query result records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of a graph query result.
///
/// Serializes as `{"Keys": [...], "Values": [...]}`, the record shape the
/// web clients already consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Record {
    /// Column names, in `RETURN` order.
    #[serde(rename = "Keys")]
    pub keys: Vec<String>,
    /// Column values, aligned with `keys`.
    #[serde(rename = "Values")]
    pub values: Vec<Value>,
}

impl Record {
    /// Builds a record from parallel key and value lists.
    #[must_use]
    pub const fn new(keys: Vec<String>, values: Vec<Value>) -> Self {
        Self { keys, values }
    }

    /// Builds a record from `(key, value)` pairs.
    #[must_use]
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let (keys, values) = pairs.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Self { keys, values }
    }

    /// Returns the value of column `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.keys
            .iter()
            .position(|k| k == key)
            .and_then(|idx| self.values.get(idx))
    }

    /// Returns a mutable reference to the value of column `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.keys
            .iter()
            .position(|k| k == key)
            .and_then(move |idx| self.values.get_mut(idx))
    }

    /// Returns column `key` as a string slice.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Returns column `key` as a float.
    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// Returns column `key` as an integer.
    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }
}
