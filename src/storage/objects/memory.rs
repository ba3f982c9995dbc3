//! In-memory object store.

use super::{ObjectStore, StoredObject};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Object store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<(String, String), StoredObject>>,
}

impl MemoryObjectStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().map_or(0, |objects| objects.len())
    }

    /// Returns true when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lists stored `(bucket, key)` pairs.
    #[must_use]
    pub fn keys(&self) -> Vec<(String, String)> {
        self.objects
            .read()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        let objects = self
            .objects
            .read()
            .map_err(|e| Error::operation("memory_object_get", e))?;
        objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("object '{key}' in bucket '{bucket}'")))
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let mut objects = self
            .objects
            .write()
            .map_err(|e| Error::operation("memory_object_put", e))?;
        objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}
