//! Object storage access for the helper routes.

use crate::storage::objects::{DEFAULT_CONTENT_TYPE, sniff_content_type};
use crate::storage::{ObjectStore, StoredObject};
use crate::{Error, Result};
use std::sync::Arc;
use tracing::instrument;

/// Asset service resolving buckets against a configured default.
pub struct AssetService {
    objects: Arc<dyn ObjectStore>,
    default_bucket: Option<String>,
}

impl AssetService {
    /// Creates a new asset service.
    #[must_use]
    pub fn new(objects: Arc<dyn ObjectStore>, default_bucket: Option<String>) -> Self {
        Self {
            objects,
            default_bucket,
        }
    }

    /// Reads an object.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the key or bucket cannot be resolved
    /// - [`Error::NotFound`] if the object does not exist
    #[instrument(skip(self))]
    pub async fn get(&self, bucket: Option<&str>, key: Option<&str>) -> Result<StoredObject> {
        let (bucket, key) = self.resolve(bucket, key)?;
        self.objects.get(bucket, key).await
    }

    /// Stores an object, sniffing its content type when none is given.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the key or bucket cannot be resolved
    /// - [`Error::OperationFailed`] if the backend fails
    #[instrument(skip(self, bytes, content_type), fields(size = bytes.len()))]
    pub async fn put(
        &self,
        bucket: Option<&str>,
        key: Option<&str>,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<()> {
        let (bucket, key) = self.resolve(bucket, key)?;
        let content_type = content_type
            .filter(|ct| !ct.is_empty() && *ct != DEFAULT_CONTENT_TYPE)
            .unwrap_or_else(|| sniff_content_type(&bytes))
            .to_string();

        self.objects.put(bucket, key, bytes, &content_type).await?;
        tracing::info!(bucket, key, content_type = %content_type, "Stored object");
        Ok(())
    }

    fn resolve<'a>(
        &'a self,
        bucket: Option<&'a str>,
        key: Option<&'a str>,
    ) -> Result<(&'a str, &'a str)> {
        let key = key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::InvalidInput("key is required".to_string()))?;
        let bucket = bucket
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .or(self.default_bucket.as_deref())
            .ok_or_else(|| {
                Error::InvalidInput("bucket is required; no default bucket is configured".to_string())
            })?;
        Ok((bucket, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryObjectStore;

    const PNG: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[tokio::test]
    async fn test_default_bucket_round_trip() {
        let store = Arc::new(MemoryObjectStore::new());
        let assets = AssetService::new(store.clone(), Some("atlas".to_string()));

        assets
            .put(None, Some("img/rust.png"), PNG.to_vec(), None)
            .await
            .expect("put");
        assert_eq!(store.keys(), vec![("atlas".to_string(), "img/rust.png".to_string())]);

        let object = assets.get(Some(""), Some("img/rust.png")).await.expect("get");
        assert_eq!(object.content_type, "image/png");
    }

    #[tokio::test]
    async fn test_explicit_content_type_kept() {
        let store = Arc::new(MemoryObjectStore::new());
        let assets = AssetService::new(store, None);
        assets
            .put(Some("docs"), Some("notes.txt"), b"hello".to_vec(), Some("text/plain"))
            .await
            .expect("put");
        let object = assets.get(Some("docs"), Some("notes.txt")).await.expect("get");
        assert_eq!(object.content_type, "text/plain");
    }

    #[tokio::test]
    async fn test_resolution_errors() {
        let assets = AssetService::new(Arc::new(MemoryObjectStore::new()), None);
        assert!(matches!(
            assets.get(Some("b"), None).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            assets.get(None, Some("k")).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            assets.get(Some("b"), Some("missing")).await,
            Err(Error::NotFound(_))
        ));
    }
}
