//! Object storage for generated images and client uploads.
//!
//! # Available Implementations
//!
//! | Backend | Use Case |
//! |---------|----------|
//! | [`S3ObjectStore`] | Production; Amazon S3 via the AWS SDK |
//! | [`MemoryObjectStore`] | Development and tests |

mod memory;
mod s3;

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

use crate::Result;
use async_trait::async_trait;

/// Fallback content type for unrecognised payloads.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// An object read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Raw bytes.
    pub bytes: Vec<u8>,
    /// MIME type.
    pub content_type: String,
}

/// Trait for object storage backends.
///
/// # Implementor Notes
///
/// - `get` returns [`crate::Error::NotFound`] for missing keys
/// - `put` overwrites existing objects
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Reads an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is missing or the backend fails.
    async fn get(&self, bucket: &str, key: &str) -> Result<StoredObject>;

    /// Writes an object with the given content type.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>, content_type: &str)
    -> Result<()>;
}

/// Detects a MIME type from magic bytes.
#[must_use]
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    infer::get(bytes).map_or(DEFAULT_CONTENT_TYPE, |kind| kind.mime_type())
}
