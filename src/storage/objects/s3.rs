//! Amazon S3 backend.

use super::{DEFAULT_CONTENT_TYPE, ObjectStore, StoredObject, sniff_content_type};
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

/// Object store backed by Amazon S3.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Builds a client from the default AWS credential chain for `region`.
    pub async fn from_env(region: &str) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self {
            client: Client::new(&sdk_config),
        }
    }

    /// Wraps an existing client.
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(aws_sdk_s3::operation::get_object::GetObjectError::is_no_such_key)
                {
                    Error::NotFound(format!("object '{key}' in bucket '{bucket}'"))
                } else {
                    Error::operation("s3_get_object", format!("{bucket}/{key}: {e}"))
                }
            })?;

        let stored_type = response.content_type().map(ToString::to_string);
        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| Error::operation("s3_read_object", format!("{bucket}/{key}: {e}")))?
            .into_bytes()
            .to_vec();

        let sniffed = sniff_content_type(&bytes);
        let content_type = if sniffed == DEFAULT_CONTENT_TYPE {
            stored_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
        } else {
            sniffed.to_string()
        };

        tracing::debug!(bucket, key, bytes = bytes.len(), content_type = %content_type, "Fetched S3 object");
        Ok(StoredObject {
            bytes,
            content_type,
        })
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let length = i64::try_from(bytes.len())
            .map_err(|e| Error::operation("s3_put_object", e))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .content_length(length)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| Error::operation("s3_put_object", format!("{bucket}/{key}: {e}")))?;

        tracing::info!(bucket, key, bytes = length, content_type, "Uploaded S3 object");
        Ok(())
    }
}
