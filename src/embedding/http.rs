//! HTTP embedding client.
//!
//! Talks to a llama.cpp-style `/embedding` endpoint: the request body is
//! `{"content": "<text>"}` and the response is a list of items whose
//! `embedding` field holds one vector per pooled sequence. The first vector
//! of the first item is used.

use super::Embedder;
use crate::config::EmbeddingConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Embedding client for an HTTP inference endpoint.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    /// Endpoint URL.
    endpoint: String,
    /// Expected dimensions.
    dimensions: usize,
    /// HTTP client.
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    content: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbeddingPayload {
    Items(Vec<EmbeddingItem>),
    Single(EmbeddingItem),
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: EmbeddingVectors,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbeddingVectors {
    Pooled(Vec<Vec<f64>>),
    Flat(Vec<f64>),
}

impl HttpEmbedder {
    /// Default embedding endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "http://127.0.0.1:8080/embedding";

    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::operation("embedding_client", e))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            dimensions: config.dimensions,
            client,
        })
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Returns the endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&EmbeddingRequest { content: text })
            .send()
            .await
            .map_err(|e| Error::operation("embedding_request", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::OperationFailed {
                operation: "embedding_request".to_string(),
                cause: format!("endpoint returned status: {status} - {body}"),
            });
        }

        let payload: EmbeddingPayload = response
            .json()
            .await
            .map_err(|e| Error::operation("embedding_response", e))?;

        check_dimensions(first_vector(payload)?, self.dimensions)
    }
}

/// Rejects vectors whose length differs from the configured dimensions;
/// the vector index only accepts its declared size.
fn check_dimensions(embedding: Vec<f64>, expected: usize) -> Result<Vec<f64>> {
    if embedding.len() == expected {
        return Ok(embedding);
    }
    tracing::warn!(
        expected,
        actual = embedding.len(),
        "Embedding dimensions differ from configuration"
    );
    Err(Error::OperationFailed {
        operation: "embedding_response".to_string(),
        cause: format!(
            "expected {expected} dimensions, endpoint returned {}",
            embedding.len()
        ),
    })
}

/// Extracts the first non-empty vector from a response payload.
fn first_vector(payload: EmbeddingPayload) -> Result<Vec<f64>> {
    let item = match payload {
        EmbeddingPayload::Items(items) => items.into_iter().next(),
        EmbeddingPayload::Single(item) => Some(item),
    };

    let vector = item.and_then(|item| match item.embedding {
        EmbeddingVectors::Pooled(vectors) => vectors.into_iter().next(),
        EmbeddingVectors::Flat(vector) => Some(vector),
    });

    vector
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::OperationFailed {
            operation: "embedding_response".to_string(),
            cause: "response contained no embedding".to_string(),
        })
}
