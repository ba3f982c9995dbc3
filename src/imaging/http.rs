//! HTTP image generation client.
//!
//! The diffusion service answers `{"prompt", "width", "height",
//! "num_inference_steps"}` with PNG bytes. Hosted APIs that answer with an
//! OpenAI-style `{"data": [{"url"} | {"b64_json"}]}` envelope are accepted
//! too; URLs are downloaded and base64 payloads decoded.

use super::ImageGenerator;
use crate::config::ImageGenerationConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Image generation client for an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpImageGenerator {
    endpoint: String,
    api_key: Option<SecretString>,
    width: u32,
    height: u32,
    steps: u32,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    prompt: &'a str,
    width: u32,
    height: u32,
    num_inference_steps: u32,
}

#[derive(Debug, Deserialize)]
struct GenerationEnvelope {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

impl HttpImageGenerator {
    /// Creates a client from configuration.
    ///
    /// Returns `Ok(None)` when no endpoint is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ImageGenerationConfig) -> Result<Option<Self>> {
        let Some(endpoint) = config.endpoint.clone() else {
            return Ok(None);
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::operation("image_generation_client", e))?;

        Ok(Some(Self {
            endpoint,
            api_key: config.api_key.clone(),
            width: config.width,
            height: config.height,
            steps: config.steps,
            client,
        }))
    }

    /// Returns the endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::operation("image_download", e))?;

        if !response.status().is_success() {
            return Err(Error::OperationFailed {
                operation: "image_download".to_string(),
                cause: format!("download returned status: {}", response.status()),
            });
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| Error::operation("image_download", e))
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>> {
        let mut request = self.client.post(&self.endpoint).json(&GenerationRequest {
            prompt,
            width: self.width,
            height: self.height,
            num_inference_steps: self.steps,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::operation("image_generation_request", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::OperationFailed {
                operation: "image_generation_request".to_string(),
                cause: format!("endpoint returned status: {status} - {body}"),
            });
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::operation("image_generation_response", e))?;

        if !is_json {
            return Ok(body.to_vec());
        }

        match decode_envelope(&body)? {
            EnvelopeImage::Bytes(bytes) => Ok(bytes),
            EnvelopeImage::Url(url) => self.download(&url).await,
        }
    }
}

/// Image reference extracted from a JSON envelope.
#[derive(Debug, PartialEq, Eq)]
enum EnvelopeImage {
    Bytes(Vec<u8>),
    Url(String),
}

fn decode_envelope(body: &[u8]) -> Result<EnvelopeImage> {
    let envelope: GenerationEnvelope = serde_json::from_slice(body)
        .map_err(|e| Error::operation("image_generation_response", e))?;

    let first = envelope
        .data
        .into_iter()
        .next()
        .ok_or_else(|| Error::OperationFailed {
            operation: "image_generation_response".to_string(),
            cause: "response contained no images".to_string(),
        })?;

    if let Some(encoded) = first.b64_json {
        return BASE64
            .decode(encoded.as_bytes())
            .map(EnvelopeImage::Bytes)
            .map_err(|e| Error::operation("image_generation_decode", e));
    }

    first
        .url
        .map(EnvelopeImage::Url)
        .ok_or_else(|| Error::OperationFailed {
            operation: "image_generation_response".to_string(),
            cause: "image entry had neither url nor b64_json".to_string(),
        })
}
