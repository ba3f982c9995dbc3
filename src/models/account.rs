//! Account and helper request types.

use serde::{Deserialize, Serialize};

/// Body of `sign-up`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUpRequest {
    /// Desired username.
    #[serde(default)]
    pub username: String,
    /// Plain-text password; hashed before storage.
    #[serde(default)]
    pub password: String,
    /// Phone number.
    #[serde(default)]
    pub phone: String,
}

/// Body of `login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    /// Username.
    #[serde(default)]
    pub username: String,
    /// Plain-text password.
    #[serde(default)]
    pub password: String,
}

/// Token returned by `sign-up` and `login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Signed bearer token.
    pub token: String,
}

/// Body of the `embedding` helper.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddingRequest {
    /// Text to embed.
    #[serde(default)]
    pub text: String,
}

/// Result of the `embedding` helper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// Embedding vector.
    pub embedding: Vec<f64>,
}

/// Query parameters addressing a stored object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectLocation {
    /// Bucket; falls back to the configured default.
    #[serde(default)]
    pub bucket: Option<String>,
    /// Object key.
    #[serde(default)]
    pub key: Option<String>,
}
