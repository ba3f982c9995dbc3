//! # Atlas
//!
//! HTTP/JSON backend for the Atlas of Us personal knowledge graph.
//!
//! Atlas exposes a Neo4j-backed graph of people, skills, pursuits and
//! knowledge through an axum API with signed-token authentication,
//! vector similarity search and object storage for generated imagery.
//!
//! ## Layers
//!
//! - [`storage`]: graph database and object storage backends behind traits
//! - [`embedding`] / [`imaging`]: clients for external inference endpoints
//! - [`security`]: password hashing, JWT issuance and the request rate limiter
//! - [`services`]: account, graph, profile and asset operations
//! - [`http`]: router, middleware and handlers
//!
//! ## Example
//!
//! ```rust,ignore
//! use atlas::config::AtlasConfig;
//! use atlas::http::{self, AppState, Dependencies};
//!
//! let config = AtlasConfig::load(None)?;
//! let state = AppState::new(Dependencies::connect(&config).await?, &config)?;
//! http::serve(http::router(state, &config.server), config.server.listen_addr).await?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
// Current duplicates come from the AWS SDK and neo4rs dependency trees.
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cli;
pub mod config;
pub mod embedding;
pub mod http;
pub mod imaging;
pub mod models;
pub mod observability;
pub mod security;
pub mod services;
pub mod storage;

pub use config::AtlasConfig;
pub use embedding::Embedder;
pub use imaging::ImageGenerator;
pub use storage::{GraphStore, ObjectStore};

/// Error type for atlas operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Missing request fields, malformed property JSON, bad identifiers |
/// | `NotFound` | Update/delete targets or stored objects that do not exist |
/// | `AlreadyExists` | Sign-up with a username or phone already on record |
/// | `SimilarNodeExists` | Node creation that collides with an existing embedding |
/// | `Unauthorized` | Bad credentials, missing or invalid bearer token |
/// | `OperationFailed` | Neo4j, S3, hashing or inference endpoint failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - Required request fields are missing or empty
    /// - `properties` query JSON is malformed or holds non-string values
    /// - A label, relationship type or property key is empty
    /// - Depth or limit values fall outside their allowed range
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An entity with the same identity already exists.
    ///
    /// Raised when sign-up finds a Person with the same username or phone.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A node with a near-identical embedding already exists.
    #[error("similar node already exists (score {score:.3})")]
    SimilarNodeExists {
        /// Similarity score of the closest existing node.
        score: f64,
    },

    /// Authentication failed.
    ///
    /// Raised when:
    /// - Login finds no unique user or the password does not verify
    /// - The bearer token is missing, malformed, expired or badly signed
    /// - The signing secret is too short or has insufficient entropy
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Neo4j connection or query execution fails
    /// - S3 reads or writes fail
    /// - Embedding or image generation endpoints fail or return bad payloads
    /// - Password hashing fails
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Shorthand for building an [`Error::OperationFailed`].
    pub fn operation(operation: impl Into<String>, cause: impl ToString) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for atlas operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
///
/// # Examples
///
/// ```rust
/// use atlas::current_timestamp;
///
/// let ts = current_timestamp();
/// assert!(ts > 0);
/// ```
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("labels are required".to_string());
        assert_eq!(err.to_string(), "invalid input: labels are required");

        let err = Error::operation("neo4j_execute", "connection reset");
        assert_eq!(
            err.to_string(),
            "operation 'neo4j_execute' failed: connection reset"
        );

        let err = Error::SimilarNodeExists { score: 0.91234 };
        assert_eq!(err.to_string(), "similar node already exists (score 0.912)");

        let err = Error::Unauthorized("missing token".to_string());
        assert_eq!(err.to_string(), "unauthorized: missing token");
    }

    #[test]
    fn test_current_timestamp_is_recent() {
        // 2023-11-14 as a lower bound
        assert!(current_timestamp() > 1_700_000_000);
    }
}
