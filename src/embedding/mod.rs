//! Embedding generation.
//!
//! Node text is embedded by an external inference endpoint. The
//! [`Embedder`] trait keeps services independent of the transport so tests
//! can substitute deterministic vectors.

mod http;

pub use http::HttpEmbedder;

use crate::Result;
use async_trait::async_trait;

/// Trait for embedding generators.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Generates an embedding for the given text.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding generation fails.
    async fn embed(&self, text: &str) -> Result<Vec<f64>>;
}

/// Builds the text embedded for a node from its name and description.
#[must_use]
pub fn node_embedding_text(name: &str, description: &str) -> String {
    format!("{name}: {description}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_embedding_text() {
        assert_eq!(
            node_embedding_text("Rust", "A systems language"),
            "Rust: A systems language"
        );
        assert_eq!(node_embedding_text("Rust", ""), "Rust: ");
    }
}
