//! Image generation for new nodes.

mod http;

pub use http::HttpImageGenerator;

use crate::Result;
use async_trait::async_trait;

/// Trait for image generators.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generates an image for `prompt`, returning encoded image bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the generator fails or returns no image.
    async fn generate(&self, prompt: &str) -> Result<Vec<u8>>;
}

/// Builds the line-drawing prompt used for node illustrations.
#[must_use]
pub fn node_image_prompt(subject: &str) -> String {
    format!(
        "A minimalistic black-and-white line drawing of '{subject}'. The sketch is drawn with \
         elegant, simple outlines, with no shading or extra details. The style is similar to \
         high-fashion sketches, emphasizing grace."
    )
}
