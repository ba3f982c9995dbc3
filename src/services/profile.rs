//! User profiles.

use crate::models::Record;
use crate::services::graph::{queries, redact_records};
use crate::storage::GraphStore;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::instrument;

/// Profile service.
pub struct ProfileService {
    graph: Arc<dyn GraphStore>,
}

impl ProfileService {
    /// Creates a new profile service.
    #[must_use]
    pub fn new(graph: Arc<dyn GraphStore>) -> Self {
        Self { graph }
    }

    /// Returns the `Person` named `username` with its outgoing neighbours.
    ///
    /// Password hashes are removed from every returned node.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the username is blank
    /// - [`Error::NotFound`] if no such person exists
    #[instrument(skip(self))]
    pub async fn user_profile(&self, username: &str) -> Result<Vec<Record>> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::InvalidInput("username is required".to_string()));
        }

        let mut records = self
            .graph
            .execute(queries::person_profile(username))
            .await?;
        if records.is_empty() {
            return Err(Error::NotFound("user not found".to_string()));
        }

        redact_records(&mut records);
        Ok(records)
    }
}
