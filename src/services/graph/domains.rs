//! Domain reads and writes.
//!
//! Writes run as a sequence of statements: the domain node, then each level,
//! then each level's requirement nodes and links. Updates replace all levels
//! of the domain.

use super::{GraphService, queries, require_id};
use crate::models::{
    CreateDomainRequest, CreatedNode, DomainInfo, DomainLevel, DomainNameAvailability, DomainRef,
    DomainWriteResponse, Record, UpdateDomainRequest,
};
use crate::{Error, Result};
use serde_json::Value;
use tracing::instrument;

impl GraphService {
    /// Returns a domain with its levels and requirements.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the name is blank
    /// - [`Error::NotFound`] if no domain has the name
    #[instrument(skip(self))]
    pub async fn get_domain(&self, name: &str) -> Result<Value> {
        let name = require_id(name, "name")?;
        let rows = self.graph.execute(queries::domain_by_name(name)).await?;
        rows.into_iter()
            .find_map(|mut row| row.get_mut("result").map(Value::take))
            .filter(|domain| !domain.is_null())
            .ok_or_else(|| Error::NotFound("domain not found".to_string()))
    }

    /// Reports whether a domain name is free.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the name is blank.
    #[instrument(skip(self))]
    pub async fn validate_domain_name(&self, name: &str) -> Result<DomainNameAvailability> {
        let name = require_id(name, "name")?;
        let existing = self.existing_domain(name).await?;
        Ok(DomainNameAvailability {
            available: existing.is_none(),
            existing_domain_element_id: existing,
        })
    }

    /// Creates a domain with its levels and requirements.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a blank name, no levels, a
    /// requirement naming no node, or a name already in use.
    #[instrument(skip(self, request), fields(domain = %request.domain.name))]
    pub async fn create_domain(&self, request: CreateDomainRequest) -> Result<DomainWriteResponse> {
        let name = validate_domain(&request.domain, &request.levels)?;
        if self.existing_domain(name).await?.is_some() {
            return Err(Error::InvalidInput(
                "Domain with this name already exists".to_string(),
            ));
        }

        let rows = self
            .graph
            .execute(queries::create_domain(name, &request.domain.description))
            .await?;
        let domain_id = returned_element_id(&rows, "create_domain")?;
        let created_nodes = self.write_levels(&domain_id, &request.levels).await?;

        metrics::counter!("atlas_domains_written_total", "operation" => "create").increment(1);
        tracing::info!(domain_id = %domain_id, created = created_nodes.len(), "Created domain");
        Ok(DomainWriteResponse {
            success: true,
            domain: DomainRef {
                element_id: domain_id,
                name: name.to_string(),
            },
            created_nodes,
            affected_user_progress_count: None,
        })
    }

    /// Renames a domain and replaces its levels, deleting user progress on
    /// nodes removed from it.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for a missing id, blank name, no levels or
    ///   a requirement naming no node
    /// - [`Error::NotFound`] if the domain does not exist
    #[instrument(skip(self, request), fields(domain_id = %request.domain_element_id))]
    pub async fn update_domain(&self, request: UpdateDomainRequest) -> Result<DomainWriteResponse> {
        let domain_id = require_id(&request.domain_element_id, "domainElementId")?;
        let name = validate_domain(&request.domain, &request.levels)?;

        let found = self
            .graph
            .execute(queries::domain_name_by_id(domain_id))
            .await?;
        if found.is_empty() {
            return Err(Error::NotFound("Domain not found".to_string()));
        }

        let removed: Vec<String> = request
            .removed_node_element_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
            .map(ToString::to_string)
            .collect();
        let affected = if removed.is_empty() {
            0
        } else {
            self.graph
                .execute(queries::delete_user_progress(&removed))
                .await?
                .first()
                .and_then(|row| row.get_i64("deletedCount"))
                .unwrap_or(0)
        };

        self.graph
            .execute(queries::update_domain(
                domain_id,
                name,
                &request.domain.description,
            ))
            .await?;
        self.graph
            .execute(queries::delete_domain_levels(domain_id))
            .await?;
        let created_nodes = self.write_levels(domain_id, &request.levels).await?;

        metrics::counter!("atlas_domains_written_total", "operation" => "update").increment(1);
        tracing::info!(
            domain_id = %domain_id,
            created = created_nodes.len(),
            affected,
            "Updated domain"
        );
        Ok(DomainWriteResponse {
            success: true,
            domain: DomainRef {
                element_id: domain_id.to_string(),
                name: name.to_string(),
            },
            created_nodes,
            affected_user_progress_count: Some(affected),
        })
    }

    async fn existing_domain(&self, name: &str) -> Result<Option<String>> {
        let rows = self.graph.execute(queries::domain_id_by_name(name)).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get_str("elementId"))
            .map(ToString::to_string))
    }

    /// Creates each level and links its requirements, returning the
    /// requirement nodes that were created.
    async fn write_levels(&self, domain_id: &str, levels: &[DomainLevel]) -> Result<Vec<CreatedNode>> {
        let mut created = Vec::new();

        for level in levels {
            let rows = self
                .graph
                .execute(queries::create_domain_level(domain_id, level))
                .await?;
            let level_id = returned_element_id(&rows, "create_domain_level")?;

            for entry in level.requirements.entries() {
                let existing = entry
                    .node_element_id
                    .map(str::trim)
                    .filter(|id| !id.is_empty());
                let node_id = match (existing, entry.new_node) {
                    (Some(id), _) => id.to_string(),
                    (None, Some(node)) => {
                        let rows = self
                            .graph
                            .execute(queries::merge_requirement_node(entry.kind, node))
                            .await?;
                        let id = returned_element_id(&rows, "merge_requirement_node")?;
                        created.push(CreatedNode {
                            element_id: id.clone(),
                            name: node.name.trim().to_string(),
                            labels: vec![entry.kind.label().to_string()],
                        });
                        id
                    },
                    (None, None) => continue,
                };

                let linked = self
                    .graph
                    .execute(queries::link_requirement(&level_id, &node_id, &entry))
                    .await?
                    .first()
                    .and_then(|row| row.get_i64("linked"))
                    .unwrap_or(0);
                if linked == 0 {
                    tracing::warn!(
                        level_id = %level_id,
                        node_id = %node_id,
                        label = entry.kind.label(),
                        "Required node not found, requirement skipped"
                    );
                }
            }
        }
        Ok(created)
    }
}

/// Checks the parts of a domain write shared by create and update,
/// returning the trimmed name.
fn validate_domain<'a>(domain: &'a DomainInfo, levels: &[DomainLevel]) -> Result<&'a str> {
    let name = domain.name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("Domain name is required".to_string()));
    }
    if levels.is_empty() {
        return Err(Error::InvalidInput(
            "At least one level is required".to_string(),
        ));
    }
    let unresolved = levels
        .iter()
        .flat_map(|level| level.requirements.entries())
        .any(|entry| !entry.is_resolvable());
    if unresolved {
        return Err(Error::InvalidInput(
            "each requirement needs a nodeElementId or a newNode name".to_string(),
        ));
    }
    Ok(name)
}

fn returned_element_id(rows: &[Record], operation: &str) -> Result<String> {
    rows.first()
        .and_then(|row| row.get_str("elementId"))
        .map(ToString::to_string)
        .ok_or_else(|| Error::operation(operation, "no element id returned"))
}
