//! `init-schema` and `load-cypher` commands.

use crate::services::{LoadSummary, SchemaService};
use crate::storage::Neo4jGraphStore;
use crate::{AtlasConfig, Result};
use std::path::Path;
use std::sync::Arc;

async fn schema_service(config: &AtlasConfig) -> Result<SchemaService> {
    let graph = Arc::new(Neo4jGraphStore::connect(&config.neo4j).await?);
    Ok(SchemaService::new(graph, config.graph.clone()))
}

/// Creates the vector index and account constraint.
///
/// `dimensions` defaults to the configured embedding dimensions.
///
/// # Errors
///
/// Returns an error if Neo4j is unreachable or a statement fails.
pub async fn init_schema(config: &AtlasConfig, dimensions: Option<usize>) -> Result<()> {
    let dimensions = dimensions.unwrap_or(config.embedding.dimensions);
    schema_service(config).await?.init_schema(dimensions).await?;
    tracing::info!(
        index = %config.graph.vector_index,
        label = %config.graph.vector_label,
        dimensions,
        "Schema initialized"
    );
    Ok(())
}

/// Loads every `.cypher` file under `dir`.
///
/// # Errors
///
/// Returns an error if Neo4j is unreachable, the directory cannot be read,
/// or the wipe fails.
pub async fn load_cypher(config: &AtlasConfig, dir: &Path, wipe: bool) -> Result<LoadSummary> {
    let summary = schema_service(config).await?.load_directory(dir, wipe).await?;
    tracing::info!(
        files_loaded = summary.files_loaded,
        files_failed = summary.files_failed,
        statements = summary.statements,
        "Cypher load finished"
    );
    Ok(summary)
}
