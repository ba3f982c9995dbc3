//! Neo4j backend over Bolt.

use super::{CypherQuery, GraphStore};
use crate::config::Neo4jConfig;
use crate::models::Record;
use crate::{Error, Result};
use async_trait::async_trait;
use neo4rs::{BoltMap, BoltNull, BoltString, BoltType, ConfigBuilder, Graph};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::time::Instant;

/// Graph store backed by a `neo4rs` connection pool.
#[derive(Clone)]
pub struct Neo4jGraphStore {
    graph: Graph,
}

impl std::fmt::Debug for Neo4jGraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jGraphStore").finish_non_exhaustive()
    }
}

impl Neo4jGraphStore {
    /// Connects to Neo4j using the given settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is rejected or the pool cannot
    /// be established.
    pub async fn connect(config: &Neo4jConfig) -> Result<Self> {
        let driver_config = ConfigBuilder::default()
            .uri(config.uri.as_str())
            .user(config.user.as_str())
            .password(config.password.expose_secret())
            .db(config.database.as_str())
            .max_connections(config.max_connections)
            .build()
            .map_err(|e| Error::operation("neo4j_config", e))?;

        let graph = Graph::connect(driver_config)
            .await
            .map_err(|e| Error::operation("neo4j_connect", e))?;

        tracing::info!(uri = %config.uri, database = %config.database, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Wraps an existing driver handle.
    #[must_use]
    pub const fn from_graph(graph: Graph) -> Self {
        Self { graph }
    }

    fn to_driver_query(query: &CypherQuery) -> neo4rs::Query {
        query
            .params
            .iter()
            .fold(neo4rs::query(&query.text), |q, (name, value)| {
                q.param(name, to_bolt(value))
            })
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn execute(&self, query: CypherQuery) -> Result<Vec<Record>> {
        let start = Instant::now();
        let mut stream = self
            .graph
            .execute(Self::to_driver_query(&query))
            .await
            .map_err(|e| Error::operation("neo4j_execute", e))?;

        let mut records = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|e| Error::operation("neo4j_fetch", e))?
        {
            let values = query
                .columns
                .iter()
                .map(|column| decode_column(&row, column))
                .collect::<Result<Vec<_>>>()?;
            records.push(Record::new(query.columns.clone(), values));
        }

        metrics::histogram!("atlas_graph_query_duration_seconds")
            .record(start.elapsed().as_secs_f64());
        tracing::debug!(
            rows = records.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Cypher query completed"
        );
        Ok(records)
    }

    async fn run(&self, query: CypherQuery) -> Result<()> {
        self.graph
            .run(Self::to_driver_query(&query))
            .await
            .map_err(|e| Error::operation("neo4j_run", e))
    }
}

/// Reads one returned column as JSON.
///
/// Every declared column is named in the statement's `RETURN`, so a value
/// that cannot be read means the row holds a type JSON cannot carry.
fn decode_column(row: &neo4rs::Row, column: &str) -> Result<Value> {
    row.get::<Value>(column).map_err(|e| {
        tracing::warn!(column, error = %e, "Failed to decode column");
        Error::operation("neo4j_decode", format!("column '{column}': {e}"))
    })
}

/// Converts a JSON value into a Bolt parameter.
fn to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => BoltType::from(*b),
        Value::Number(n) => n.as_i64().map_or_else(
            || {
                n.as_f64()
                    .map_or_else(|| BoltType::from(n.to_string()), BoltType::from)
            },
            BoltType::from,
        ),
        Value::String(s) => BoltType::from(s.as_str()),
        Value::Array(items) => BoltType::from(items.iter().map(to_bolt).collect::<Vec<_>>()),
        Value::Object(entries) => {
            let mut map = BoltMap::new();
            for (key, value) in entries {
                map.put(BoltString::from(key.as_str()), to_bolt(value));
            }
            BoltType::Map(map)
        },
    }
}
