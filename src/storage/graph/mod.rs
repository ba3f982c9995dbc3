//! Graph database access.
//!
//! Services talk to the graph through the [`GraphStore`] trait, which runs a
//! parameterized [`CypherQuery`] and returns rows as [`Record`]s of JSON
//! values. Every query names the columns it returns, so backends read rows
//! by column name and never need to introspect driver types.
//!
//! # Available Implementations
//!
//! | Backend | Use Case |
//! |---------|----------|
//! | [`Neo4jGraphStore`] | Production; Bolt connection pool via `neo4rs` |
//!
//! Tests substitute their own implementations that match on query text.

pub mod cypher;
mod neo4j;

pub use cypher::{escape_identifier, label_expression, split_labels};
pub use neo4j::Neo4jGraphStore;

use crate::Result;
use crate::models::Record;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// A parameterized Cypher statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CypherQuery {
    /// Statement text. Values are referenced as `$name` parameters.
    pub text: String,
    /// Bound parameters.
    pub params: Map<String, Value>,
    /// Columns to read from each returned row, in `RETURN` order.
    pub columns: Vec<String>,
}

impl CypherQuery {
    /// Creates a statement with no parameters or result columns.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            params: Map::new(),
            columns: Vec::new(),
        }
    }

    /// Binds a parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Declares the returned columns.
    #[must_use]
    pub fn returns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Returns a bound parameter.
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }
}

/// Trait for graph database backends.
///
/// # Implementor Notes
///
/// - Methods use `&self` to enable sharing via `Arc<dyn GraphStore>`
/// - `execute` returns one [`Record`] per row with `keys == query.columns`
/// - A column that cannot be read as JSON fails the whole statement
/// - Driver and transport failures map to [`crate::Error::OperationFailed`]
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Runs a statement and collects its rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    async fn execute(&self, query: CypherQuery) -> Result<Vec<Record>>;

    /// Runs a statement and discards its rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    async fn run(&self, query: CypherQuery) -> Result<()> {
        self.execute(query).await.map(|_| ())
    }

    /// Checks that the database answers a trivial query.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable.
    async fn ping(&self) -> Result<()> {
        self.execute(CypherQuery::new("RETURN 1 AS ok").returns(["ok"]))
            .await
            .map(|_| ())
    }
}
