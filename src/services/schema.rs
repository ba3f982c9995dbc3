//! Schema setup and bulk Cypher loading.

use crate::config::GraphConfig;
use crate::storage::graph::escape_identifier;
use crate::storage::{CypherQuery, GraphStore};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File extension of loadable Cypher scripts.
const CYPHER_EXTENSION: &str = "cypher";

/// Outcome of [`SchemaService::load_directory`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Files whose statements all ran.
    pub files_loaded: usize,
    /// Files abandoned at their first failing statement.
    pub files_failed: usize,
    /// Statements executed successfully.
    pub statements: usize,
}

/// Schema service.
pub struct SchemaService {
    graph: Arc<dyn GraphStore>,
    config: GraphConfig,
}

impl SchemaService {
    /// Creates a new schema service.
    #[must_use]
    pub fn new(graph: Arc<dyn GraphStore>, config: GraphConfig) -> Self {
        Self { graph, config }
    }

    /// Creates the vector index and the `Person.username` constraint.
    ///
    /// # Errors
    ///
    /// Returns an error if the index name or label is invalid or a statement
    /// fails.
    pub async fn init_schema(&self, dimensions: usize) -> Result<()> {
        if dimensions == 0 {
            return Err(Error::InvalidInput(
                "dimensions must be greater than zero".to_string(),
            ));
        }

        for statement in self.schema_statements(dimensions)? {
            tracing::info!(statement = %statement.text, "Applying schema statement");
            self.graph.run(statement).await?;
        }
        Ok(())
    }

    fn schema_statements(&self, dimensions: usize) -> Result<Vec<CypherQuery>> {
        let index = escape_identifier(&self.config.vector_index)?;
        let label = escape_identifier(&self.config.vector_label)?;

        Ok(vec![
            CypherQuery::new(format!(
                "CREATE VECTOR INDEX {index} IF NOT EXISTS\n\
                 FOR (n:{label}) ON (n.embedding)\n\
                 OPTIONS {{indexConfig: {{`vector.dimensions`: {dimensions}, \
                 `vector.similarity_function`: 'cosine'}}}}"
            )),
            CypherQuery::new(
                "CREATE CONSTRAINT person_username IF NOT EXISTS\n\
                 FOR (p:Person) REQUIRE p.username IS UNIQUE",
            ),
        ])
    }

    /// Runs every `.cypher` file under `dir`, optionally wiping the graph
    /// first.
    ///
    /// A failing statement abandons the rest of its file; loading continues
    /// with the next file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read or the wipe fails.
    pub async fn load_directory(&self, dir: &Path, wipe: bool) -> Result<LoadSummary> {
        let files = collect_cypher_files(dir)?;

        if wipe {
            tracing::warn!("Deleting every node and relationship");
            self.graph
                .run(CypherQuery::new("MATCH (n) DETACH DELETE n"))
                .await?;
        }

        let mut summary = LoadSummary::default();
        for file in files {
            let contents = std::fs::read_to_string(&file)
                .map_err(|e| Error::operation("read_cypher_file", format!("{}: {e}", file.display())))?;

            match self.run_script(&contents).await {
                Ok(count) => {
                    tracing::info!(file = %file.display(), statements = count, "Loaded Cypher file");
                    summary.files_loaded += 1;
                    summary.statements += count;
                },
                Err((count, e)) => {
                    tracing::error!(file = %file.display(), error = %e, "Cypher file failed");
                    summary.files_failed += 1;
                    summary.statements += count;
                },
            }
        }
        Ok(summary)
    }

    /// Runs a script's statements in order, returning how many succeeded.
    async fn run_script(&self, contents: &str) -> std::result::Result<usize, (usize, Error)> {
        let mut executed = 0;
        for statement in split_statements(contents) {
            self.graph
                .run(CypherQuery::new(statement))
                .await
                .map_err(|e| (executed, e))?;
            executed += 1;
        }
        Ok(executed)
    }
}

/// Lists `.cypher` files under `dir`: files in name order, then each
/// subdirectory in name order, recursively.
///
/// # Errors
///
/// Returns an error if a directory cannot be read.
pub fn collect_cypher_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| Error::operation("read_cypher_dir", format!("{}: {e}", dir.display())))?;

    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| Error::operation("read_cypher_dir", e))?
            .path();
        if path.is_dir() {
            dirs.push(path);
        } else if path
            .extension()
            .is_some_and(|ext| ext == CYPHER_EXTENSION)
        {
            files.push(path);
        }
    }
    files.sort();
    dirs.sort();

    for sub in dirs {
        files.extend(collect_cypher_files(&sub)?);
    }
    Ok(files)
}

/// Splits a script on `;` at line ends, dropping blank statements.
#[must_use]
pub fn split_statements(contents: &str) -> Vec<String> {
    contents
        .replace("\r\n", "\n")
        .split(";\n")
        .map(|statement| statement.trim().trim_end_matches(';').trim())
        .filter(|statement| !statement.is_empty())
        .map(ToString::to_string)
        .collect()
}
