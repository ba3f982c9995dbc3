//! Business logic services.
//!
//! Services validate requests, orchestrate the graph, embedding, imaging and
//! object storage backends, and map results into response types. The HTTP
//! layer stays a thin translation between routes and these services.

mod accounts;
mod assets;
pub mod graph;
mod profile;
mod schema;

#[cfg(test)]
pub(crate) mod testing;

pub use accounts::{ACCOUNT_NOT_FOUND, AccountService, BAD_CREDENTIALS, DUPLICATE_ACCOUNT};
pub use assets::AssetService;
pub use graph::{DEFAULT_SEARCH_LABELS, GraphService, SIMILAR_REFERENCE_REQUIRED};
pub use profile::ProfileService;
pub use schema::{LoadSummary, SchemaService, collect_cypher_files, split_statements};
