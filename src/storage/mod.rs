//! Storage backends.
//!
//! - [`graph`]: the Neo4j knowledge graph behind [`GraphStore`]
//! - [`objects`]: image and upload storage behind [`ObjectStore`]

pub mod graph;
pub mod objects;

pub use graph::{CypherQuery, GraphStore, Neo4jGraphStore};
pub use objects::{MemoryObjectStore, ObjectStore, S3ObjectStore, StoredObject};
