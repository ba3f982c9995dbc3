//! Graph request and response types.
//!
//! Field names follow the camelCase wire format of the web clients.
//! Required fields deserialize with defaults so that missing values surface
//! as validation errors from the service layer rather than as body
//! rejections.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Query parameters for `get-nodes`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeQuery {
    /// Comma-separated labels the node must carry.
    #[serde(default)]
    pub labels: Option<String>,
    /// URL-encoded JSON object of string property filters.
    #[serde(default)]
    pub properties: Option<String>,
    /// Relationship expansion depth.
    #[serde(default)]
    pub depth: Option<u32>,
}

/// Query parameters for `get-node-with-relationships-by-search-term`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTermQuery {
    /// Free text to embed and match.
    #[serde(default)]
    pub search_term: Option<String>,
    /// Relationship expansion depth.
    #[serde(default)]
    pub depth: Option<u32>,
}

/// Body of `create-node`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateNodeRequest {
    /// Labels for the new node.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Properties for the new node; `name` is required.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Body of `update-node`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNodeRequest {
    /// Element id of the node to update.
    #[serde(default)]
    pub target_id: String,
    /// Labels to add.
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    /// Properties to merge.
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

/// Body of `create-relationship`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRelationshipRequest {
    /// Element id of the start node.
    #[serde(default)]
    pub source_id: String,
    /// Element id of the end node.
    #[serde(default)]
    pub target_id: String,
    /// Relationship type.
    #[serde(default, rename = "type")]
    pub rel_type: String,
    /// Relationship properties.
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

/// Body of `update-relationship`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRelationshipRequest {
    /// Element id of the relationship to update.
    #[serde(default)]
    pub target_id: String,
    /// New relationship type; the relationship is recreated when present.
    #[serde(default, rename = "type")]
    pub rel_type: Option<String>,
    /// Replacement properties.
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

/// Body of `delete-relationship`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRelationshipRequest {
    /// Element id of the relationship to delete.
    #[serde(default)]
    pub relationship_id: String,
}

/// Result of `delete-relationship`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRelationshipResponse {
    /// Number of relationships deleted.
    pub deleted: i64,
}

/// Body of `similar-nodes`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarNodesRequest {
    /// Reference node element id.
    #[serde(default)]
    pub node_id: Option<String>,
    /// Reference embedding.
    #[serde(default)]
    pub embedding: Option<Vec<f64>>,
    /// Maximum results (default 5).
    #[serde(default)]
    pub limit: Option<u32>,
}

/// One `similar-nodes` hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarNode {
    /// Node name.
    pub name: Option<String>,
    /// Node description.
    pub description: Option<String>,
    /// Node element id.
    pub id: String,
    /// Similarity score.
    pub score: f64,
}

/// Query parameters for `search-nodes`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchNodesQuery {
    /// Text to look for in node names.
    #[serde(default)]
    pub query: Option<String>,
    /// Comma-separated labels to restrict the search to.
    #[serde(default)]
    pub labels: Option<String>,
    /// Maximum results (default 20).
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Response body of `search-nodes`.
///
/// Each hit is `{"elementId", "labels", "props"}` with `props` holding the
/// node's properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchNodesResponse {
    /// Matching nodes ordered by name.
    pub nodes: Vec<Value>,
}
