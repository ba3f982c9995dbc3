//! Graph operations behind the secure graph routes.
//!
//! [`GraphService`] validates requests, computes embeddings, builds Cypher
//! through [`queries`] and maps rows back into response types. Node
//! creation chains embedding, a similarity check, optional image generation
//! and upload, and finally the `CREATE` statement. Domains, their levels
//! and level requirements are read and written in [`domains`].

mod domains;
pub mod queries;

use crate::config::GraphConfig;
use crate::embedding::{Embedder, node_embedding_text};
use crate::imaging::{ImageGenerator, node_image_prompt};
use crate::models::{
    CreateNodeRequest, CreateRelationshipRequest, DeleteRelationshipRequest,
    DeleteRelationshipResponse, NodeQuery, Record, SearchNodesQuery, SearchNodesResponse,
    SearchTermQuery, SimilarNode, SimilarNodesRequest, UpdateNodeRequest,
    UpdateRelationshipRequest,
};
use crate::storage::graph::split_labels;
use crate::storage::objects::sniff_content_type;
use crate::storage::{GraphStore, ObjectStore};
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::instrument;

/// Default relationship expansion depth.
const DEFAULT_DEPTH: u32 = 1;

/// Default and maximum `similar-nodes` limit.
const DEFAULT_SIMILAR_LIMIT: u32 = 5;
const MAX_SIMILAR_LIMIT: u32 = 100;

/// Default and maximum `search-nodes` limit.
const DEFAULT_SEARCH_LIMIT: u32 = 20;
const MAX_SEARCH_LIMIT: u32 = 100;

/// Labels searched when the client names none.
pub const DEFAULT_SEARCH_LABELS: [&str; 4] = ["Knowledge", "Skill", "Trait", "Milestone"];

/// Message for `similar-nodes` requests with both or neither reference.
pub const SIMILAR_REFERENCE_REQUIRED: &str =
    "Exactly one of 'nodeId' or 'embedding' must be provided";

/// Property holding the node embedding.
const EMBEDDING_PROPERTY: &str = "embedding";

/// Property holding the generated image key.
const IMAGE_PROPERTY: &str = "image";

/// Properties never returned from graph reads.
const HIDDEN_PROPERTIES: [&str; 1] = ["password"];

/// Image generation and the bucket its output is uploaded to.
struct ImagePipeline {
    generator: Arc<dyn ImageGenerator>,
    objects: Arc<dyn ObjectStore>,
    bucket: String,
}

/// Graph service.
pub struct GraphService {
    graph: Arc<dyn GraphStore>,
    embedder: Arc<dyn Embedder>,
    images: Option<ImagePipeline>,
    config: GraphConfig,
}

impl GraphService {
    /// Creates a graph service without image generation.
    #[must_use]
    pub fn new(graph: Arc<dyn GraphStore>, embedder: Arc<dyn Embedder>, config: GraphConfig) -> Self {
        Self {
            graph,
            embedder,
            images: None,
            config,
        }
    }

    /// Enables image generation for new nodes, uploading into `bucket`.
    #[must_use]
    pub fn with_images(
        mut self,
        generator: Arc<dyn ImageGenerator>,
        objects: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
    ) -> Self {
        self.images = Some(ImagePipeline {
            generator,
            objects,
            bucket: bucket.into(),
        });
        self
    }

    /// Returns whether new nodes get generated images.
    #[must_use]
    pub const fn generates_images(&self) -> bool {
        self.images.is_some()
    }

    /// Embeds arbitrary text with the configured embedder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for blank text, or the embedder's error.
    pub async fn embed(&self, text: &str) -> Result<Vec<f64>> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("text is required".to_string()));
        }
        self.embedder.embed(text).await
    }

    /// Matches nodes by labels and string properties and expands their
    /// outgoing relationships.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for malformed filters or depth.
    #[instrument(skip(self, query))]
    pub async fn get_nodes(&self, query: NodeQuery) -> Result<Vec<Record>> {
        let labels = query.labels.as_deref().map(split_labels).unwrap_or_default();
        let properties = match query.properties.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_property_filters(raw)?,
            _ => Map::new(),
        };
        let depth = self.resolve_depth(query.depth)?;

        let cypher = queries::nodes_with_relationships(&labels, &properties, depth)?;
        let mut records = self.graph.execute(cypher).await?;
        redact_records(&mut records);
        Ok(records)
    }

    /// Finds the node nearest to a search term and expands it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a missing term or bad depth.
    #[instrument(skip(self, query))]
    pub async fn nodes_by_search_term(&self, query: SearchTermQuery) -> Result<Vec<Record>> {
        let term = query
            .search_term
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::InvalidInput("searchTerm is required".to_string()))?;
        let depth = self.resolve_depth(query.depth)?;

        let embedding = self.embedder.embed(term).await?;
        let mut records = self
            .graph
            .execute(queries::nearest_with_relationships(
                &self.config.vector_index,
                &embedding,
                depth,
            ))
            .await?;
        redact_records(&mut records);
        Ok(records)
    }

    /// Creates a node after rejecting near-duplicates.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if labels, properties or `name` are missing
    /// - [`Error::SimilarNodeExists`] if an existing node scores above the
    ///   configured threshold
    /// - [`Error::OperationFailed`] if embedding, imaging, upload or the
    ///   database fail
    #[instrument(skip(self, request), fields(labels = ?request.labels))]
    pub async fn create_node(&self, request: CreateNodeRequest) -> Result<Vec<Record>> {
        let CreateNodeRequest {
            labels,
            mut properties,
        } = request;
        if labels.is_empty() || properties.is_empty() {
            return Err(Error::InvalidInput(
                "labels and properties are required".to_string(),
            ));
        }

        let name = properties
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(ToString::to_string)
            .ok_or_else(|| Error::InvalidInput("properties.name is required".to_string()))?;
        let description = properties
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let subject = node_embedding_text(&name, &description);
        let embedding = self.embedder.embed(&subject).await?;

        let nearest = self
            .graph
            .execute(queries::similar_to_embedding(
                &self.config.vector_index,
                &embedding,
                1,
            ))
            .await?;
        if let Some(score) = nearest.first().and_then(|row| row.get_f64("score"))
            && score > self.config.similarity_threshold
        {
            tracing::info!(score, "Rejected node similar to an existing one");
            metrics::counter!("atlas_similar_node_rejections_total").increment(1);
            return Err(Error::SimilarNodeExists { score });
        }

        if let Some(images) = &self.images {
            let key = upload_node_image(images, &name, &subject).await?;
            properties.insert(IMAGE_PROPERTY.to_string(), Value::String(key));
        }

        properties.insert(EMBEDDING_PROPERTY.to_string(), Value::from(embedding));
        let cypher = queries::create_node(&labels, flatten_properties(properties))?;
        let records = self.graph.execute(cypher).await?;

        metrics::counter!("atlas_nodes_created_total").increment(1);
        Ok(records)
    }

    /// Adds labels to and merges properties into an existing node.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the target or both updates are missing
    /// - [`Error::NotFound`] if no node has the target id
    #[instrument(skip(self, request), fields(target_id = %request.target_id))]
    pub async fn update_node(&self, request: UpdateNodeRequest) -> Result<Vec<Record>> {
        let target_id = require_id(&request.target_id, "targetId")?;
        let labels = request.labels.unwrap_or_default();
        let properties = request.properties.filter(|p| !p.is_empty());
        if labels.is_empty() && properties.is_none() {
            return Err(Error::InvalidInput(
                "labels or properties must be provided".to_string(),
            ));
        }

        let cypher = queries::update_node(target_id, &labels, properties.map(flatten_properties))?;
        let mut records = non_empty(self.graph.execute(cypher).await?, "node")?;
        redact_records(&mut records);
        Ok(records)
    }

    /// Creates a relationship between two existing nodes.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if an id or the type is missing
    /// - [`Error::NotFound`] if either endpoint does not exist
    #[instrument(skip(self, request), fields(rel_type = %request.rel_type))]
    pub async fn create_relationship(
        &self,
        request: CreateRelationshipRequest,
    ) -> Result<Vec<Record>> {
        let source_id = require_id(&request.source_id, "sourceId")?;
        let target_id = require_id(&request.target_id, "targetId")?;
        let rel_type = require_id(&request.rel_type, "type")?;

        let cypher = queries::create_relationship(
            source_id,
            target_id,
            rel_type,
            flatten_properties(request.properties.unwrap_or_default()),
        )?;
        non_empty(self.graph.execute(cypher).await?, "source or target node")
    }

    /// Changes a relationship's type or replaces its properties.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the target or both updates are missing
    /// - [`Error::NotFound`] if no relationship has the target id
    #[instrument(skip(self, request), fields(target_id = %request.target_id))]
    pub async fn update_relationship(
        &self,
        request: UpdateRelationshipRequest,
    ) -> Result<Vec<Record>> {
        let target_id = require_id(&request.target_id, "targetId")?;
        let rel_type = request
            .rel_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        let properties = request.properties.map(flatten_properties);

        let cypher = match (rel_type, properties) {
            (Some(rel_type), properties) => {
                queries::retype_relationship(target_id, rel_type, properties)?
            },
            (None, Some(properties)) => {
                queries::replace_relationship_properties(target_id, properties)
            },
            (None, None) => {
                return Err(Error::InvalidInput(
                    "type or properties must be provided".to_string(),
                ));
            },
        };
        non_empty(self.graph.execute(cypher).await?, "relationship")
    }

    /// Deletes a relationship by element id.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if the id is missing
    /// - [`Error::NotFound`] if nothing was deleted
    #[instrument(skip(self, request), fields(relationship_id = %request.relationship_id))]
    pub async fn delete_relationship(
        &self,
        request: DeleteRelationshipRequest,
    ) -> Result<DeleteRelationshipResponse> {
        let relationship_id = require_id(&request.relationship_id, "relationshipId")?;
        let rows = self
            .graph
            .execute(queries::delete_relationship(relationship_id))
            .await?;

        let deleted = rows
            .first()
            .and_then(|row| row.get_i64("deleted"))
            .unwrap_or(0);
        if deleted == 0 {
            return Err(Error::NotFound("relationship not found".to_string()));
        }
        Ok(DeleteRelationshipResponse { deleted })
    }

    /// Finds nodes similar to an existing node or a raw embedding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] unless exactly one reference is given
    /// and the limit is within range.
    #[instrument(skip(self, request))]
    pub async fn similar_nodes(&self, request: SimilarNodesRequest) -> Result<Vec<SimilarNode>> {
        let limit = request.limit.unwrap_or(DEFAULT_SIMILAR_LIMIT);
        if !(1..=MAX_SIMILAR_LIMIT).contains(&limit) {
            return Err(Error::InvalidInput(format!(
                "limit must be between 1 and {MAX_SIMILAR_LIMIT}"
            )));
        }

        let node_id = request
            .node_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let cypher = match (node_id, request.embedding.as_deref()) {
            (Some(node_id), None) => {
                queries::similar_to_node(&self.config.vector_index, node_id, limit)
            },
            (None, Some(embedding)) if !embedding.is_empty() => {
                queries::similar_to_embedding(&self.config.vector_index, embedding, limit)
            },
            _ => return Err(Error::InvalidInput(SIMILAR_REFERENCE_REQUIRED.to_string())),
        };

        let rows = self.graph.execute(cypher).await?;
        let mut hits: Vec<SimilarNode> = rows.iter().filter_map(similar_node_from_row).collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(hits)
    }

    /// Case-insensitive text search over names and descriptions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the query text is missing.
    #[instrument(skip(self, request))]
    pub async fn search_nodes(&self, request: SearchNodesQuery) -> Result<SearchNodesResponse> {
        let text = request
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| Error::InvalidInput("query is required".to_string()))?;

        let mut labels = request.labels.as_deref().map(split_labels).unwrap_or_default();
        if labels.is_empty() {
            labels = DEFAULT_SEARCH_LABELS.iter().map(ToString::to_string).collect();
        }
        let limit = request
            .limit
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT);

        let rows = self
            .graph
            .execute(queries::search_nodes(text, &labels, limit))
            .await?;
        let nodes = rows
            .into_iter()
            .filter_map(|mut row| row.get_mut("node").map(Value::take))
            .map(|mut node| {
                redact_node(&mut node);
                node
            })
            .collect();
        Ok(SearchNodesResponse { nodes })
    }

    fn resolve_depth(&self, depth: Option<u32>) -> Result<u32> {
        let depth = depth.unwrap_or(DEFAULT_DEPTH);
        if (1..=self.config.max_depth).contains(&depth) {
            Ok(depth)
        } else {
            Err(Error::InvalidInput(format!(
                "depth must be between 1 and {}",
                self.config.max_depth
            )))
        }
    }
}

/// Generates an illustration for a new node and uploads it, returning the
/// object key.
async fn upload_node_image(images: &ImagePipeline, name: &str, subject: &str) -> Result<String> {
    let bytes = images.generator.generate(&node_image_prompt(subject)).await?;
    let key = format!(
        "{name}_{}.png",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S")
    );
    let content_type = sniff_content_type(&bytes);

    images
        .objects
        .put(&images.bucket, &key, bytes, content_type)
        .await?;
    tracing::debug!(bucket = %images.bucket, key = %key, "Uploaded node image");
    Ok(key)
}

/// Parses the `properties` query parameter: a JSON object of strings.
fn parse_property_filters(raw: &str) -> Result<Map<String, Value>> {
    let parsed: Value = serde_json::from_str(raw)
        .map_err(|e| Error::InvalidInput(format!("properties is not valid JSON: {e}")))?;

    let Value::Object(map) = parsed else {
        return Err(Error::InvalidInput(
            "properties must be a JSON object".to_string(),
        ));
    };
    if let Some((key, _)) = map.iter().find(|(_, value)| !value.is_string()) {
        return Err(Error::InvalidInput(format!(
            "property '{key}' must be a string"
        )));
    }
    Ok(map)
}

/// Replaces object values, and arrays containing objects, with their JSON
/// text. Graph properties hold only scalars and homogeneous lists.
fn flatten_properties(properties: Map<String, Value>) -> Map<String, Value> {
    properties
        .into_iter()
        .map(|(key, value)| {
            let flattened = match value {
                Value::Object(_) => Value::String(value.to_string()),
                Value::Array(ref items) if items.iter().any(Value::is_object) => {
                    Value::String(value.to_string())
                },
                other => other,
            };
            (key, flattened)
        })
        .collect()
}

/// Removes hidden properties from the `node` and `affiliatedNodes` columns
/// of expansion rows.
pub(crate) fn redact_records(records: &mut [Record]) {
    for record in records {
        if let Some(node) = record.get_mut("node") {
            redact_node(node);
        }
        if let Some(Value::Array(affiliates)) = record.get_mut("affiliatedNodes") {
            affiliates.iter_mut().for_each(redact_node);
        }
    }
}

/// Strips hidden keys from a node's properties, under either the `Props`
/// key of a node projection or the `props` key of a search result.
fn redact_node(node: &mut Value) {
    for field in ["Props", "props"] {
        if let Some(Value::Object(props)) = node.get_mut(field) {
            for key in HIDDEN_PROPERTIES {
                props.remove(key);
            }
        }
    }
}

fn require_id<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::InvalidInput(format!("{field} is required")));
    }
    Ok(value)
}

fn non_empty(records: Vec<Record>, what: &str) -> Result<Vec<Record>> {
    if records.is_empty() {
        return Err(Error::NotFound(format!("{what} not found")));
    }
    Ok(records)
}

fn similar_node_from_row(row: &Record) -> Option<SimilarNode> {
    Some(SimilarNode {
        name: row.get_str("name").map(ToString::to_string),
        description: row.get_str("description").map(ToString::to_string),
        id: row.get_str("id")?.to_string(),
        score: row.get_f64("score")?,
    })
}
