//! Cypher statements for graph operations.
//!
//! Each builder returns a complete [`CypherQuery`] with its parameters and
//! result columns. Identifiers are escaped with
//! [`escape_identifier`](crate::storage::graph::escape_identifier); values are
//! always bound as parameters.

use crate::Result;
use crate::models::{DomainLevel, NewNodeData, RequirementEntry, RequirementKind};
use crate::storage::graph::{CypherQuery, escape_identifier, label_expression};
use serde_json::{Map, Value};

/// Columns returned by expansion queries.
pub const EXPANSION_COLUMNS: [&str; 3] = ["node", "relationships", "affiliatedNodes"];

/// Property key that filters on the database element id.
const ELEMENT_ID_KEY: &str = "elementId";

/// Map projection for a node bound to `var`.
fn node_projection(var: &str) -> String {
    format!(
        "{{Id: id({var}), ElementId: elementId({var}), Labels: labels({var}), Props: properties({var})}}"
    )
}

/// Map projection for a relationship bound to `var`.
fn relationship_projection(var: &str) -> String {
    format!(
        "{{Id: id({var}), ElementId: elementId({var}), \
         StartId: id(startNode({var})), StartElementId: elementId(startNode({var})), \
         EndId: id(endNode({var})), EndElementId: elementId(endNode({var})), \
         Type: type({var}), Props: properties({var})}}"
    )
}

/// Expands `node` along outgoing paths up to `depth` hops and projects the
/// node, the distinct relationships and the distinct reachable nodes.
#[must_use]
pub fn expansion_fragment(depth: u32) -> String {
    format!(
        "OPTIONAL MATCH (node)-[r*1..{depth}]->(m)\n\
         UNWIND coalesce(r, [null]) AS rel\n\
         WITH node, collect(DISTINCT rel) AS rels, collect(DISTINCT m) AS affiliates\n\
         RETURN {node} AS node,\n\
         [rel IN rels | {rel}] AS relationships,\n\
         [a IN affiliates | {affiliate}] AS affiliatedNodes",
        node = node_projection("node"),
        rel = relationship_projection("rel"),
        affiliate = node_projection("a"),
    )
}

/// `get-nodes`: match by labels and string property filters, then expand.
///
/// # Errors
///
/// Returns an error if a label or property key is not a valid identifier.
pub fn nodes_with_relationships(
    labels: &[String],
    properties: &Map<String, Value>,
    depth: u32,
) -> Result<CypherQuery> {
    let mut query = CypherQuery::new("");
    let mut conditions = Vec::with_capacity(properties.len());

    for (idx, (key, value)) in properties.iter().enumerate() {
        let param = format!("prop_{idx}");
        let key = key.trim();
        if key == ELEMENT_ID_KEY {
            conditions.push(format!("elementId(node) = ${param}"));
        } else {
            conditions.push(format!("node.{} = ${param}", escape_identifier(key)?));
        }
        query = query.param(param, value.clone());
    }

    let mut text = format!("MATCH (node{})\n", label_expression(labels)?);
    if !conditions.is_empty() {
        text.push_str("WHERE ");
        text.push_str(&conditions.join(" AND "));
        text.push('\n');
    }
    text.push_str(&expansion_fragment(depth));

    query.text = text;
    Ok(query.returns(EXPANSION_COLUMNS))
}

/// `get-node-with-relationships-by-search-term`: best vector match, expanded.
#[must_use]
pub fn nearest_with_relationships(index: &str, embedding: &[f64], depth: u32) -> CypherQuery {
    CypherQuery::new(format!(
        "CALL db.index.vector.queryNodes($index, 1, $embedding)\n\
         YIELD node, score\n\
         {}",
        expansion_fragment(depth)
    ))
    .param("index", index)
    .param("embedding", embedding.to_vec())
    .returns(EXPANSION_COLUMNS)
}

/// Columns returned by similarity queries.
pub const SIMILARITY_COLUMNS: [&str; 4] = ["name", "description", "id", "score"];

/// Similar nodes to an existing node, excluding the node itself.
#[must_use]
pub fn similar_to_node(index: &str, node_id: &str, limit: u32) -> CypherQuery {
    CypherQuery::new(
        "MATCH (n)\n\
         WHERE elementId(n) = $nodeId\n\
         CALL db.index.vector.queryNodes($index, $candidates, n.embedding)\n\
         YIELD node, score\n\
         WHERE elementId(node) <> $nodeId\n\
         RETURN node.name AS name, node.description AS description, elementId(node) AS id, score\n\
         ORDER BY score DESC\n\
         LIMIT $limit",
    )
    .param("index", index)
    .param("nodeId", node_id)
    // One extra candidate so the reference node can be dropped.
    .param("candidates", limit.saturating_add(1))
    .param("limit", limit)
    .returns(SIMILARITY_COLUMNS)
}

/// Similar nodes to a raw embedding.
#[must_use]
pub fn similar_to_embedding(index: &str, embedding: &[f64], limit: u32) -> CypherQuery {
    CypherQuery::new(
        "CALL db.index.vector.queryNodes($index, $limit, $embedding)\n\
         YIELD node, score\n\
         RETURN node.name AS name, node.description AS description, elementId(node) AS id, score\n\
         ORDER BY score DESC",
    )
    .param("index", index)
    .param("embedding", embedding.to_vec())
    .param("limit", limit)
    .returns(SIMILARITY_COLUMNS)
}

/// `create-node`.
///
/// # Errors
///
/// Returns an error if a label is not a valid identifier.
pub fn create_node(labels: &[String], properties: Map<String, Value>) -> Result<CypherQuery> {
    Ok(CypherQuery::new(format!(
        "CREATE (n{})\n\
         SET n = $properties\n\
         RETURN {} AS node",
        label_expression(labels)?,
        node_projection("n"),
    ))
    .param("properties", Value::Object(properties))
    .returns(["node"]))
}

/// `update-node`: add labels and merge properties.
///
/// # Errors
///
/// Returns an error if a label is not a valid identifier.
pub fn update_node(
    target_id: &str,
    labels: &[String],
    properties: Option<Map<String, Value>>,
) -> Result<CypherQuery> {
    let mut text = String::from("MATCH (n)\nWHERE elementId(n) = $targetId\n");
    if !labels.is_empty() {
        text.push_str(&format!("SET n{}\n", label_expression(labels)?));
    }

    let mut query = CypherQuery::new("").param("targetId", target_id);
    if let Some(properties) = properties {
        text.push_str("SET n += $properties\n");
        query = query.param("properties", Value::Object(properties));
    }
    text.push_str(&format!("RETURN {} AS node", node_projection("n")));

    query.text = text;
    Ok(query.returns(["node"]))
}

/// `create-relationship`.
///
/// # Errors
///
/// Returns an error if the type is not a valid identifier.
pub fn create_relationship(
    source_id: &str,
    target_id: &str,
    rel_type: &str,
    properties: Map<String, Value>,
) -> Result<CypherQuery> {
    Ok(CypherQuery::new(format!(
        "MATCH (a)\n\
         WHERE elementId(a) = $sourceId\n\
         MATCH (b)\n\
         WHERE elementId(b) = $targetId\n\
         CREATE (a)-[r:{} $properties]->(b)\n\
         RETURN {} AS relationship",
        escape_identifier(rel_type)?,
        relationship_projection("r"),
    ))
    .param("sourceId", source_id)
    .param("targetId", target_id)
    .param("properties", Value::Object(properties))
    .returns(["relationship"]))
}

/// `update-relationship` with a new type: recreate between the same
/// endpoints and delete the original.
///
/// # Errors
///
/// Returns an error if the type is not a valid identifier.
pub fn retype_relationship(
    target_id: &str,
    rel_type: &str,
    properties: Option<Map<String, Value>>,
) -> Result<CypherQuery> {
    Ok(CypherQuery::new(format!(
        "MATCH (a)-[r]->(b)\n\
         WHERE elementId(r) = $targetId\n\
         CREATE (a)-[nr:{}]->(b)\n\
         SET nr = coalesce($properties, properties(r))\n\
         DELETE r\n\
         RETURN {} AS relationship",
        escape_identifier(rel_type)?,
        relationship_projection("nr"),
    ))
    .param("targetId", target_id)
    .param("properties", properties.map_or(Value::Null, Value::Object))
    .returns(["relationship"]))
}

/// `update-relationship` without a type: replace the properties.
#[must_use]
pub fn replace_relationship_properties(
    target_id: &str,
    properties: Map<String, Value>,
) -> CypherQuery {
    CypherQuery::new(format!(
        "MATCH ()-[r]->()\n\
         WHERE elementId(r) = $targetId\n\
         SET r = $properties\n\
         RETURN {} AS relationship",
        relationship_projection("r"),
    ))
    .param("targetId", target_id)
    .param("properties", Value::Object(properties))
    .returns(["relationship"])
}

/// `delete-relationship`.
#[must_use]
pub fn delete_relationship(relationship_id: &str) -> CypherQuery {
    CypherQuery::new(
        "MATCH ()-[r]->()\n\
         WHERE elementId(r) = $relationshipId\n\
         DELETE r\n\
         RETURN count(*) AS deleted",
    )
    .param("relationshipId", relationship_id)
    .returns(["deleted"])
}

/// `search-nodes`: case-insensitive substring match on the node name.
#[must_use]
pub fn search_nodes(text: &str, labels: &[String], limit: u32) -> CypherQuery {
    CypherQuery::new(
        "MATCH (n)\n\
         WHERE any(label IN labels(n) WHERE label IN $labels)\n\
         AND toLower(n.name) CONTAINS toLower($query)\n\
         RETURN {elementId: elementId(n), labels: labels(n), props: properties(n)} AS node\n\
         ORDER BY n.name\n\
         LIMIT $limit",
    )
    .param("query", text)
    .param("labels", labels.to_vec())
    .param("limit", limit)
    .returns(["node"])
}

/// `domain`: a domain with its levels in order and each level's
/// requirements, as one `result` map.
#[must_use]
pub fn domain_by_name(name: &str) -> CypherQuery {
    CypherQuery::new(
        "MATCH (domain:Domain {name: $name})\n\
         OPTIONAL MATCH (domain)-[:HAS_DOMAIN_LEVEL]->(level:Domain_Level)\n\
         OPTIONAL MATCH (level)-[kr:REQUIRES_KNOWLEDGE]->(k:Knowledge)\n\
         OPTIONAL MATCH (level)-[sr:REQUIRES_SKILL]->(s:Skill)\n\
         OPTIONAL MATCH (level)-[tr:REQUIRES_TRAIT]->(t:Trait)\n\
         OPTIONAL MATCH (level)-[:REQUIRES_MILESTONE]->(m:Milestone)\n\
         OPTIONAL MATCH (s)-[:GENERALIZES_TO]->(gs:Skill)\n\
         OPTIONAL MATCH (k)-[:GENERALIZES_TO]->(gk:Knowledge)\n\
         WITH domain, level,\n\
         collect(DISTINCT CASE WHEN k IS NOT NULL THEN {elementId: elementId(k), type: 'knowledge', \
         name: k.name, description: k.description, howToLearn: k.how_to_learn, bloomLevel: kr.bloom_level, \
         generalizesTo: CASE WHEN gk IS NOT NULL THEN {elementId: elementId(gk), name: gk.name} END} END) AS knowledge,\n\
         collect(DISTINCT CASE WHEN s IS NOT NULL THEN {elementId: elementId(s), type: 'skill', \
         name: s.name, description: s.description, howToDevelop: s.how_to_develop, dreyfusLevel: sr.dreyfus_level, \
         generalizesTo: CASE WHEN gs IS NOT NULL THEN {elementId: elementId(gs), name: gs.name} END} END) AS skills,\n\
         collect(DISTINCT CASE WHEN t IS NOT NULL THEN {elementId: elementId(t), type: 'trait', \
         name: t.name, description: t.description, measurementCriteria: t.measurement_criteria, \
         minScore: tr.min_score} END) AS traits,\n\
         collect(DISTINCT CASE WHEN m IS NOT NULL THEN {elementId: elementId(m), type: 'milestone', \
         name: m.name, description: m.description, howToAchieve: m.how_to_achieve} END) AS milestones\n\
         ORDER BY level.level\n\
         WITH domain, collect(CASE WHEN level IS NOT NULL THEN {elementId: elementId(level), \
         level: level.level, name: level.name, description: level.description, \
         pointsRequired: level.total_points_required, knowledge: knowledge, skills: skills, \
         traits: traits, milestones: milestones} END) AS levels\n\
         RETURN {elementId: elementId(domain), name: domain.name, \
         description: domain.description, levels: levels} AS result",
    )
    .param("name", name)
    .returns(["result"])
}

/// Element id of the domain named `name`, if any.
#[must_use]
pub fn domain_id_by_name(name: &str) -> CypherQuery {
    CypherQuery::new(
        "MATCH (d:Domain {name: $name})\n\
         RETURN elementId(d) AS elementId\n\
         LIMIT 1",
    )
    .param("name", name)
    .returns(["elementId"])
}

/// Name of the domain with element id `domain_id`, if any.
#[must_use]
pub fn domain_name_by_id(domain_id: &str) -> CypherQuery {
    CypherQuery::new(
        "MATCH (d:Domain)\n\
         WHERE elementId(d) = $domainId\n\
         RETURN d.name AS name",
    )
    .param("domainId", domain_id)
    .returns(["name"])
}

/// `create-domain`: the `Domain` node.
#[must_use]
pub fn create_domain(name: &str, description: &str) -> CypherQuery {
    CypherQuery::new(
        "CREATE (d:Domain {name: $name, description: $description})\n\
         RETURN elementId(d) AS elementId",
    )
    .param("name", name)
    .param("description", description)
    .returns(["elementId"])
}

/// `update-domain`: rename and describe.
#[must_use]
pub fn update_domain(domain_id: &str, name: &str, description: &str) -> CypherQuery {
    CypherQuery::new(
        "MATCH (d:Domain)\n\
         WHERE elementId(d) = $domainId\n\
         SET d.name = $name, d.description = $description\n\
         RETURN elementId(d) AS elementId",
    )
    .param("domainId", domain_id)
    .param("name", name)
    .param("description", description)
    .returns(["elementId"])
}

/// Detaches and deletes every level of a domain.
#[must_use]
pub fn delete_domain_levels(domain_id: &str) -> CypherQuery {
    CypherQuery::new(
        "MATCH (d:Domain)-[:HAS_DOMAIN_LEVEL]->(l:Domain_Level)\n\
         WHERE elementId(d) = $domainId\n\
         DETACH DELETE l\n\
         RETURN count(*) AS deleted",
    )
    .param("domainId", domain_id)
    .returns(["deleted"])
}

/// Deletes user progress relationships into the given nodes.
#[must_use]
pub fn delete_user_progress(node_ids: &[String]) -> CypherQuery {
    CypherQuery::new(
        "UNWIND $nodeIds AS nodeId\n\
         MATCH (u:User)-[r:HAS_KNOWLEDGE|HAS_SKILL|HAS_TRAIT|ACHIEVED]->(n)\n\
         WHERE elementId(n) = nodeId\n\
         DELETE r\n\
         RETURN count(r) AS deletedCount",
    )
    .param("nodeIds", node_ids.to_vec())
    .returns(["deletedCount"])
}

/// Creates a `Domain_Level` under a domain.
#[must_use]
pub fn create_domain_level(domain_id: &str, level: &DomainLevel) -> CypherQuery {
    CypherQuery::new(
        "MATCH (d:Domain)\n\
         WHERE elementId(d) = $domainId\n\
         CREATE (l:Domain_Level {level: $level, name: $name, description: $description, \
         total_points_required: $points})\n\
         CREATE (d)-[:HAS_DOMAIN_LEVEL]->(l)\n\
         RETURN elementId(l) AS elementId",
    )
    .param("domainId", domain_id)
    .param("level", level.level)
    .param("name", level.name.as_str())
    .param("description", level.description.as_deref().unwrap_or_default())
    .param("points", level.points_required)
    .returns(["elementId"])
}

/// Merges a requirement node by label and name. Description and guidance
/// are only set when the node is new.
#[must_use]
pub fn merge_requirement_node(kind: RequirementKind, node: &NewNodeData) -> CypherQuery {
    let mut set = String::from("n.description = $description");
    let guidance = node.guidance(kind);
    if guidance.is_some() {
        set.push_str(&format!(", n.{} = $guidance", kind.guidance_property()));
    }

    let query = CypherQuery::new(format!(
        "MERGE (n:{} {{name: $name}})\n\
         ON CREATE SET {set}\n\
         RETURN elementId(n) AS elementId",
        kind.label(),
    ))
    .param("name", node.name.trim())
    .param("description", node.description.as_str())
    .returns(["elementId"]);

    match guidance {
        Some(text) => query.param("guidance", text),
        None => query,
    }
}

/// Links a level to a required node, storing the grade on the
/// relationship.
#[must_use]
pub fn link_requirement(level_id: &str, node_id: &str, entry: &RequirementEntry<'_>) -> CypherQuery {
    let (grade, value) = match &entry.grade {
        Some((key, value)) => (format!(" {{{key}: $grade}}"), value.clone()),
        None => (String::new(), Value::Null),
    };

    let query = CypherQuery::new(format!(
        "MATCH (l:Domain_Level), (n:{})\n\
         WHERE elementId(l) = $levelId AND elementId(n) = $nodeId\n\
         CREATE (l)-[r:{}{grade}]->(n)\n\
         RETURN count(r) AS linked",
        entry.kind.label(),
        entry.kind.relationship(),
    ))
    .param("levelId", level_id)
    .param("nodeId", node_id)
    .returns(["linked"]);

    if entry.grade.is_some() {
        query.param("grade", value)
    } else {
        query
    }
}

/// User profile: the Person and its direct outgoing neighbourhood.
#[must_use]
pub fn person_profile(username: &str) -> CypherQuery {
    CypherQuery::new(format!(
        "MATCH (node:Person)\n\
         WHERE node.username = $username\n\
         {}",
        expansion_fragment(1)
    ))
    .param("username", username)
    .returns(EXPANSION_COLUMNS)
}
