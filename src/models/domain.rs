//! Domain request and response types.
//!
//! A domain is a `Domain` node with ordered `Domain_Level` nodes, each
//! requiring Knowledge, Skill, Trait and Milestone nodes. Level and
//! requirement fields keep the snake_case names the domain editor sends;
//! node references use camelCase.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query parameters for `domain` and `validate-domain-name`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainNameQuery {
    /// Domain name.
    #[serde(default)]
    pub name: Option<String>,
}

/// The kind of node a level requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementKind {
    /// `Knowledge`, graded by Bloom level.
    Knowledge,
    /// `Skill`, graded by Dreyfus level.
    Skill,
    /// `Trait`, with a minimum score.
    Trait,
    /// `Milestone`, ungraded.
    Milestone,
}

impl RequirementKind {
    /// Node label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Knowledge => "Knowledge",
            Self::Skill => "Skill",
            Self::Trait => "Trait",
            Self::Milestone => "Milestone",
        }
    }

    /// Relationship type from the level to the required node.
    #[must_use]
    pub const fn relationship(self) -> &'static str {
        match self {
            Self::Knowledge => "REQUIRES_KNOWLEDGE",
            Self::Skill => "REQUIRES_SKILL",
            Self::Trait => "REQUIRES_TRAIT",
            Self::Milestone => "REQUIRES_MILESTONE",
        }
    }

    /// Property holding the kind-specific guidance text on new nodes.
    #[must_use]
    pub const fn guidance_property(self) -> &'static str {
        match self {
            Self::Knowledge => "how_to_learn",
            Self::Skill => "how_to_develop",
            Self::Trait => "measurement_criteria",
            Self::Milestone => "how_to_achieve",
        }
    }
}

/// A requirement node created alongside the domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNodeData {
    /// Node name; an existing node of the same label and name is reused.
    #[serde(default)]
    pub name: String,
    /// Node description.
    #[serde(default)]
    pub description: String,
    /// Knowledge guidance.
    #[serde(default)]
    pub how_to_learn: Option<String>,
    /// Skill guidance.
    #[serde(default)]
    pub how_to_develop: Option<String>,
    /// Trait guidance.
    #[serde(default)]
    pub measurement_criteria: Option<String>,
    /// Milestone guidance.
    #[serde(default)]
    pub how_to_achieve: Option<String>,
}

impl NewNodeData {
    /// Returns the guidance text that applies to `kind`.
    #[must_use]
    pub fn guidance(&self, kind: RequirementKind) -> Option<&str> {
        match kind {
            RequirementKind::Knowledge => self.how_to_learn.as_deref(),
            RequirementKind::Skill => self.how_to_develop.as_deref(),
            RequirementKind::Trait => self.measurement_criteria.as_deref(),
            RequirementKind::Milestone => self.how_to_achieve.as_deref(),
        }
    }
}

/// Required Knowledge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeRequirement {
    /// Existing node.
    #[serde(default, rename = "nodeElementId")]
    pub node_element_id: Option<String>,
    /// Node to create when no existing node is referenced.
    #[serde(default, rename = "newNode")]
    pub new_node: Option<NewNodeData>,
    /// Bloom taxonomy level.
    #[serde(default)]
    pub bloom_level: String,
}

/// Required Skill.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillRequirement {
    /// Existing node.
    #[serde(default, rename = "nodeElementId")]
    pub node_element_id: Option<String>,
    /// Node to create when no existing node is referenced.
    #[serde(default, rename = "newNode")]
    pub new_node: Option<NewNodeData>,
    /// Dreyfus model level.
    #[serde(default)]
    pub dreyfus_level: String,
}

/// Required Trait.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraitRequirement {
    /// Existing node.
    #[serde(default, rename = "nodeElementId")]
    pub node_element_id: Option<String>,
    /// Node to create when no existing node is referenced.
    #[serde(default, rename = "newNode")]
    pub new_node: Option<NewNodeData>,
    /// Minimum trait score.
    #[serde(default)]
    pub min_score: i64,
}

/// Required Milestone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MilestoneRequirement {
    /// Existing node.
    #[serde(default, rename = "nodeElementId")]
    pub node_element_id: Option<String>,
    /// Node to create when no existing node is referenced.
    #[serde(default, rename = "newNode")]
    pub new_node: Option<NewNodeData>,
}

/// One requirement regardless of kind.
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementEntry<'a> {
    /// Required node kind.
    pub kind: RequirementKind,
    /// Existing node.
    pub node_element_id: Option<&'a str>,
    /// Node to create.
    pub new_node: Option<&'a NewNodeData>,
    /// Property stored on the requirement relationship.
    pub grade: Option<(&'static str, Value)>,
}

impl RequirementEntry<'_> {
    /// Returns whether the entry names a node, either existing or new.
    #[must_use]
    pub fn is_resolvable(&self) -> bool {
        self.node_element_id.is_some_and(|id| !id.trim().is_empty())
            || self.new_node.is_some_and(|node| !node.name.trim().is_empty())
    }
}

/// Requirements of one level.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelRequirements {
    /// Knowledge requirements.
    #[serde(default)]
    pub knowledge: Vec<KnowledgeRequirement>,
    /// Skill requirements.
    #[serde(default)]
    pub skills: Vec<SkillRequirement>,
    /// Trait requirements.
    #[serde(default)]
    pub traits: Vec<TraitRequirement>,
    /// Milestone requirements.
    #[serde(default)]
    pub milestones: Vec<MilestoneRequirement>,
}

impl LevelRequirements {
    /// Returns every requirement in knowledge, skill, trait, milestone order.
    #[must_use]
    pub fn entries(&self) -> Vec<RequirementEntry<'_>> {
        let knowledge = self.knowledge.iter().map(|r| RequirementEntry {
            kind: RequirementKind::Knowledge,
            node_element_id: r.node_element_id.as_deref(),
            new_node: r.new_node.as_ref(),
            grade: Some(("bloom_level", Value::from(r.bloom_level.as_str()))),
        });
        let skills = self.skills.iter().map(|r| RequirementEntry {
            kind: RequirementKind::Skill,
            node_element_id: r.node_element_id.as_deref(),
            new_node: r.new_node.as_ref(),
            grade: Some(("dreyfus_level", Value::from(r.dreyfus_level.as_str()))),
        });
        let traits = self.traits.iter().map(|r| RequirementEntry {
            kind: RequirementKind::Trait,
            node_element_id: r.node_element_id.as_deref(),
            new_node: r.new_node.as_ref(),
            grade: Some(("min_score", Value::from(r.min_score))),
        });
        let milestones = self.milestones.iter().map(|r| RequirementEntry {
            kind: RequirementKind::Milestone,
            node_element_id: r.node_element_id.as_deref(),
            new_node: r.new_node.as_ref(),
            grade: None,
        });

        knowledge.chain(skills).chain(traits).chain(milestones).collect()
    }
}

/// One level of a domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainLevel {
    /// Ordinal, lowest first.
    #[serde(default)]
    pub level: i64,
    /// Level name.
    #[serde(default)]
    pub name: String,
    /// Level description.
    #[serde(default)]
    pub description: Option<String>,
    /// Points needed to reach the level.
    #[serde(default)]
    pub points_required: i64,
    /// Nodes the level requires.
    #[serde(default)]
    pub requirements: LevelRequirements,
}

/// Domain name and description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainInfo {
    /// Unique domain name.
    #[serde(default)]
    pub name: String,
    /// Domain description.
    #[serde(default)]
    pub description: String,
}

/// Body of `create-domain`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateDomainRequest {
    /// Domain properties.
    #[serde(default)]
    pub domain: DomainInfo,
    /// Levels in any order.
    #[serde(default)]
    pub levels: Vec<DomainLevel>,
}

/// Body of `update-domain`. Levels replace the existing ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDomainRequest {
    /// Domain to update.
    #[serde(default)]
    pub domain_element_id: String,
    /// New domain properties.
    #[serde(default)]
    pub domain: DomainInfo,
    /// Replacement levels.
    #[serde(default)]
    pub levels: Vec<DomainLevel>,
    /// Nodes dropped from the domain; user progress on them is deleted.
    #[serde(default)]
    pub removed_node_element_ids: Vec<String>,
}

/// A domain as identified in write responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRef {
    /// Domain element id.
    pub element_id: String,
    /// Domain name.
    pub name: String,
}

/// A requirement node created by a domain write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedNode {
    /// Node element id.
    pub element_id: String,
    /// Node name.
    pub name: String,
    /// Node labels.
    pub labels: Vec<String>,
}

/// Response of `create-domain` and `update-domain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainWriteResponse {
    /// Always `true`; failures are error responses.
    pub success: bool,
    /// The written domain.
    pub domain: DomainRef,
    /// Requirement nodes created or merged by name.
    pub created_nodes: Vec<CreatedNode>,
    /// User progress relationships deleted (update only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_user_progress_count: Option<i64>,
}

/// Response of `validate-domain-name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainNameAvailability {
    /// Whether no domain has the name.
    pub available: bool,
    /// The domain holding the name, when taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_domain_element_id: Option<String>,
}
