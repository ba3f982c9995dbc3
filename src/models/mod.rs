//! Data models for requests, responses and query results.

mod account;
mod domain;
mod graph;
mod record;

pub use account::{
    EmbeddingRequest, EmbeddingResponse, LoginRequest, ObjectLocation, SignUpRequest,
    TokenResponse,
};
pub use domain::{
    CreateDomainRequest, CreatedNode, DomainInfo, DomainLevel, DomainNameAvailability,
    DomainNameQuery, DomainRef, DomainWriteResponse, KnowledgeRequirement, LevelRequirements,
    MilestoneRequirement, NewNodeData, RequirementEntry, RequirementKind, SkillRequirement,
    TraitRequirement, UpdateDomainRequest,
};
pub use graph::{
    CreateNodeRequest, CreateRelationshipRequest, DeleteRelationshipRequest,
    DeleteRelationshipResponse, NodeQuery, SearchNodesQuery, SearchNodesResponse,
    SearchTermQuery, SimilarNode, SimilarNodesRequest, UpdateNodeRequest,
    UpdateRelationshipRequest,
};
pub use record::Record;
