//! Secure graph routes.

use crate::http::error::ApiResult;
use crate::http::extract::{ApiJson, ApiQuery};
use crate::http::state::AppState;
use crate::models::{
    CreateDomainRequest, CreateNodeRequest, CreateRelationshipRequest, DeleteRelationshipRequest,
    DeleteRelationshipResponse, DomainNameAvailability, DomainNameQuery, DomainWriteResponse,
    NodeQuery, Record, SearchNodesQuery, SearchNodesResponse,
    SearchTermQuery, SimilarNode, SimilarNodesRequest, UpdateDomainRequest, UpdateNodeRequest,
    UpdateRelationshipRequest,
};
use crate::security::Claims;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::Value;

/// `GET get-nodes`
pub async fn get_nodes(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NodeQuery>,
) -> ApiResult<Json<Vec<Record>>> {
    Ok(Json(state.graph.get_nodes(query).await?))
}

/// `GET get-node-with-relationships-by-search-term`
pub async fn node_by_search_term(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchTermQuery>,
) -> ApiResult<Json<Vec<Record>>> {
    Ok(Json(state.graph.nodes_by_search_term(query).await?))
}

/// `POST create-node`
pub async fn create_node(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(request): ApiJson<CreateNodeRequest>,
) -> ApiResult<(StatusCode, Json<Vec<Record>>)> {
    let records = state.graph.create_node(request).await?;
    tracing::info!(user = %claims.sub, "Node created");
    Ok((StatusCode::CREATED, Json(records)))
}

/// `PUT update-node`
pub async fn update_node(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateNodeRequest>,
) -> ApiResult<Json<Vec<Record>>> {
    Ok(Json(state.graph.update_node(request).await?))
}

/// `POST create-relationship`
pub async fn create_relationship(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(request): ApiJson<CreateRelationshipRequest>,
) -> ApiResult<(StatusCode, Json<Vec<Record>>)> {
    let records = state.graph.create_relationship(request).await?;
    tracing::info!(user = %claims.sub, "Relationship created");
    Ok((StatusCode::CREATED, Json(records)))
}

/// `PUT update-relationship`
pub async fn update_relationship(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateRelationshipRequest>,
) -> ApiResult<Json<Vec<Record>>> {
    Ok(Json(state.graph.update_relationship(request).await?))
}

/// `POST delete-relationship`
pub async fn delete_relationship(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(request): ApiJson<DeleteRelationshipRequest>,
) -> ApiResult<Json<DeleteRelationshipResponse>> {
    let response = state.graph.delete_relationship(request).await?;
    tracing::info!(user = %claims.sub, "Relationship deleted");
    Ok(Json(response))
}

/// `POST similar-nodes`
pub async fn similar_nodes(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SimilarNodesRequest>,
) -> ApiResult<Json<Vec<SimilarNode>>> {
    Ok(Json(state.graph.similar_nodes(request).await?))
}

/// `GET search-nodes`
pub async fn search_nodes(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchNodesQuery>,
) -> ApiResult<Json<SearchNodesResponse>> {
    Ok(Json(state.graph.search_nodes(query).await?))
}

/// `GET domain`
pub async fn get_domain(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DomainNameQuery>,
) -> ApiResult<Json<Value>> {
    let name = query.name.unwrap_or_default();
    Ok(Json(state.graph.get_domain(&name).await?))
}

/// `GET validate-domain-name`
pub async fn validate_domain_name(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<DomainNameQuery>,
) -> ApiResult<Json<DomainNameAvailability>> {
    let name = query.name.unwrap_or_default();
    Ok(Json(state.graph.validate_domain_name(&name).await?))
}

/// `POST create-domain`
pub async fn create_domain(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateDomainRequest>,
) -> ApiResult<Json<DomainWriteResponse>> {
    Ok(Json(state.graph.create_domain(request).await?))
}

/// `PUT update-domain`
pub async fn update_domain(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<UpdateDomainRequest>,
) -> ApiResult<Json<DomainWriteResponse>> {
    Ok(Json(state.graph.update_domain(request).await?))
}
