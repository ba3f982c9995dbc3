//! Object storage and embedding helpers.

use crate::http::error::{ApiError, ApiResult};
use crate::http::extract::{ApiJson, ApiQuery};
use crate::http::state::AppState;
use crate::models::{EmbeddingRequest, EmbeddingResponse, ObjectLocation};
use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

/// Multipart field holding the upload.
const FILE_FIELD: &str = "file";

/// Cache policy for served objects.
const OBJECT_CACHE_CONTROL: &str = "public, max-age=3600";

/// `GET s3-object`: streams a stored object back with its sniffed type.
pub async fn s3_object(
    State(state): State<AppState>,
    ApiQuery(location): ApiQuery<ObjectLocation>,
) -> ApiResult<Response> {
    let object = state
        .assets
        .get(location.bucket.as_deref(), location.key.as_deref())
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, object.content_type),
            (header::CACHE_CONTROL, OBJECT_CACHE_CONTROL.to_string()),
        ],
        object.bytes,
    )
        .into_response())
}

/// `POST s3-upload`: stores the multipart field `file`.
pub async fn s3_upload(
    State(state): State<AppState>,
    ApiQuery(location): ApiQuery<ObjectLocation>,
    mut multipart: Multipart,
) -> ApiResult<Json<&'static str>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(ToString::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;

        state
            .assets
            .put(
                location.bucket.as_deref(),
                location.key.as_deref(),
                bytes.to_vec(),
                content_type.as_deref(),
            )
            .await?;
        return Ok(Json("File uploaded successfully"));
    }

    Err(ApiError::bad_request("No file provided"))
}

/// `POST embedding`
pub async fn embedding(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EmbeddingRequest>,
) -> ApiResult<Json<EmbeddingResponse>> {
    let embedding = state.graph.embed(&request.text).await?;
    Ok(Json(EmbeddingResponse { embedding }))
}
