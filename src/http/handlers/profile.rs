//! User profile route.

use crate::http::error::ApiResult;
use crate::http::state::AppState;
use crate::models::Record;
use axum::Json;
use axum::extract::{Path, State};

/// `GET user-profile/{username}`
pub async fn user_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> ApiResult<Json<Vec<Record>>> {
    Ok(Json(state.profiles.user_profile(&username).await?))
}
