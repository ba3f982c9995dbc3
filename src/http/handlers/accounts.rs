//! Sign-up and login.

use crate::http::error::ApiResult;
use crate::http::extract::ApiJson;
use crate::http::state::AppState;
use crate::models::{LoginRequest, SignUpRequest, TokenResponse};
use axum::Json;
use axum::extract::State;

/// `POST /api/sign-up`
pub async fn sign_up(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignUpRequest>,
) -> ApiResult<Json<TokenResponse>> {
    Ok(Json(state.accounts.sign_up(request).await?))
}

/// `POST /api/login`
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    Ok(Json(state.accounts.login(request).await?))
}
