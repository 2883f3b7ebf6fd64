use crate::errors::AdminError;
use crate::middleware::principal::CurrentPrincipal;
use crate::models::{
    ApiResponse, AuthStatus, LoginRequest, LoginResponse, RefreshRequest, RefreshResponse,
};
use crate::routes::AppState;
use crate::services::auth_service::{self, TOKEN_TYPE_BEARER};
use crate::services::refresh_service;
use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::instrument;

/// Handle administrator login
///
/// POST /admin/login
#[instrument(skip_all, name = "admin.handler.login")]
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AdminError> {
    let response = auth_service::login(
        state.credentials.as_ref(),
        &state.issuer,
        &payload.username,
        &payload.password,
    )
    .await?;

    Ok(Json(ApiResponse::success(response)))
}

/// Exchange a refresh token for a new access token
///
/// POST /auth/refresh
#[instrument(skip_all, name = "admin.handler.refresh")]
pub async fn handle_refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<RefreshResponse>>, AdminError> {
    let issued = refresh_service::refresh(&state.validator, &state.issuer, &payload.refresh_token)?;

    Ok(Json(ApiResponse::success(RefreshResponse {
        token: issued.token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        expires_in: issued.expires_in,
    })))
}

/// Report whether the caller is authenticated
///
/// GET /admin/check-auth
pub async fn check_auth(
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Json<ApiResponse<AuthStatus>> {
    Json(ApiResponse::success(AuthStatus {
        authenticated: principal.is_some(),
        principal: principal.map(|p| p.username),
    }))
}
