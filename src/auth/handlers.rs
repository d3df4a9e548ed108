//! Auth endpoint handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::auth::types::{AccessToken, LoginRequest, RegisterRequest};
use crate::errors::ApiError;
use crate::server::AppState;

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AccessToken>), ApiError> {
    info!("registration request: email={}", req.email);
    let token = state.auth.register(req).await?;
    Ok((StatusCode::CREATED, Json(token)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AccessToken>, ApiError> {
    info!("login request: email={}", req.email);
    let token = state.auth.login(req).await?;
    Ok(Json(token))
}

/// Start of the Google login flow: redirect to the consent screen.
pub async fn google_redirect(State(state): State<Arc<AppState>>) -> Result<Redirect, ApiError> {
    let url = state.google.authorize_url()?;
    Ok(Redirect::temporary(&url))
}

/// Google redirects back here with an authorization code.
pub async fn google_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<AccessToken>, ApiError> {
    let code = params
        .get("code")
        .ok_or_else(|| ApiError::Unauthorized("google authentication failed".to_string()))?;

    let profile = state.google.exchange_code(code).await?;
    let token = state.auth.federated_login("google", &profile).await?;
    Ok(Json(token))
}
