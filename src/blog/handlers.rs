//! Blog endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::auth::AuthUser;
use crate::blog::dto::{CreateArticleRequest, ListQuery, OwnerArticleDto, UpdateStateRequest};
use crate::errors::ApiError;
use crate::server::AppState;

pub async fn create_article(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<OwnerArticleDto>), ApiError> {
    info!("create article request: title={}", req.title);
    let article = state.blog.create_article(&user.id, req).await?;
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, ApiError> {
    let articles = state.blog.list_articles(query).await?;
    Ok(Json(articles))
}

pub async fn my_articles(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<OwnerArticleDto>>, ApiError> {
    let articles = state.blog.my_articles(&user.id).await?;
    Ok(Json(articles))
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let article = state.blog.get_article(id).await?;
    Ok(Json(article))
}

pub async fn edit_article(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(updates): Json<Value>,
) -> Result<Json<OwnerArticleDto>, ApiError> {
    let article = state.blog.edit_article(&user.id, id, &updates).await?;
    Ok(Json(article))
}

pub async fn update_article_state(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateStateRequest>,
) -> Result<Json<OwnerArticleDto>, ApiError> {
    info!("state update request: id={} state={}", id, req.state);
    let article = state.blog.update_state(&user.id, id, &req.state).await?;
    Ok(Json(article))
}

pub async fn delete_article(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let status = state.blog.delete_article(&user.id, id).await?;
    Ok(Json(json!({ "status": status })))
}
