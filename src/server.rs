//! HTTP server assembly: shared state, router, and middleware stack.

use anyhow::Result;
use axum::{
    error_handling::HandleErrorLayer,
    http::{HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::{limit::ConcurrencyLimitLayer, timeout::TimeoutLayer, BoxError, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::auth::google::GoogleProvider;
use crate::auth::identity::SqliteIdentityStore;
use crate::auth::token::TokenService;
use crate::auth::AuthService;
use crate::blog::store::SqliteArticleStore;
use crate::blog::BlogService;
use crate::cache::MokaResponseCache;
use crate::config::AppConfig;
use crate::storage;
use crate::users::SqliteUserStore;

pub const MAX_CONCURRENCY: usize = 256;
pub const MAX_BODY_SIZE: usize = 1024 * 1024; // 1MB
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared per-request state.
pub struct AppState {
    pub auth: AuthService,
    pub blog: BlogService,
    pub google: GoogleProvider,
}

pub struct ApiServer {
    config: AppConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let pool = storage::connect(&config.database_url).await?;

        let users = Arc::new(SqliteUserStore::new(pool.clone()));
        let identities = Arc::new(SqliteIdentityStore::new(pool.clone()));
        let articles = Arc::new(SqliteArticleStore::new(pool));
        let cache = Arc::new(MokaResponseCache::new());

        let tokens = TokenService::new(config.jwt_secret.clone(), config.token_expiry_secs)?;
        let auth = AuthService::new(users.clone(), identities, tokens);
        let blog = BlogService::new(articles, users, cache);
        let google = GoogleProvider::new(&config.google);

        Ok(Self {
            state: Arc::new(AppState { auth, blog, google }),
            config,
        })
    }

    pub fn router(&self) -> Router {
        let cors = match self.config.cors_allow_origin.parse::<HeaderValue>() {
            Ok(origin) => CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any),
            Err(_) => {
                tracing::warn!("invalid CORS_ALLOW_ORIGIN, falling back to permissive CORS");
                CorsLayer::permissive()
            }
        };

        Router::new()
            .route("/health", get(health_check))
            .merge(crate::auth::routes::routes())
            .merge(crate::blog::routes::routes())
            .with_state(self.state.clone())
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(handle_middleware_error))
                    .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENCY))
                    .layer(TimeoutLayer::new(REQUEST_TIMEOUT)),
            )
            .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        info!("listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn handle_middleware_error(err: BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "request timed out".to_string())
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error".to_string(),
        )
    }
}
