//! Blog route table.

use axum::{
    routing::{get, patch},
    Router,
};
use std::sync::Arc;

use super::handlers;
use crate::server::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/blogs",
            get(handlers::list_articles).post(handlers::create_article),
        )
        .route("/blogs/my-articles", get(handlers::my_articles))
        .route(
            "/blogs/:id",
            get(handlers::get_article)
                .patch(handlers::edit_article)
                .delete(handlers::delete_article),
        )
        .route("/blogs/:id/state", patch(handlers::update_article_state))
}
