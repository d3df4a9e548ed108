//! Articles: model, repository, business rules, and HTTP surface.

pub mod dto;
pub mod handlers;
pub mod model;
pub mod routes;
pub mod service;
pub mod store;

pub use model::{Article, ArticleState, Author};
pub use service::BlogService;
