//! Article request payloads and response shapes.
//!
//! Two views exist: the public view carries the author block and is returned
//! to anonymous callers; the owner view drops the author (it is the caller)
//! and is only returned to the authenticated author.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::blog::model::{Article, ArticleState};
use crate::errors::ApiError;

#[derive(Debug, Serialize)]
pub struct AuthorDto {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicArticleDto {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub state: ArticleState,
    pub read_count: i64,
    pub reading_time: i64,
    pub tags: Option<Vec<String>>,
    pub body: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub author: AuthorDto,
}

impl From<&Article> for PublicArticleDto {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id,
            title: article.title.clone(),
            description: article.description.clone(),
            state: article.state,
            read_count: article.read_count,
            reading_time: article.reading_time,
            tags: article.tags.clone(),
            body: article.body.clone(),
            created_at: article.created_at,
            updated_at: article.updated_at,
            author: AuthorDto {
                firstname: article.author.firstname.clone(),
                lastname: article.author.lastname.clone(),
                email: article.author.email.clone(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerArticleDto {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub state: ArticleState,
    pub read_count: i64,
    pub reading_time: i64,
    pub tags: Option<Vec<String>>,
    pub body: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Article> for OwnerArticleDto {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id,
            title: article.title.clone(),
            description: article.description.clone(),
            state: article.state,
            read_count: article.read_count,
            reading_time: article.reading_time,
            tags: article.tags.clone(),
            body: article.body.clone(),
            created_at: article.created_at,
            updated_at: article.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateArticleRequest {
    pub title: String,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStateRequest {
    pub state: String,
}

/// Public list filters. Pagination values arrive as raw strings so that
/// non-numeric input is reported as a validation error, not a routing one.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub title: Option<String>,
    pub tags: Option<String>,
    pub state: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

/// Whitelist-checked partial update. Any key outside
/// {title, description, body, tags} is rejected before the merge.
#[derive(Debug, Default)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
}

const ALLOWED_UPDATES: [&str; 4] = ["title", "description", "body", "tags"];

impl ArticlePatch {
    pub fn from_value(value: &Value) -> Result<Self, ApiError> {
        let object = value
            .as_object()
            .ok_or_else(|| ApiError::InvalidArgument("invalid updates".to_string()))?;

        if object.keys().any(|k| !ALLOWED_UPDATES.contains(&k.as_str())) {
            return Err(ApiError::InvalidArgument("invalid updates".to_string()));
        }

        let mut patch = ArticlePatch::default();
        if let Some(v) = object.get("title") {
            patch.title = Some(expect_string(v, "title")?);
        }
        if let Some(v) = object.get("description") {
            patch.description = Some(expect_string(v, "description")?);
        }
        if let Some(v) = object.get("body") {
            patch.body = Some(expect_string(v, "body")?);
        }
        if let Some(v) = object.get("tags") {
            let tags = v
                .as_array()
                .ok_or_else(|| ApiError::InvalidArgument("tags must be an array".to_string()))?
                .iter()
                .map(|t| expect_string(t, "tags"))
                .collect::<Result<Vec<_>, _>>()?;
            patch.tags = Some(tags);
        }
        Ok(patch)
    }
}

fn expect_string(value: &Value, field: &str) -> Result<String, ApiError> {
    value
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| ApiError::InvalidArgument(format!("{} must be a string", field)))
}
