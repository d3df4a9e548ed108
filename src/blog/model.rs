//! Article domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle flag. The only transition exposed through the API is
/// draft -> published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleState {
    Draft,
    Published,
}

impl ArticleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "published" => Some(Self::Published),
            _ => None,
        }
    }
}

/// Owning author, as loaded alongside the article row.
#[derive(Debug, Clone)]
pub struct Author {
    pub id: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub body: String,
    pub tags: Option<Vec<String>>,
    pub state: ArticleState,
    pub read_count: i64,
    /// Derived estimate in minutes; never caller-settable.
    pub reading_time: i64,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields persisted when creating a new draft.
#[derive(Debug)]
pub struct NewArticle {
    pub title: String,
    pub description: Option<String>,
    pub body: String,
    pub tags: Option<Vec<String>>,
    pub reading_time: i64,
    pub author_id: String,
}

/// Estimated reading time at 200 words per minute, rounded up.
/// Words are counted by whitespace split on the trimmed body.
pub fn reading_time(body: &str) -> i64 {
    let words = body.split_whitespace().count() as i64;
    (words + 199) / 200
}
