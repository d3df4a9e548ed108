//! Article business rules: authorship, state transitions, field whitelisting,
//! and cache population/invalidation.

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::blog::dto::{
    ArticlePatch, CreateArticleRequest, ListQuery, OwnerArticleDto, PublicArticleDto,
};
use crate::blog::model::{reading_time, ArticleState, NewArticle};
use crate::blog::store::{ArticleFilter, ArticleStore};
use crate::cache::{article_key, ResponseCache, ARTICLE_TTL, LIST_KEY, LIST_TTL};
use crate::errors::ApiError;
use crate::users::UserStore;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PER_PAGE: i64 = 20;

pub struct BlogService {
    articles: Arc<dyn ArticleStore>,
    users: Arc<dyn UserStore>,
    cache: Arc<dyn ResponseCache>,
}

impl BlogService {
    pub fn new(
        articles: Arc<dyn ArticleStore>,
        users: Arc<dyn UserStore>,
        cache: Arc<dyn ResponseCache>,
    ) -> Self {
        Self {
            articles,
            users,
            cache,
        }
    }

    pub async fn create_article(
        &self,
        caller_id: &str,
        req: CreateArticleRequest,
    ) -> Result<OwnerArticleDto, ApiError> {
        if req.title.trim().is_empty() {
            return Err(ApiError::InvalidArgument(
                "title must not be empty".to_string(),
            ));
        }
        if req.body.trim().is_empty() {
            return Err(ApiError::InvalidArgument(
                "body must not be empty".to_string(),
            ));
        }

        let author = self
            .users
            .find_by_id(caller_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("author not found".to_string()))?;

        let article = self
            .articles
            .insert(&NewArticle {
                reading_time: reading_time(&req.body),
                title: req.title,
                description: req.description,
                body: req.body,
                tags: req.tags,
                author_id: author.id,
            })
            .await?;

        self.cache.delete(LIST_KEY).await;
        Ok(OwnerArticleDto::from(&article))
    }

    /// Public listing. Drafts are never listable, not even by their owner.
    pub async fn list_articles(&self, query: ListQuery) -> Result<Value, ApiError> {
        let state = query.state.as_deref().unwrap_or("published");
        if state == "draft" {
            return Err(ApiError::InvalidArgument(
                "you cannot read a blog post in draft state".to_string(),
            ));
        }

        let page = parse_positive(query.page.as_deref(), DEFAULT_PAGE, "page")?;
        let per_page = parse_positive(query.per_page.as_deref(), DEFAULT_PER_PAGE, "per_page")?;

        // Only the unfiltered default listing lives under the constant cache
        // key; filtered queries always hit the store.
        let cacheable = query.title.is_none()
            && query.tags.is_none()
            && state == "published"
            && page == DEFAULT_PAGE
            && per_page == DEFAULT_PER_PAGE;

        if cacheable {
            if let Some(cached) = self.cache.get(LIST_KEY).await {
                debug!("article list served from cache");
                return Ok(cached);
            }
        }

        let offset = (page - 1)
            .checked_mul(per_page)
            .ok_or_else(|| positive_error("page"))?;

        let articles = self
            .articles
            .list(&ArticleFilter {
                title: query.title,
                tags: query.tags,
                state: state.to_string(),
                offset,
                limit: per_page,
            })
            .await?;

        let dtos: Vec<PublicArticleDto> = articles.iter().map(PublicArticleDto::from).collect();
        let value = serde_json::to_value(dtos)
            .map_err(|e| ApiError::Internal(format!("response serialization failed: {}", e)))?;

        if cacheable {
            self.cache.set(LIST_KEY, value.clone(), LIST_TTL).await;
        }
        Ok(value)
    }

    /// Public single-article read. Published status is the access gate; every
    /// successful read bumps the read counter, deliberately non-idempotent.
    pub async fn get_article(&self, id: i64) -> Result<Value, ApiError> {
        if let Some(cached) = self.cache.get(&article_key(id)).await {
            // the cached body may lag by at most the TTL, but the counter
            // still records this read
            self.articles.increment_read_count(id).await?;
            debug!("article {} served from cache", id);
            return Ok(cached);
        }

        let mut article = self
            .articles
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("article not found".to_string()))?;

        if article.state != ArticleState::Published {
            return Err(ApiError::NotFound("article is not published".to_string()));
        }

        self.articles.increment_read_count(id).await?;
        article.read_count += 1;

        let value = serde_json::to_value(PublicArticleDto::from(&article))
            .map_err(|e| ApiError::Internal(format!("response serialization failed: {}", e)))?;
        self.cache
            .set(&article_key(id), value.clone(), ARTICLE_TTL)
            .await;
        Ok(value)
    }

    /// All articles authored by the caller, drafts included.
    pub async fn my_articles(&self, caller_id: &str) -> Result<Vec<OwnerArticleDto>, ApiError> {
        let articles = self.articles.find_by_author(caller_id).await?;
        Ok(articles.iter().map(OwnerArticleDto::from).collect())
    }

    /// Partial update restricted to {title, description, body, tags}.
    /// Non-ownership is masked as NotFound.
    pub async fn edit_article(
        &self,
        caller_id: &str,
        id: i64,
        updates: &Value,
    ) -> Result<OwnerArticleDto, ApiError> {
        let patch = ArticlePatch::from_value(updates)?;

        let mut article = self
            .articles
            .find_by_id_and_author(id, caller_id)
            .await?
            .ok_or_else(not_owned)?;

        if let Some(title) = patch.title {
            article.title = title;
        }
        if let Some(description) = patch.description {
            article.description = Some(description);
        }
        if let Some(body) = patch.body {
            article.reading_time = reading_time(&body);
            article.body = body;
        }
        if let Some(tags) = patch.tags {
            article.tags = Some(tags);
        }
        article.updated_at = chrono::Utc::now();

        self.articles.update(&article).await?;
        self.cache.delete(LIST_KEY).await;
        Ok(OwnerArticleDto::from(&article))
    }

    /// The only exposed transition is draft -> published.
    pub async fn update_state(
        &self,
        caller_id: &str,
        id: i64,
        state: &str,
    ) -> Result<OwnerArticleDto, ApiError> {
        if ArticleState::parse(state) != Some(ArticleState::Published) {
            return Err(ApiError::InvalidArgument("invalid state".to_string()));
        }

        let mut article = self
            .articles
            .find_by_id_and_author(id, caller_id)
            .await?
            .ok_or_else(not_owned)?;

        article.state = ArticleState::Published;
        article.updated_at = chrono::Utc::now();
        self.articles.update(&article).await?;

        self.cache.delete(LIST_KEY).await;
        self.cache.delete(&article_key(id)).await;
        Ok(OwnerArticleDto::from(&article))
    }

    /// Deletion resolves by id first, then checks authorship: a non-owner
    /// sees Forbidden here, unlike Edit which masks with NotFound.
    pub async fn delete_article(&self, caller_id: &str, id: i64) -> Result<bool, ApiError> {
        let article = self
            .articles
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("article not found".to_string()))?;

        if article.author.id != caller_id {
            return Err(ApiError::Forbidden(
                "you do not have permission to delete this article".to_string(),
            ));
        }

        self.articles.delete(id).await?;
        self.cache.delete(LIST_KEY).await;
        self.cache.delete(&article_key(id)).await;
        Ok(true)
    }
}

fn not_owned() -> ApiError {
    ApiError::NotFound("article not found or you are not the author".to_string())
}

fn parse_positive(raw: Option<&str>, default: i64, field: &str) -> Result<i64, ApiError> {
    let value = match raw {
        None => return Ok(default),
        Some(s) => s
            .parse::<i64>()
            .map_err(|_| positive_error(field))?,
    };
    if value < 1 {
        return Err(positive_error(field));
    }
    Ok(value)
}

fn positive_error(field: &str) -> ApiError {
    ApiError::InvalidArgument(format!("{} must be a positive number", field))
}
