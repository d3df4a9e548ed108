//! Article repository over SQLite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::error::ErrorKind;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::blog::model::{Article, ArticleState, Author, NewArticle};
use crate::errors::ApiError;

/// Filters for the public list. `state` is kept as a raw string: unknown
/// values simply match no rows.
#[derive(Debug)]
pub struct ArticleFilter {
    pub title: Option<String>,
    pub tags: Option<String>,
    pub state: String,
    pub offset: i64,
    pub limit: i64,
}

#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn insert(&self, new: &NewArticle) -> Result<Article, ApiError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Article>, ApiError>;
    async fn find_by_id_and_author(
        &self,
        id: i64,
        author_id: &str,
    ) -> Result<Option<Article>, ApiError>;
    async fn find_by_author(&self, author_id: &str) -> Result<Vec<Article>, ApiError>;
    async fn list(&self, filter: &ArticleFilter) -> Result<Vec<Article>, ApiError>;
    async fn update(&self, article: &Article) -> Result<(), ApiError>;
    async fn increment_read_count(&self, id: i64) -> Result<(), ApiError>;
    async fn delete(&self, id: i64) -> Result<(), ApiError>;
}

pub struct SqliteArticleStore {
    pool: SqlitePool,
}

impl SqliteArticleStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const SELECT_WITH_AUTHOR: &str = r#"
    SELECT b.id, b.title, b.description, b.body, b.tags, b.state,
           b.read_count, b.reading_time, b.created_at, b.updated_at,
           u.id AS author_id, u.firstname, u.lastname, u.email
    FROM blogs b
    JOIN users u ON u.id = b.author_id
"#;

fn encode_tags(tags: &Option<Vec<String>>) -> Option<String> {
    tags.as_ref().map(|t| t.join(","))
}

fn decode_tags(raw: Option<String>) -> Option<Vec<String>> {
    raw.map(|s| s.split(',').map(|t| t.to_string()).collect())
}

fn row_to_article(row: &SqliteRow) -> Result<Article, ApiError> {
    let state_raw: String = row.get("state");
    let state = ArticleState::parse(&state_raw)
        .ok_or_else(|| ApiError::Internal(format!("unknown article state: {}", state_raw)))?;

    Ok(Article {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        body: row.get("body"),
        tags: decode_tags(row.get("tags")),
        state,
        read_count: row.get("read_count"),
        reading_time: row.get("reading_time"),
        author: Author {
            id: row.get("author_id"),
            firstname: row.get("firstname"),
            lastname: row.get("lastname"),
            email: row.get("email"),
        },
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    })
}

#[async_trait]
impl ArticleStore for SqliteArticleStore {
    async fn insert(&self, new: &NewArticle) -> Result<Article, ApiError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO blogs (title, description, body, tags, state, read_count,
                               reading_time, author_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, 'draft', 0, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.body)
        .bind(encode_tags(&new.tags))
        .bind(new.reading_time)
        .bind(&new.author_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.kind() == ErrorKind::UniqueViolation => {
                ApiError::Conflict("title already exists".to_string())
            }
            _ => ApiError::from(e),
        })?;

        let id = result.last_insert_rowid();
        self.find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::Internal("article row missing after insert".to_string()))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Article>, ApiError> {
        let sql = format!("{} WHERE b.id = ?", SELECT_WITH_AUTHOR);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_article).transpose()
    }

    async fn find_by_id_and_author(
        &self,
        id: i64,
        author_id: &str,
    ) -> Result<Option<Article>, ApiError> {
        let sql = format!("{} WHERE b.id = ? AND b.author_id = ?", SELECT_WITH_AUTHOR);
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(author_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_article).transpose()
    }

    async fn find_by_author(&self, author_id: &str) -> Result<Vec<Article>, ApiError> {
        let sql = format!("{} WHERE b.author_id = ? ORDER BY b.id", SELECT_WITH_AUTHOR);
        let rows = sqlx::query(&sql)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_article).collect()
    }

    async fn list(&self, filter: &ArticleFilter) -> Result<Vec<Article>, ApiError> {
        let mut sql = format!("{} WHERE b.state = ?", SELECT_WITH_AUTHOR);
        if filter.title.is_some() {
            sql.push_str(" AND b.title = ?");
        }
        if filter.tags.is_some() {
            sql.push_str(" AND b.tags = ?");
        }
        sql.push_str(" ORDER BY b.id LIMIT ? OFFSET ?");

        let mut query = sqlx::query(&sql).bind(&filter.state);
        if let Some(title) = &filter.title {
            query = query.bind(title);
        }
        if let Some(tags) = &filter.tags {
            query = query.bind(tags);
        }
        let rows = query
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_article).collect()
    }

    async fn update(&self, article: &Article) -> Result<(), ApiError> {
        sqlx::query(
            r#"
            UPDATE blogs
            SET title = ?, description = ?, body = ?, tags = ?, state = ?,
                reading_time = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.body)
        .bind(encode_tags(&article.tags))
        .bind(article.state.as_str())
        .bind(article.reading_time)
        .bind(article.updated_at)
        .bind(article.id)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.kind() == ErrorKind::UniqueViolation => {
                ApiError::Conflict("title already exists".to_string())
            }
            _ => ApiError::from(e),
        })?;
        Ok(())
    }

    async fn increment_read_count(&self, id: i64) -> Result<(), ApiError> {
        sqlx::query("UPDATE blogs SET read_count = read_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM blogs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::model::reading_time;
    use crate::storage;
    use crate::users::{SqliteUserStore, User, UserStore};

    async fn setup() -> (SqliteArticleStore, User) {
        let pool = storage::connect("sqlite::memory:").await.unwrap();
        let users = SqliteUserStore::new(pool.clone());
        let user = User::new(
            "John".into(),
            "Doe".into(),
            "john@example.com".into(),
            "hash".into(),
        );
        users.create(&user).await.unwrap();
        (SqliteArticleStore::new(pool), user)
    }

    fn new_article(title: &str, author_id: &str) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            description: Some("about things".to_string()),
            body: "one two three".to_string(),
            tags: Some(vec!["rust".to_string(), "web".to_string()]),
            reading_time: reading_time("one two three"),
            author_id: author_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_defaults() {
        let (store, user) = setup().await;
        let article = store.insert(&new_article("First", &user.id)).await.unwrap();

        assert_eq!(article.state, ArticleState::Draft);
        assert_eq!(article.read_count, 0);
        assert_eq!(article.reading_time, 1);
        assert_eq!(article.author.email, "john@example.com");
        assert_eq!(
            article.tags,
            Some(vec!["rust".to_string(), "web".to_string()])
        );
    }

    #[tokio::test]
    async fn test_duplicate_title_is_conflict() {
        let (store, user) = setup().await;
        store.insert(&new_article("First", &user.id)).await.unwrap();
        let err = store.insert(&new_article("First", &user.id)).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_author_scoping() {
        let (store, user) = setup().await;
        let article = store.insert(&new_article("Scoped", &user.id)).await.unwrap();

        assert!(store
            .find_by_id_and_author(article.id, &user.id)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .find_by_id_and_author(article.id, "someone-else")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_pagination() {
        let (store, user) = setup().await;
        for i in 0..5 {
            let mut article = store
                .insert(&new_article(&format!("Title {}", i), &user.id))
                .await
                .unwrap();
            article.state = ArticleState::Published;
            store.update(&article).await.unwrap();
        }

        let page = store
            .list(&ArticleFilter {
                title: None,
                tags: None,
                state: "published".to_string(),
                offset: 2,
                limit: 2,
            })
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title, "Title 2");

        let by_title = store
            .list(&ArticleFilter {
                title: Some("Title 3".to_string()),
                tags: None,
                state: "published".to_string(),
                offset: 0,
                limit: 20,
            })
            .await
            .unwrap();
        assert_eq!(by_title.len(), 1);

        // drafts are not in the published listing
        store.insert(&new_article("Draft one", &user.id)).await.unwrap();
        let published = store
            .list(&ArticleFilter {
                title: None,
                tags: None,
                state: "published".to_string(),
                offset: 0,
                limit: 20,
            })
            .await
            .unwrap();
        assert_eq!(published.len(), 5);
    }

    #[tokio::test]
    async fn test_increment_and_delete() {
        let (store, user) = setup().await;
        let article = store.insert(&new_article("Counted", &user.id)).await.unwrap();

        store.increment_read_count(article.id).await.unwrap();
        store.increment_read_count(article.id).await.unwrap();
        let reloaded = store.find_by_id(article.id).await.unwrap().unwrap();
        assert_eq!(reloaded.read_count, 2);

        store.delete(article.id).await.unwrap();
        assert!(store.find_by_id(article.id).await.unwrap().is_none());
    }
}
