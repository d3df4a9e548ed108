//! Best-effort response cache fronting the two public read paths.
//!
//! The cache is an explicit collaborator injected into the blog service:
//! a miss only costs latency, and invalidation runs synchronously with the
//! mutation it follows. Staleness is bounded by the per-entry TTL regardless
//! of invalidation success.

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Constant key for the public article list.
pub const LIST_KEY: &str = "blogs:list";

/// Key for a single article, parameterized by id.
pub fn article_key(id: i64) -> String {
    format!("blogs:{}", id)
}

pub const LIST_TTL: Duration = Duration::from_secs(60);
pub const ARTICLE_TTL: Duration = Duration::from_secs(300);

#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn set(&self, key: &str, value: Value, ttl: Duration);
    async fn delete(&self, key: &str);
}

#[derive(Clone)]
struct Entry {
    value: Value,
    ttl: Duration,
}

struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-process cache backed by moka with per-entry expiration.
pub struct MokaResponseCache {
    inner: Cache<String, Entry>,
}

impl MokaResponseCache {
    pub fn new() -> Self {
        let inner = Cache::builder()
            .max_capacity(10_000)
            .expire_after(PerEntryTtl)
            .build();
        Self { inner }
    }
}

impl Default for MokaResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseCache for MokaResponseCache {
    async fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key).await.map(|e| e.value)
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) {
        self.inner.insert(key.to_string(), Entry { value, ttl }).await;
    }

    async fn delete(&self, key: &str) {
        self.inner.invalidate(key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = MokaResponseCache::new();
        cache
            .set(LIST_KEY, json!([1, 2, 3]), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get(LIST_KEY).await, Some(json!([1, 2, 3])));

        cache.delete(LIST_KEY).await;
        assert_eq!(cache.get(LIST_KEY).await, None);
    }

    #[tokio::test]
    async fn test_entry_expires() {
        let cache = MokaResponseCache::new();
        cache
            .set(&article_key(7), json!({"id": 7}), Duration::from_millis(20))
            .await;
        assert!(cache.get(&article_key(7)).await.is_some());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get(&article_key(7)).await, None);
    }

    #[test]
    fn test_article_key() {
        assert_eq!(article_key(42), "blogs:42");
    }
}
