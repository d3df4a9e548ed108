//! Federated identity links: (provider, provider_id) -> local user.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::errors::ApiError;
use crate::users::User;

/// Profile asserted by an external identity provider.
#[derive(Debug, Clone)]
pub struct FederatedProfile {
    pub provider_id: String,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Resolve the local user for an external identity, creating the user
    /// and/or the provider link as needed. User creation and link creation
    /// commit together or not at all.
    async fn resolve_or_create(
        &self,
        provider: &str,
        profile: &FederatedProfile,
    ) -> Result<User, ApiError>;
}

pub struct SqliteIdentityStore {
    pool: SqlitePool,
}

impl SqliteIdentityStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
    async fn resolve_or_create(
        &self,
        provider: &str,
        profile: &FederatedProfile,
    ) -> Result<User, ApiError> {
        let mut tx = self.pool.begin().await?;

        let linked = sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN oauth_providers p ON p.user_id = u.id
            WHERE p.provider = ? AND p.provider_id = ?
            "#,
        )
        .bind(provider)
        .bind(&profile.provider_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(user) = linked {
            tx.commit().await?;
            return Ok(user);
        }

        // No link yet: reuse an existing account with the asserted email, or
        // create a fresh federation-only account (empty password hash).
        let existing = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(&profile.email)
            .fetch_optional(&mut *tx)
            .await?;

        let user = match existing {
            Some(user) => user,
            None => {
                let user = User::new(
                    profile.firstname.clone(),
                    profile.lastname.clone(),
                    profile.email.clone(),
                    String::new(),
                );
                sqlx::query(
                    r#"
                    INSERT INTO users (id, firstname, lastname, email, password_hash, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&user.id)
                .bind(&user.firstname)
                .bind(&user.lastname)
                .bind(&user.email)
                .bind(&user.password_hash)
                .bind(user.created_at)
                .bind(user.updated_at)
                .execute(&mut *tx)
                .await?;
                user
            }
        };

        sqlx::query(
            r#"
            INSERT INTO oauth_providers (provider, provider_id, user_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(provider)
        .bind(&profile.provider_id)
        .bind(&user.id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }
}
