//! SQLite pool bootstrap and schema initialization.

use anyhow::{anyhow, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Connect to the database and make sure the schema exists.
///
/// In-memory databases are pinned to a single connection: every pooled
/// connection to `sqlite::memory:` would otherwise see its own empty database.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let is_memory = database_url.contains(":memory:");

    // ensure the parent directory exists for file-backed sqlite URLs
    if let Some(path) = database_url.strip_prefix("sqlite://") {
        let path_only = path.split('?').next().unwrap_or(path);
        if path_only != ":memory:" && !path_only.is_empty() {
            if let Some(parent) = std::path::Path::new(path_only).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }
    }

    let connect_options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| anyhow!("invalid database URL: {}", e))?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .foreign_keys(true);

    let max_connections = if is_memory { 1 } else { 20 };
    let min_connections = if is_memory { 1 } else { 2 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .min_connections(min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .connect_with(connect_options)
        .await
        .map_err(|e| anyhow!("failed to connect to database: {}", e))?;

    initialize_schema(&pool).await?;

    info!("storage initialized");
    Ok(pool)
}

async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            firstname TEXT NOT NULL,
            lastname TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS oauth_providers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            provider TEXT NOT NULL,
            provider_id TEXT NOT NULL,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            created_at TEXT NOT NULL,
            UNIQUE(provider, provider_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS blogs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL UNIQUE,
            description TEXT,
            body TEXT NOT NULL,
            tags TEXT,
            state TEXT NOT NULL DEFAULT 'draft',
            read_count INTEGER NOT NULL DEFAULT 0,
            reading_time INTEGER NOT NULL,
            author_id TEXT NOT NULL REFERENCES users(id),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_blogs_author ON blogs(author_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_blogs_state ON blogs(state)")
        .execute(pool)
        .await?;

    Ok(())
}
