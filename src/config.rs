//! Environment-driven configuration.

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub callback_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Database URL (DATABASE_URL env or a local sqlite file).
    pub database_url: String,
    pub jwt_secret: String,
    /// Bearer token lifetime in seconds (JWT_EXPIRY_SECS).
    pub token_expiry_secs: u64,
    /// Allowed CORS origin (CORS_ALLOW_ORIGIN).
    pub cors_allow_origin: String,
    pub google: GoogleConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .ok()
            .map(|p| p.parse::<u16>())
            .transpose()
            .context("PORT must be a number")?
            .unwrap_or(3000);

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./data/inkpress.db".to_string());

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let token_expiry_secs = env::var("JWT_EXPIRY_SECS")
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("JWT_EXPIRY_SECS must be a number")?
            .unwrap_or(3600);

        let cors_allow_origin = env::var("CORS_ALLOW_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let google = GoogleConfig {
            client_id: env::var("GOOGLE_CLIENT_ID").ok(),
            client_secret: env::var("GOOGLE_CLIENT_SECRET").ok(),
            callback_url: env::var("GOOGLE_CALLBACK_URL")
                .unwrap_or_else(|_| "http://localhost:3000/auth/google/callback".to_string()),
        };

        Ok(AppConfig {
            host,
            port,
            database_url,
            jwt_secret,
            token_expiry_secs,
            cors_allow_origin,
            google,
        })
    }
}
