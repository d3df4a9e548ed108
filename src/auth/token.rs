//! Bearer token issuance and verification (HS256 JWT).

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub exp: usize,
    pub iat: usize,
}

pub struct TokenService {
    secret: String,
    /// Token lifetime in seconds.
    expiry: u64,
}

impl TokenService {
    /// Rejects secrets shorter than 32 characters.
    pub fn new(secret: String, expiry: u64) -> Result<Self, ApiError> {
        if secret.len() < 32 {
            return Err(ApiError::Internal(
                "JWT secret must be at least 32 characters".to_string(),
            ));
        }
        Ok(Self { secret, expiry })
    }

    pub fn generate(&self, user_id: &str, email: &str) -> Result<String, ApiError> {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: now + self.expiry as usize,
            iat: now,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("token signing failed: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| ApiError::Unauthorized("invalid or expired token".to_string()))
    }
}
