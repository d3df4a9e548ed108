//! Password hashing with bcrypt.

use crate::errors::ApiError;

pub const BCRYPT_COST: u32 = 10;

pub fn hash(password: &str) -> Result<String, ApiError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))
}

/// Bcrypt's digest comparison is constant-time.
pub fn verify(password: &str, hash: &str) -> Result<bool, ApiError> {
    bcrypt::verify(password, hash)
        .map_err(|e| ApiError::Internal(format!("password verification failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash("Password1").unwrap();
        assert!(verify("Password1", &hashed).unwrap());
        assert!(!verify("wrong", &hashed).unwrap());
    }
}
