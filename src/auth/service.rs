//! Credential service: registration, login, and token issuance.

use std::sync::Arc;
use tracing::info;

use crate::auth::identity::{FederatedProfile, IdentityStore};
use crate::auth::password;
use crate::auth::token::{Claims, TokenService};
use crate::auth::types::{AccessToken, LoginRequest, RegisterRequest};
use crate::errors::ApiError;
use crate::users::{User, UserStore};

pub struct AuthService {
    users: Arc<dyn UserStore>,
    identities: Arc<dyn IdentityStore>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        identities: Arc<dyn IdentityStore>,
        tokens: TokenService,
    ) -> Self {
        Self {
            users,
            identities,
            tokens,
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<AccessToken, ApiError> {
        if !is_valid_email(&req.email) {
            return Err(ApiError::InvalidArgument("invalid email format".to_string()));
        }
        if req.password.is_empty() {
            return Err(ApiError::InvalidArgument(
                "password must not be empty".to_string(),
            ));
        }

        if self.users.find_by_email(&req.email).await?.is_some() {
            return Err(ApiError::Conflict("email already exists".to_string()));
        }

        let password_hash = password::hash(&req.password)?;
        let user = User::new(req.firstname, req.lastname, req.email, password_hash);
        self.users.create(&user).await?;

        info!("registered new user");
        self.issue_token(&user)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AccessToken, ApiError> {
        let user = self
            .users
            .find_by_email(&req.email)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;

        // federation-only accounts carry no password credential
        if user.password_hash.is_empty() {
            return Err(ApiError::InvalidCredentials);
        }

        if !password::verify(&req.password, &user.password_hash)? {
            return Err(ApiError::InvalidCredentials);
        }

        self.issue_token(&user)
    }

    /// Login path for an already-resolved user (OAuth federation).
    pub async fn federated_login(
        &self,
        provider: &str,
        profile: &FederatedProfile,
    ) -> Result<AccessToken, ApiError> {
        let user = self.identities.resolve_or_create(provider, profile).await?;
        info!("federated login: provider={}", provider);
        self.issue_token(&user)
    }

    pub fn issue_token(&self, user: &User) -> Result<AccessToken, ApiError> {
        let access_token = self.tokens.generate(&user.id, &user.email)?;
        Ok(AccessToken { access_token })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, ApiError> {
        self.tokens.verify(token)
    }
}

fn is_valid_email(email: &str) -> bool {
    email.contains('@') && email.contains('.')
}
