//! External identity-provider service
//!
//! OAuth 2.0 / OIDC code flow against the configured provider: build the
//! authorization redirect, exchange the callback code for tokens, and
//! resolve the authenticated subject's claims from the userinfo endpoint.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::IdpConfig;
use crate::error::{AppError, AppResult};
use crate::services::auth::ExternalIdentity;

/// External identity-provider client
#[derive(Clone)]
pub struct IdpService {
    issuer_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http_client: reqwest::Client,
}

/// Token response from the provider
#[derive(Debug, Deserialize)]
pub struct IdpTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<i64>,
    pub id_token: Option<String>,
}

/// Userinfo claims from the provider
#[derive(Debug, Deserialize)]
struct UserinfoResponse {
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

impl IdpService {
    /// Create a new identity-provider service
    pub fn new(config: &IdpConfig) -> Self {
        Self {
            issuer_url: config.issuer_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Build the provider authorization URL for the login redirect
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}/authorize?response_type=code&client_id={}&redirect_uri={}&scope=openid%20profile%20email&state={}",
            self.issuer_url,
            urlencode(&self.client_id),
            urlencode(&self.redirect_uri),
            urlencode(state),
        )
    }

    /// Exchange an authorization code and resolve the subject's identity
    pub async fn resolve_identity(&self, code: &str) -> AppResult<ExternalIdentity> {
        let tokens = self.exchange_code(code).await?;
        self.fetch_userinfo(&tokens.access_token).await
    }

    /// Exchange authorization code for tokens
    async fn exchange_code(&self, code: &str) -> AppResult<IdpTokenResponse> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.redirect_uri),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ];

        let response = self
            .http_client
            .post(format!("{}/oauth/token", self.issuer_url))
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("IdP token request failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Unauthorized(format!(
                "IdP code exchange failed: {}",
                error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to parse IdP response: {}", e)))
    }

    /// Fetch the subject's claims from the userinfo endpoint
    async fn fetch_userinfo(&self, access_token: &str) -> AppResult<ExternalIdentity> {
        let response = self
            .http_client
            .get(format!("{}/userinfo", self.issuer_url))
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Userinfo request failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Unauthorized(format!(
                "Userinfo fetch failed: {}",
                error_text
            )));
        }

        let info: UserinfoResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to parse userinfo: {}", e)))?;

        let email = info.email.ok_or_else(|| {
            AppError::Unauthorized("Identity provider returned no email claim".to_string())
        })?;

        Ok(ExternalIdentity {
            name: info.name.unwrap_or_else(|| email.clone()),
            subject_id: info.sub,
            email,
        })
    }
}

/// Claims for the signed CSRF state carried through the login redirect
#[derive(Debug, Serialize, Deserialize)]
struct LoginStateClaims {
    nonce: String,
    exp: i64,
    iat: i64,
}

/// How long a login redirect stays valid
const LOGIN_STATE_TTL_SECS: i64 = 600;

/// Mint the `state` parameter for the authorization redirect
///
/// The value is a short-lived token signed with the platform JWT secret,
/// so the callback can verify it without server-side session storage.
pub fn issue_login_state(secret: &str) -> AppResult<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = LoginStateClaims {
        nonce: uuid::Uuid::new_v4().to_string(),
        exp: now + LOGIN_STATE_TTL_SECS,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Login state generation failed: {}", e)))
}

/// Verify the `state` parameter returned by the provider callback
pub fn verify_login_state(secret: &str, state: &str) -> AppResult<()> {
    decode::<LoginStateClaims>(
        state,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|_| ())
    .map_err(|_| AppError::Unauthorized("Invalid or expired login state".to_string()))
}

/// Percent-encode the characters that appear in OAuth parameters
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}
