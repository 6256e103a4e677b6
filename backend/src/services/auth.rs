//! Authentication service for registration, login, and the external
//! identity-provider flow

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::Claims;
use shared::models::{User, UserProfile};
use shared::types::{AuthProvider, UserRole};
use shared::validation::{validate_email, validate_password};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    token_expiry: i64,
}

/// Input for registering a local account
#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Claims resolved from the external identity provider
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub subject_id: String,
    pub email: String,
    pub name: String,
}

/// Response after successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserProfile,
}

/// User row as stored in Postgres
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    provider: String,
    name: String,
    email: String,
    password_hash: Option<String>,
    external_subject_id: Option<String>,
    role: String,
    device_token: Option<String>,
    subscribed_fields: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AppResult<User> {
        Ok(User {
            id: self.id,
            provider: AuthProvider::from_str(&self.provider).map_err(AppError::Internal)?,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            external_subject_id: self.external_subject_id,
            role: UserRole::from_str(&self.role).map_err(AppError::Internal)?,
            device_token: self.device_token,
            subscribed_fields: self.subscribed_fields,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_USER: &str = r#"
    SELECT id, provider, name, email, password_hash, external_subject_id,
           role, device_token, subscribed_fields, created_at, updated_at
    FROM users
"#;

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            token_expiry: config.jwt.token_expiry,
        }
    }

    /// Register a local account
    ///
    /// The email is stored lowercase; the password is bcrypt-hashed and
    /// never stored or logged in plaintext.
    pub async fn register(&self, input: RegisterInput) -> AppResult<AuthResponse> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Name is required".to_string(),
            });
        }
        validate_email(&input.email).map_err(|msg| AppError::Validation {
            field: "email".to_string(),
            message: msg.to_string(),
        })?;
        validate_password(&input.password).map_err(|msg| AppError::Validation {
            field: "password".to_string(),
            message: msg.to_string(),
        })?;

        let email = input.email.trim().to_lowercase();

        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = $1")
            .bind(&email)
            .fetch_one(&self.db)
            .await?;

        if existing > 0 {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (provider, name, email, password_hash, role, subscribed_fields)
            VALUES ('local', $1, $2, $3, 'user', '{}')
            RETURNING id, provider, name, email, password_hash, external_subject_id,
                      role, device_token, subscribed_fields, created_at, updated_at
            "#,
        )
        .bind(input.name.trim())
        .bind(&email)
        .bind(&password_hash)
        .fetch_one(&self.db)
        .await?;

        let user = row.into_user()?;
        self.respond_with_token(user)
    }

    /// Authenticate a local account with email and password
    ///
    /// Returns the same generic invalid-credentials error for an unknown
    /// email and a wrong password.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthResponse> {
        let email = email.trim().to_lowercase();

        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE email = $1", SELECT_USER))
            .bind(&email)
            .fetch_optional(&self.db)
            .await?;

        let user = match row {
            Some(row) => row.into_user()?,
            None => return Err(AppError::InvalidCredentials),
        };

        let Some(password_hash) = user.password_hash.as_deref() else {
            // External-provider account: no password to check
            return Err(AppError::InvalidCredentials);
        };

        let valid = verify(password, password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        self.respond_with_token(user)
    }

    /// Resolve an external identity: look up or create a user by subject ID
    /// and issue the same token format as local login
    ///
    /// An email collision with an existing account fails with a conflict
    /// error; account linking is unimplemented.
    pub async fn external_login(&self, identity: ExternalIdentity) -> AppResult<AuthResponse> {
        let email = identity.email.trim().to_lowercase();

        let by_subject = sqlx::query_as::<_, UserRow>(&format!(
            "{} WHERE external_subject_id = $1",
            SELECT_USER
        ))
        .bind(&identity.subject_id)
        .fetch_optional(&self.db)
        .await?;

        if let Some(row) = by_subject {
            return self.respond_with_token(row.into_user()?);
        }

        // New subject: the email must not belong to another account
        let by_email = sqlx::query_as::<_, UserRow>(&format!("{} WHERE email = $1", SELECT_USER))
            .bind(&email)
            .fetch_optional(&self.db)
            .await?;

        if by_email.is_some() {
            return Err(AppError::Conflict(
                "This email is already registered with a different login method".to_string(),
            ));
        }

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (provider, name, email, external_subject_id, role, subscribed_fields)
            VALUES ('external_idp', $1, $2, $3, 'user', '{}')
            RETURNING id, provider, name, email, password_hash, external_subject_id,
                      role, device_token, subscribed_fields, created_at, updated_at
            "#,
        )
        .bind(&identity.name)
        .bind(&email)
        .bind(&identity.subject_id)
        .fetch_one(&self.db)
        .await?;

        self.respond_with_token(row.into_user()?)
    }

    /// Fetch the profile for an authenticated user
    pub async fn profile(&self, user_id: Uuid) -> AppResult<UserProfile> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE id = $1", SELECT_USER))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(row.into_user()?.into())
    }

    /// Store or replace a user's FCM device token
    pub async fn register_device_token(&self, user_id: Uuid, token: &str) -> AppResult<()> {
        if token.trim().is_empty() {
            return Err(AppError::Validation {
                field: "device_token".to_string(),
                message: "Device token is required".to_string(),
            });
        }

        let updated =
            sqlx::query("UPDATE users SET device_token = $1, updated_at = NOW() WHERE id = $2")
                .bind(token.trim())
                .bind(user_id)
                .execute(&self.db)
                .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        Ok(())
    }

    fn respond_with_token(&self, user: User) -> AppResult<AuthResponse> {
        let token = self.issue_token(&user)?;

        Ok(AuthResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.token_expiry,
            user: user.into(),
        })
    }

    /// Issue a signed token embedding {sub, email, role, provider}
    fn issue_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.token_expiry);

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.as_str().to_string(),
            provider: user.provider.as_str().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }
}
