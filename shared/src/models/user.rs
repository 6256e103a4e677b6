//! User account models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{AuthProvider, UserRole};

/// A user account on the platform
///
/// Exactly one of `password_hash` / `external_subject_id` is populated,
/// depending on `provider`. The hash is never serialized into responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub provider: AuthProvider,
    pub name: String,
    /// Unique, stored lowercase
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Subject ID issued by the external identity provider
    pub external_subject_id: Option<String>,
    pub role: UserRole,
    /// FCM device token for push notifications
    pub device_token: Option<String>,
    /// Field identifiers the user is subscribed to
    pub subscribed_fields: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check the provider/credential invariant
    pub fn credentials_consistent(&self) -> bool {
        match self.provider {
            AuthProvider::Local => {
                self.password_hash.is_some() && self.external_subject_id.is_none()
            }
            AuthProvider::ExternalIdp => {
                self.password_hash.is_none() && self.external_subject_id.is_some()
            }
        }
    }
}

/// Public profile view of a user, safe to return from the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub provider: AuthProvider,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub has_device_token: bool,
    pub subscribed_fields: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        UserProfile {
            id: u.id,
            provider: u.provider,
            name: u.name,
            email: u.email,
            role: u.role,
            has_device_token: u.device_token.is_some(),
            subscribed_fields: u.subscribed_fields,
            created_at: u.created_at,
        }
    }
}
