//! Tests for account model invariants
//!
//! Covers credential consistency (local accounts carry a password hash,
//! external accounts a provider subject id) and the guarantee that the
//! password hash never appears in serialized output.

use chrono::Utc;
use shared::{AuthProvider, User, UserProfile, UserRole};
use std::str::FromStr;
use uuid::Uuid;

fn local_user() -> User {
    User {
        id: Uuid::new_v4(),
        provider: AuthProvider::Local,
        name: "Asha Devi".to_string(),
        email: "asha@example.com".to_string(),
        password_hash: Some("$2b$12$abcdefghijklmnopqrstuv".to_string()),
        external_subject_id: None,
        role: UserRole::User,
        device_token: None,
        subscribed_fields: vec![],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn external_user() -> User {
    User {
        provider: AuthProvider::ExternalIdp,
        password_hash: None,
        external_subject_id: Some("oidc|6423abc".to_string()),
        ..local_user()
    }
}

// =============================================================================
// Credential Consistency Tests
// =============================================================================

mod credential_consistency {
    use super::*;

    #[test]
    fn local_account_with_hash_is_consistent() {
        assert!(local_user().credentials_consistent());
    }

    #[test]
    fn local_account_without_hash_is_inconsistent() {
        let mut user = local_user();
        user.password_hash = None;
        assert!(!user.credentials_consistent());
    }

    #[test]
    fn local_account_with_subject_id_is_inconsistent() {
        let mut user = local_user();
        user.external_subject_id = Some("oidc|999".to_string());
        assert!(!user.credentials_consistent());
    }

    #[test]
    fn external_account_with_subject_id_is_consistent() {
        assert!(external_user().credentials_consistent());
    }

    #[test]
    fn external_account_with_password_is_inconsistent() {
        let mut user = external_user();
        user.password_hash = Some("$2b$12$abcdefghijklmnopqrstuv".to_string());
        assert!(!user.credentials_consistent());
    }

    #[test]
    fn external_account_without_subject_id_is_inconsistent() {
        let mut user = external_user();
        user.external_subject_id = None;
        assert!(!user.credentials_consistent());
    }
}

// =============================================================================
// Serialization Safety Tests
// =============================================================================

mod serialization {
    use super::*;

    #[test]
    fn password_hash_never_serialized() {
        let json = serde_json::to_string(&local_user()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("$2b$12$"));
    }

    #[test]
    fn profile_exposes_token_presence_not_value() {
        let mut user = local_user();
        user.device_token = Some("fcm-token-xyz".to_string());

        let profile: UserProfile = user.into();
        assert!(profile.has_device_token);

        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("fcm-token-xyz"));
    }

    #[test]
    fn profile_without_token() {
        let profile: UserProfile = local_user().into();
        assert!(!profile.has_device_token);
    }

    #[test]
    fn provider_serializes_as_snake_case() {
        let json = serde_json::to_string(&AuthProvider::ExternalIdp).unwrap();
        assert_eq!(json, "\"external_idp\"");
    }
}

// =============================================================================
// Provider Parsing Tests
// =============================================================================

mod provider_parsing {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for provider in [AuthProvider::Local, AuthProvider::ExternalIdp] {
            let parsed = AuthProvider::from_str(provider.as_str()).unwrap();
            assert_eq!(parsed, provider);
        }
    }

    #[test]
    fn unknown_provider_rejected() {
        assert!(AuthProvider::from_str("facebook").is_err());
        assert!(AuthProvider::from_str("").is_err());
    }
}
