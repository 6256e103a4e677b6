//! Firebase Cloud Messaging client
//!
//! Sends push notifications to individual device tokens. Errors are
//! returned per device so delivery loops can log and continue.

use reqwest::Client;
use serde::{Deserialize, Serialize};

/// FCM push client
#[derive(Clone)]
pub struct FcmClient {
    api_endpoint: String,
    server_key: String,
    http_client: Client,
}

/// A push notification payload
#[derive(Debug, Clone, Serialize)]
pub struct PushNotification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
struct FcmSendRequest<'a> {
    to: &'a str,
    notification: &'a PushNotification,
}

#[derive(Debug, Deserialize)]
struct FcmSendResponse {
    success: Option<i64>,
    #[serde(default)]
    results: Vec<FcmResult>,
}

#[derive(Debug, Deserialize)]
struct FcmResult {
    error: Option<String>,
}

impl FcmClient {
    /// Create a new FCM client
    pub fn new(api_endpoint: String, server_key: String) -> Self {
        Self {
            api_endpoint,
            server_key,
            http_client: Client::new(),
        }
    }

    /// Send a notification to a single device token
    pub async fn send_to_device(
        &self,
        device_token: &str,
        notification: &PushNotification,
    ) -> Result<(), String> {
        let request = FcmSendRequest {
            to: device_token,
            notification,
        };

        let response = self
            .http_client
            .post(&self.api_endpoint)
            .header("Authorization", format!("key={}", self.server_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("Failed to send push: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("FCM returned {}: {}", status, body));
        }

        let body: FcmSendResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse FCM response: {}", e))?;

        if body.success == Some(0) {
            let reason = body
                .results
                .into_iter()
                .find_map(|r| r.error)
                .unwrap_or_else(|| "Unknown delivery error".to_string());
            return Err(reason);
        }

        Ok(())
    }
}
