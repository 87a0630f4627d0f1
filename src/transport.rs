//! Backend transport module
//!
//! This module handles communication with the AgroConecta backend:
//! - The [`MessageApi`] trait, the seam the controller and compose screen
//!   call through (and tests mock)
//! - [`HttpTransport`], the reqwest-based implementation with bearer-token
//!   authentication
//! - The backend's `{success, data, error}` response envelope
//!
//! Every call resolves to `Result<T, ApiError>`; HTTP failures keep the
//! status code and the server's error message so callers can classify them.

use crate::auth::Session;
use crate::config::ClientConfig;
use crate::model::{
    Conversation, MarkReadReceipt, Message, NewMessage, NewNotification, Notification,
};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Result type for transport operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Transport-level error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// The request never reached the backend (DNS, connect, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// The backend rejected the request
    #[error("Server returned {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Error message from the response envelope, or the status text
        message: String,
    },

    /// The response body could not be decoded
    #[error("Invalid response payload: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status code, when the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Backend response envelope: `{success: true, data} | {success: false, error}`
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

/// Body for the mark-as-read endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkReadRequest {
    from_user_id: i64,
    to_user_id: i64,
}

/// Messaging operations exposed by the backend
///
/// The controller and compose screen depend on this trait rather than on the
/// concrete HTTP client, so tests can substitute a scripted implementation.
#[async_trait]
pub trait MessageApi: Send + Sync {
    /// Fetch the current user's conversation list
    async fn get_conversations(&self) -> ApiResult<Vec<Conversation>>;

    /// Fetch all messages exchanged between two users, oldest first
    async fn get_messages_between(&self, user_a: i64, user_b: i64) -> ApiResult<Vec<Message>>;

    /// Mark every message from `from_user_id` to `to_user_id` as read
    async fn mark_messages_as_read(
        &self,
        from_user_id: i64,
        to_user_id: i64,
    ) -> ApiResult<MarkReadReceipt>;

    /// Create a new message
    async fn send_message(&self, payload: &NewMessage) -> ApiResult<Message>;

    /// Create a notification
    async fn create_notification(&self, payload: &NewNotification) -> ApiResult<Notification>;
}

/// HTTP transport backed by reqwest
///
/// Reads the bearer token from the injected [`Session`] on every request, so
/// sign-in and sign-out take effect immediately without rebuilding the client.
pub struct HttpTransport {
    base_url: String,
    client: reqwest::Client,
    session: Arc<Session>,
}

impl HttpTransport {
    /// Create a new transport from configuration
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built
    pub fn new(config: &ClientConfig, session: Arc<Session>) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            client,
            session,
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(token) = self.session.token().await {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.map_err(|e| {
            warn!("Request to {} failed: {}", url, e);
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Envelope<serde_json::Value>>(&bytes)
                .ok()
                .and_then(|envelope| envelope.error)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                });
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> =
            serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))?;

        if !envelope.success {
            return Err(ApiError::Http {
                status: status.as_u16(),
                message: envelope
                    .error
                    .unwrap_or_else(|| "request rejected".to_string()),
            });
        }

        envelope
            .data
            .ok_or_else(|| ApiError::Decode("missing data field in response".to_string()))
    }
}

#[async_trait]
impl MessageApi for HttpTransport {
    async fn get_conversations(&self) -> ApiResult<Vec<Conversation>> {
        self.execute(Method::GET, "/api/messages/conversations", None)
            .await
    }

    async fn get_messages_between(&self, user_a: i64, user_b: i64) -> ApiResult<Vec<Message>> {
        let path = format!("/api/messages/between/{}/{}", user_a, user_b);
        self.execute(Method::GET, &path, None).await
    }

    async fn mark_messages_as_read(
        &self,
        from_user_id: i64,
        to_user_id: i64,
    ) -> ApiResult<MarkReadReceipt> {
        let body = MarkReadRequest {
            from_user_id,
            to_user_id,
        };
        let body = serde_json::to_value(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.execute(Method::PUT, "/api/messages/read", Some(body))
            .await
    }

    async fn send_message(&self, payload: &NewMessage) -> ApiResult<Message> {
        let body = serde_json::to_value(payload).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.execute(Method::POST, "/api/messages", Some(body)).await
    }

    async fn create_notification(&self, payload: &NewNotification) -> ApiResult<Notification> {
        let body = serde_json::to_value(payload).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.execute(Method::POST, "/api/notifications", Some(body))
            .await
    }
}
