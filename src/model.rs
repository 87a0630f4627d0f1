//! Domain model
//!
//! Wire types exchanged with the AgroConecta backend:
//! - Conversation summaries and their denormalized last-message snapshot
//! - Individual messages
//! - Outgoing message and notification payloads
//!
//! The backend is a JSON REST API with camelCase field names; every type here
//! maps 1:1 onto its wire representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the user on the other side of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// Backend user id
    pub id: i64,
    /// First name
    pub name: String,
    /// Last name
    pub lastname: String,
    /// Contact email
    pub email: String,
    /// Contact phone, if the user has published one
    #[serde(default)]
    pub phone: Option<String>,
    /// City of residence
    #[serde(default)]
    pub city: Option<String>,
    /// Department (state) of residence
    #[serde(default)]
    pub department: Option<String>,
}

impl UserSummary {
    /// Full display name ("name lastname")
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.lastname)
    }

    /// Location string in the backend's "City,Department" form, when both
    /// parts are present
    pub fn location(&self) -> Option<String> {
        match (&self.city, &self.department) {
            (Some(city), Some(department)) => Some(format!("{},{}", city, department)),
            (Some(city), None) => Some(city.clone()),
            _ => None,
        }
    }
}

/// Denormalized snapshot of the most recent message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastMessage {
    /// Message text
    pub content: String,
    /// When the message was sent
    pub sent_at: DateTime<Utc>,
    /// Id of the user who sent it
    pub sender_id: i64,
}

/// A conversation between the current user and one other user
///
/// Conversation rows are server-authoritative: the list is replaced wholesale
/// on every fetch. Individual fields are optimistically patched after a
/// successful send and reconciled by the next fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// The other participant
    pub other_user: UserSummary,
    /// Snapshot of the most recent message
    pub last_message: LastMessage,
    /// Messages from `other_user` not yet acknowledged read
    pub unread_count: u32,
    /// Total messages in the thread
    pub message_count: u32,
    /// Timestamp used for sorting and display
    pub last_message_time: DateTime<Utc>,
}

/// A single message in a thread
///
/// Immutable once created, except `is_read` which transitions false→true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Backend message id
    pub id: i64,
    /// Message text
    pub content: String,
    /// Sender user id
    pub sender_id: i64,
    /// Receiver user id
    pub receiver_id: i64,
    /// When the message was sent
    pub sent_at: DateTime<Utc>,
    /// Whether the receiver has read the message (absent on the wire means unread)
    #[serde(default)]
    pub is_read: bool,
    /// Whether the message has been delivered
    #[serde(default)]
    pub is_delivered: bool,
}

/// Payload for creating a new message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    /// Message text
    pub content: String,
    /// Receiver user id
    pub receiver_id: i64,
}

/// Receipt returned by the mark-as-read endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadReceipt {
    /// Number of messages the backend flipped to read
    pub marked_count: u32,
}

/// Payload for creating a notification (compose screen submission)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    /// Notification title
    pub title: String,
    /// Notification body
    pub message: String,
    /// Sending user id
    pub sender_id: i64,
    /// Receiving user id
    pub recipient_id: i64,
    /// Backend event discriminator (see [`crate::screens`])
    pub event: String,
}

/// A notification as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Backend notification id
    pub id: i64,
    /// Notification title
    pub title: String,
    /// Notification body
    pub message: String,
    /// Sending user id
    pub sender_id: i64,
    /// Receiving user id
    pub recipient_id: i64,
    /// Backend event discriminator
    pub event: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
