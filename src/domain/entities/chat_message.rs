//! Chat message entity and repository trait.
//!
//! Maps to the `chat_messages` table. Messages are immutable and
//! append-only; no update or delete path exists.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A persisted chat message.
///
/// The username is captured at send time so history replay shows the name
/// the sender had when the message was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Monotonically increasing identifier (BIGSERIAL)
    pub id: i64,

    /// Server-verified sender ID
    pub user_id: i64,

    /// Server-verified sender name at send time
    pub username: String,

    /// Message body
    pub content: String,

    /// Server-assigned creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Fields for a new message; the ID and timestamp are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub user_id: i64,
    pub username: String,
    pub content: String,
}

/// Repository trait for chat message persistence.
#[async_trait]
pub trait ChatMessageRepository: Send + Sync {
    /// Durably append a message, returning it with its assigned ID and
    /// timestamp.
    async fn create(&self, message: &NewChatMessage) -> Result<ChatMessage, AppError>;

    /// Return up to `limit` prior messages in ascending creation order.
    async fn list_recent(&self, limit: i64) -> Result<Vec<ChatMessage>, AppError>;
}
