//! Chat Message Repository Implementation
//!
//! PostgreSQL implementation of chat message persistence. The table is an
//! append-only log: inserts and ordered reads only.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{ChatMessage, ChatMessageRepository, NewChatMessage};
use crate::shared::error::AppError;

/// Database row representation matching the chat_messages table schema.
#[derive(Debug, sqlx::FromRow)]
struct ChatMessageRow {
    id: i64,
    user_id: i64,
    username: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl ChatMessageRow {
    /// Convert database row to domain ChatMessage entity.
    fn into_message(self) -> ChatMessage {
        ChatMessage {
            id: self.id,
            user_id: self.user_id,
            username: self.username,
            content: self.content,
            created_at: self.created_at,
        }
    }
}

/// PostgreSQL chat message repository implementation.
#[derive(Clone)]
pub struct PgChatMessageRepository {
    pool: PgPool,
}

impl PgChatMessageRepository {
    /// Create a new PgChatMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatMessageRepository for PgChatMessageRepository {
    /// Append a message; the database assigns the ID and timestamp.
    async fn create(&self, message: &NewChatMessage) -> Result<ChatMessage, AppError> {
        let row = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            INSERT INTO chat_messages (user_id, username, content)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, username, content, created_at
            "#,
        )
        .bind(message.user_id)
        .bind(&message.username)
        .bind(&message.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_message())
    }

    /// Return up to `limit` messages in ascending creation order.
    async fn list_recent(&self, limit: i64) -> Result<Vec<ChatMessage>, AppError> {
        // Newest N selected first, then flipped so replay runs oldest to
        // newest.
        let rows = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            SELECT id, user_id, username, content, created_at
            FROM (
                SELECT id, user_id, username, content, created_at
                FROM chat_messages
                ORDER BY created_at DESC, id DESC
                LIMIT $1
            ) recent
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_message()).collect())
    }
}
