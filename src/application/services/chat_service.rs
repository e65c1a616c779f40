//! Chat Service
//!
//! The persistence gateway for chat messages: durably appends each
//! accepted frame and supplies ordered history for replay. Persistence is
//! deliberately decoupled from broadcast; callers decide what to do when a
//! write fails (the connection handler logs and broadcasts anyway).

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ChatMessage, ChatMessageRepository, NewChatMessage};
use crate::shared::error::AppError;

/// Chat persistence gateway trait for dependency injection
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Durably append a message, returning it with its assigned ID and
    /// server timestamp.
    async fn save_message(
        &self,
        user_id: i64,
        username: &str,
        content: &str,
    ) -> Result<ChatMessage, AppError>;

    /// Prior messages in ascending creation order, for replay.
    async fn history(&self) -> Result<Vec<ChatMessage>, AppError>;
}

/// ChatService implementation backed by a message repository.
pub struct ChatServiceImpl<R>
where
    R: ChatMessageRepository,
{
    repo: Arc<R>,
    history_limit: i64,
}

impl<R> ChatServiceImpl<R>
where
    R: ChatMessageRepository,
{
    pub fn new(repo: Arc<R>, history_limit: i64) -> Self {
        Self {
            repo,
            history_limit,
        }
    }
}

#[async_trait]
impl<R> ChatService for ChatServiceImpl<R>
where
    R: ChatMessageRepository + 'static,
{
    async fn save_message(
        &self,
        user_id: i64,
        username: &str,
        content: &str,
    ) -> Result<ChatMessage, AppError> {
        let message = self
            .repo
            .create(&NewChatMessage {
                user_id,
                username: username.to_string(),
                content: content.to_string(),
            })
            .await?;

        crate::infrastructure::metrics::MESSAGES_PERSISTED_TOTAL.inc();

        Ok(message)
    }

    async fn history(&self) -> Result<Vec<ChatMessage>, AppError> {
        self.repo.list_recent(self.history_limit).await
    }
}
