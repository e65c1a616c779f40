//! Chat History Handler

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::application::dto::response::MessageResponse;
use crate::application::services::{ChatService, ChatServiceImpl};
use crate::infrastructure::repositories::PgChatMessageRepository;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// GET /api/v1/chat/messages - the retained backlog, oldest first.
///
/// Same shape as the WebSocket frames, so a client can seed its view from
/// here and splice live traffic in without translating.
pub async fn get_messages(
    State(state): State<AppState>,
) -> Result<Json<Vec<MessageResponse>>, AppError> {
    let chat_service = ChatServiceImpl::new(
        Arc::new(PgChatMessageRepository::new(state.db.clone())),
        state.settings.hub.history_limit,
    );

    let messages = chat_service.history().await?;

    Ok(Json(
        messages.into_iter().map(MessageResponse::from).collect(),
    ))
}
