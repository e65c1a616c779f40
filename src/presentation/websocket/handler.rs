//! WebSocket Connection Handler
//!
//! Authentication happens before the HTTP upgrade: a request with a
//! missing or bad token is rejected with a plain HTTP error and never
//! becomes a WebSocket. Once upgraded, each connection runs a writer
//! task (owns the sink) and a read loop (owns the stream), bridged to
//! the hub through an unbounded per-connection channel.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header::AUTHORIZATION, HeaderMap},
    response::Response,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::application::dto::MessageResponse;
use crate::application::services::{ChatService, ChatServiceImpl, TokenError};
use crate::domain::{ChatMessage, User, UserRepository};
use crate::infrastructure::repositories::{PgChatMessageRepository, PgUserRepository};
use crate::presentation::websocket::frames::InboundFrame;
use crate::presentation::websocket::hub::{ChatHub, Connection};
use crate::shared::error::AppError;
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct WsAuthParams {
    token: Option<String>,
}

/// GET /ws/chat - authenticate, then upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsAuthParams>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    // Browsers cannot set headers on WebSocket requests, so the token
    // rides the query string; the Authorization header is the fallback.
    let token = params
        .token
        .filter(|t| !t.is_empty())
        .or_else(|| bearer_from_headers(&headers))
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".into()))?;

    let claims = state.token_service.validate(&token).map_err(|e| match e {
        TokenError::Expired => AppError::Forbidden("Token expired".into()),
        _ => AppError::Forbidden("Invalid token".into()),
    })?;

    let user_repo = PgUserRepository::new(state.db.clone());
    let user = user_repo
        .find_by_id(claims.user_id)
        .await
        .map_err(|e| AppError::UpstreamUnavailable(e.to_string()))?
        .ok_or_else(|| AppError::Forbidden("Unknown user".into()))?;

    let max_message_size = state.settings.websocket.max_message_size;
    Ok(ws
        .max_message_size(max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state, user)))
}

fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
}

/// Per-connection lifecycle: register, replay history, relay inbound
/// frames, unregister on any exit.
async fn handle_socket(socket: WebSocket, state: AppState, user: User) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ChatMessage>();

    // Writer task: sole owner of the sink. Ends when every sender is
    // dropped or a write fails, then closes the transport.
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let frame = MessageResponse::from(message);
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode outbound frame");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let chat_service = ChatServiceImpl::new(
        Arc::new(PgChatMessageRepository::new(state.db.clone())),
        state.settings.hub.history_limit,
    );

    let connection = Connection::new(tx.clone());
    let connection_id = connection.id;
    state.hub.register(connection).await;
    tracing::info!(
        user_id = user.id,
        username = %user.username,
        %connection_id,
        "Chat client connected"
    );

    // Replay the backlog down this connection's own channel, oldest first.
    // A replay failure degrades to live-only chat.
    match chat_service.history().await {
        Ok(backlog) => {
            for message in backlog {
                if tx.send(message).is_err() {
                    break;
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, user_id = user.id, "History replay failed");
        }
    }

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let inbound: InboundFrame = match serde_json::from_str(&text) {
                    Ok(inbound) => inbound,
                    Err(e) => {
                        // An unparseable frame ends the session; the client
                        // reconnects with a clean slate.
                        tracing::debug!(
                            error = %e,
                            user_id = user.id,
                            "Malformed chat frame, closing connection"
                        );
                        break;
                    }
                };
                relay_frame(inbound, user.id, &user.username, &chat_service, &state.hub).await;
            }
            Ok(Message::Close(_)) | Err(_) => break,
            // Ping/pong handled by axum; binary frames ignored.
            _ => {}
        }
    }

    state.hub.unregister(connection_id).await;
    tracing::info!(
        user_id = user.id,
        username = %user.username,
        %connection_id,
        "Chat client disconnected"
    );
}

/// Persist an inbound frame and fan it out. The identity attached to the
/// broadcast is always the authenticated one; client-asserted fields were
/// dropped at decode time.
///
/// Persistence failure does not block the broadcast: the frame is still
/// fanned out with a zero ID marking the missing row.
pub async fn relay_frame<C: ChatService>(
    frame: InboundFrame,
    user_id: i64,
    username: &str,
    chat_service: &C,
    hub: &ChatHub,
) {
    let message = match chat_service
        .save_message(user_id, username, &frame.content)
        .await
    {
        Ok(saved) => saved,
        Err(e) => {
            tracing::warn!(error = %e, user_id, "Failed to persist chat message");
            ChatMessage {
                id: 0,
                user_id,
                username: username.to_string(),
                content: frame.content,
                created_at: Utc::now(),
            }
        }
    };

    hub.broadcast(message).await;
}
