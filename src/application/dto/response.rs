//! Response DTOs
//!
//! Data structures for API response bodies. `MessageResponse` is the
//! single wire shape for chat messages, shared by the REST history
//! endpoint and the WebSocket fan-out.

use serde::{Deserialize, Serialize};

use crate::application::services::LoginOutcome;
use crate::domain::{ChatMessage, User};

/// User response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role.as_str().to_string(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Registration response
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
}

/// Login response (token plus identity)
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: String,
    pub username: String,
    pub expires_at: String,
}

impl From<LoginOutcome> for TokenResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            token: outcome.token,
            token_type: "Bearer".to_string(),
            username: outcome.user.username,
            expires_at: outcome.expires_at.to_rfc3339(),
        }
    }
}

/// Chat message as delivered to clients, mirroring the persisted shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub content: String,
    pub created_at: String,
}

impl From<ChatMessage> for MessageResponse {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            user_id: message.user_id,
            username: message.username,
            content: message.content,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}
