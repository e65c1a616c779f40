//! End-to-end chat flow over the hub, without a network or a database:
//! token issuing and validation, frame relay with server-verified
//! identity, fan-out ordering, and persistence-failure behavior.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{mpsc, Mutex};

use forum_chat::application::services::{ChatService, TokenError, TokenService};
use forum_chat::config::JwtSettings;
use forum_chat::domain::{ChatMessage, Role};
use forum_chat::presentation::websocket::{relay_frame, ChatHub, Connection, InboundFrame};
use forum_chat::shared::error::AppError;

/// In-memory stand-in for the persistence gateway.
struct MemoryChat {
    log: Mutex<Vec<ChatMessage>>,
    fail_writes: bool,
}

impl MemoryChat {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            log: Mutex::new(Vec::new()),
            fail_writes: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            log: Mutex::new(Vec::new()),
            fail_writes: true,
        })
    }
}

#[async_trait]
impl ChatService for MemoryChat {
    async fn save_message(
        &self,
        user_id: i64,
        username: &str,
        content: &str,
    ) -> Result<ChatMessage, AppError> {
        if self.fail_writes {
            return Err(AppError::Internal("log unavailable".into()));
        }
        let mut log = self.log.lock().await;
        let message = ChatMessage {
            id: log.len() as i64 + 1,
            user_id,
            username: username.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        log.push(message.clone());
        Ok(message)
    }

    async fn history(&self) -> Result<Vec<ChatMessage>, AppError> {
        Ok(self.log.lock().await.clone())
    }
}

fn token_service() -> TokenService {
    TokenService::new(&JwtSettings {
        secret: "an-integration-test-secret-of-32-chars!!".into(),
        token_expiry_minutes: 60,
    })
}

fn frame(json: &str) -> InboundFrame {
    serde_json::from_str(json).unwrap()
}

#[tokio::test]
async fn test_relayed_message_carries_server_verified_identity() {
    let hub = ChatHub::new(16);
    let chat = MemoryChat::new();

    let (tx_a, mut rx_a) = mpsc::unbounded_channel();
    let (tx_b, mut rx_b) = mpsc::unbounded_channel();
    hub.register(Connection::new(tx_a)).await;
    hub.register(Connection::new(tx_b)).await;

    // Alice authenticated as user 7 but her frame claims to be someone else.
    let inbound = frame(r#"{"user_id": 999, "username": "mallory", "content": "hi all"}"#);
    relay_frame(inbound, 7, "alice", chat.as_ref(), &hub).await;

    for rx in [&mut rx_a, &mut rx_b] {
        let delivered = rx.recv().await.unwrap();
        assert_eq!(delivered.user_id, 7);
        assert_eq!(delivered.username, "alice");
        assert_eq!(delivered.content, "hi all");
    }

    // The persisted row matches what was broadcast.
    let log = chat.history().await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].username, "alice");
}

#[tokio::test]
async fn test_messages_arrive_in_send_order_and_land_in_history() {
    let hub = ChatHub::new(16);
    let chat = MemoryChat::new();

    let (tx, mut rx) = mpsc::unbounded_channel();
    hub.register(Connection::new(tx)).await;

    for content in ["one", "two", "three"] {
        let inbound = frame(&format!(r#"{{"content":"{content}"}}"#));
        relay_frame(inbound, 7, "alice", chat.as_ref(), &hub).await;
    }

    assert_eq!(rx.recv().await.unwrap().content, "one");
    assert_eq!(rx.recv().await.unwrap().content, "two");
    assert_eq!(rx.recv().await.unwrap().content, "three");

    let history: Vec<String> = chat
        .history()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(history, ["one", "two", "three"]);
}

#[tokio::test]
async fn test_persistence_failure_does_not_block_broadcast() {
    let hub = ChatHub::new(16);
    let chat = MemoryChat::failing();

    let (tx, mut rx) = mpsc::unbounded_channel();
    hub.register(Connection::new(tx)).await;

    relay_frame(frame(r#"{"content":"still here"}"#), 7, "alice", chat.as_ref(), &hub).await;

    // Delivered live with a zero ID marking the missing row.
    let delivered = rx.recv().await.unwrap();
    assert_eq!(delivered.content, "still here");
    assert_eq!(delivered.id, 0);
    assert!(chat.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_disconnected_client_does_not_stop_the_room() {
    let hub = ChatHub::new(16);
    let chat = MemoryChat::new();

    let (tx_gone, rx_gone) = mpsc::unbounded_channel();
    hub.register(Connection::new(tx_gone)).await;
    drop(rx_gone);

    let (tx_live, mut rx_live) = mpsc::unbounded_channel();
    hub.register(Connection::new(tx_live)).await;

    relay_frame(frame(r#"{"content":"anyone?"}"#), 7, "alice", chat.as_ref(), &hub).await;

    assert_eq!(rx_live.recv().await.unwrap().content, "anyone?");
    assert_eq!(hub.connection_count().await, 1);
}

#[tokio::test]
async fn test_issued_token_round_trips_through_validation() {
    let tokens = token_service();

    let issued = tokens.issue(7, Role::User).unwrap();
    let claims = tokens.validate(&issued.token).unwrap();

    assert_eq!(claims.user_id, 7);
    assert_eq!(claims.role, Role::User);
}

#[tokio::test]
async fn test_garbage_token_never_reaches_the_hub() {
    let tokens = token_service();
    let hub = ChatHub::new(16);

    // The handler validates before registering; a garbage token stops
    // the flow right here, and the live set stays untouched.
    let result = tokens.validate("not.a.token");
    assert!(matches!(result, Err(TokenError::Invalid)));
    assert_eq!(hub.connection_count().await, 0);
}

#[tokio::test]
async fn test_token_from_another_secret_is_rejected() {
    let ours = token_service();
    let theirs = TokenService::new(&JwtSettings {
        secret: "a-completely-different-32-char-secret!!!".into(),
        token_expiry_minutes: 60,
    });

    let foreign = theirs.issue(7, Role::User).unwrap();
    assert!(matches!(
        ours.validate(&foreign.token),
        Err(TokenError::Invalid)
    ));
}
