//! Router-level tests driven through `tower::ServiceExt::oneshot`.
//!
//! The pool is created lazily against an unreachable address, so routes
//! that never touch the database (health, metrics, auth rejections) can
//! be exercised without any infrastructure.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use forum_chat::application::services::TokenService;
use forum_chat::config::{
    CorsSettings, DatabaseSettings, HubSettings, JwtSettings, ServerSettings, Settings,
    WebSocketSettings,
};
use forum_chat::domain::Role;
use forum_chat::presentation::http::create_router;
use forum_chat::presentation::websocket::ChatHub;
use forum_chat::startup::AppState;

const TEST_SECRET: &str = "router-test-secret-of-at-least-32-chars";

fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseSettings {
            // Nothing listens here; routes under test must not need it.
            url: "postgres://postgres@127.0.0.1:1/unreachable".into(),
            max_connections: 1,
            min_connections: 0,
            acquire_timeout: 1,
        },
        jwt: JwtSettings {
            secret: TEST_SECRET.into(),
            token_expiry_minutes: 60,
        },
        hub: HubSettings {
            command_buffer: 16,
            history_limit: 50,
        },
        cors: CorsSettings {
            allowed_origins: vec![],
        },
        websocket: WebSocketSettings {
            max_message_size: 65536,
        },
        environment: "test".into(),
    }
}

fn test_router() -> Router {
    let settings = test_settings();
    let db = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(1))
        .connect_lazy(&settings.database.url)
        .expect("lazy pool");

    let state = AppState {
        db,
        token_service: TokenService::new(&settings.jwt),
        hub: ChatHub::new(settings.hub.command_buffer),
        settings: Arc::new(settings),
    };
    create_router(state)
}

fn ws_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("connection", "upgrade")
        .header("upgrade", "websocket")
        .header("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ==")
        .header("sec-websocket-version", "13")
        .body(Body::empty())
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint_reports_healthy() {
    let response = test_router()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("healthy"));
}

#[tokio::test]
async fn test_liveness_endpoint() {
    let response = test_router()
        .oneshot(
            Request::builder()
                .uri("/health/live")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_hub_metrics() {
    let response = test_router()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("forum_chat_websocket_connections_active"));
}

#[tokio::test]
async fn test_ws_upgrade_without_token_is_unauthorized() {
    let response = test_router().oneshot(ws_request("/ws/chat")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ws_upgrade_with_garbage_token_is_forbidden() {
    let response = test_router()
        .oneshot(ws_request("/ws/chat?token=garbage"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_ws_upgrade_with_expired_token_is_forbidden() {
    let expired = TokenService::new(&JwtSettings {
        secret: TEST_SECRET.into(),
        token_expiry_minutes: -5,
    })
    .issue(1, Role::User)
    .unwrap();

    let response = test_router()
        .oneshot(ws_request(&format!("/ws/chat?token={}", expired.token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_history_without_bearer_is_unauthorized() {
    let response = test_router()
        .oneshot(
            Request::builder()
                .uri("/api/v1/chat/messages")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_history_with_garbage_bearer_is_forbidden() {
    let response = test_router()
        .oneshot(
            Request::builder()
                .uri("/api/v1/chat/messages")
                .header("authorization", "Bearer garbage")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_register_with_short_password_is_rejected() {
    let response = test_router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/register")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"username":"alice","password":"short"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    // Validation runs before any repository call, so no database is needed.
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
