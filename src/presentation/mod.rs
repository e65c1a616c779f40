//! Presentation Layer
//!
//! HTTP routes and handlers, WebSocket chat, and middleware.

pub mod http;
pub mod middleware;
pub mod websocket;
