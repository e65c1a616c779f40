//! Configuration Management
//!
//! Layered settings loaded from files and environment variables.

pub mod settings;

pub use settings::{
    CorsSettings, DatabaseSettings, HubSettings, JwtSettings, ServerSettings, Settings,
    WebSocketSettings, MIN_JWT_SECRET_LENGTH,
};
