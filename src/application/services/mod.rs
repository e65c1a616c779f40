//! Application Services
//!
//! Business logic services orchestrating domain entities and repositories.

pub mod auth_service;
pub mod chat_service;
pub mod token_service;

pub use auth_service::{AuthError, AuthService, AuthServiceImpl, LoginOutcome};
pub use chat_service::{ChatService, ChatServiceImpl};
pub use token_service::{Claims, IssuedToken, TokenClaims, TokenError, TokenService};
