//! Domain Entities
//!
//! Core entities and their repository traits.

pub mod chat_message;
pub mod session;
pub mod user;

pub use chat_message::{ChatMessage, ChatMessageRepository, NewChatMessage};
pub use session::{NewSession, Session, SessionRepository};
pub use user::{Role, User, UserRepository};
