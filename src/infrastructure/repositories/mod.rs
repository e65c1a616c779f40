//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! - **UserRepository** - user accounts
//! - **SessionRepository** - append-only token audit trail
//! - **ChatMessageRepository** - append-only chat log

pub mod chat_message_repository;
pub mod session_repository;
pub mod user_repository;

pub use chat_message_repository::PgChatMessageRepository;
pub use session_repository::PgSessionRepository;
pub use user_repository::PgUserRepository;
