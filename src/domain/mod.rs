//! # Domain Layer
//!
//! Core entities and repository contracts, independent of any framework
//! or infrastructure concern.
//!
//! - **entities**: User, Session, ChatMessage and their repository traits
//!
//! Repository traits are defined here so the application layer depends on
//! contracts rather than on PostgreSQL implementations.

pub mod entities;

pub use entities::*;
