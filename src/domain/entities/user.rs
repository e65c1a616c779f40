//! User entity and repository trait.
//!
//! Maps to the `users` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// User role enum matching database VARCHAR constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a user account.
///
/// Maps to the `users` table:
/// - id: BIGSERIAL PRIMARY KEY
/// - username: VARCHAR(32) NOT NULL UNIQUE
/// - password_hash: VARCHAR(255) NOT NULL
/// - role: VARCHAR(20) NOT NULL DEFAULT 'user'
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
///
/// Accounts are immutable after registration except for role, which this
/// service never mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Primary key
    pub id: i64,

    /// Username (2-32 characters, unique)
    pub username: String,

    /// Argon2 password hash (never the plaintext secret)
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// User's role
    #[serde(default)]
    pub role: Role,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Repository trait for User data access operations.
///
/// Implementations of this trait handle the actual database interactions.
/// The trait is defined in the domain layer to maintain dependency inversion.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by their internal ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Find a user by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Create a new user, returning it with the assigned ID.
    async fn create(&self, username: &str, password_hash: &str, role: Role)
        -> Result<User, AppError>;

    /// Check if a username is already taken.
    async fn username_exists(&self, username: &str) -> Result<bool, AppError>;
}
