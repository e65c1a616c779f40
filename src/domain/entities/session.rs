//! Session entity and repository trait.
//!
//! Maps to the `sessions` table. A session is the append-only audit record
//! of an issued token: one row per login event, never mutated, never swept.
//! Expiry is enforced at token validation time only, by comparing
//! timestamps; nothing revokes a session once written.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Audit record of an issued token.
///
/// A user may hold multiple concurrent sessions; there is no uniqueness
/// constraint across users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Primary key
    pub id: i64,

    /// User the token was issued to
    pub user_id: i64,

    /// The issued token, verbatim
    #[serde(skip_serializing)]
    pub token: String,

    /// When the token expires
    pub expires_at: DateTime<Utc>,

    /// When the session was created (login time)
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Check whether the session's token is still within its lifetime.
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Fields for a new session row; the ID and creation timestamp are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Repository trait for Session data access operations.
///
/// The store is append-only: there is no update, revoke, or sweep
/// operation by design.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Append a session row. Callers must treat a failure here as fatal to
    /// the login attempt: a token is never handed out without its audit row.
    async fn create(&self, session: &NewSession) -> Result<Session, AppError>;

    /// Look up a session by its token.
    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, AppError>;

    /// List all sessions ever issued to a user, newest first.
    async fn find_by_user_id(&self, user_id: i64) -> Result<Vec<Session>, AppError>;
}
