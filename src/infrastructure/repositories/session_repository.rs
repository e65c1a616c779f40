//! Session Repository Implementation
//!
//! PostgreSQL implementation of the SessionRepository trait. The table is
//! append-only: rows are written at login and never touched again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{NewSession, Session, SessionRepository};
use crate::shared::error::AppError;

/// Database row representation matching the sessions table schema.
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    id: i64,
    user_id: i64,
    token: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    /// Convert database row to domain Session entity.
    fn into_session(self) -> Session {
        Session {
            id: self.id,
            user_id: self.user_id,
            token: self.token,
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}

/// PostgreSQL session repository implementation.
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    /// Create a new PgSessionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    /// Append a session row.
    async fn create(&self, session: &NewSession) -> Result<Session, AppError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            INSERT INTO sessions (user_id, token, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token, expires_at, created_at
            "#,
        )
        .bind(session.user_id)
        .bind(&session.token)
        .bind(session.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_session())
    }

    /// Look up a session by its token.
    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, AppError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, token, expires_at, created_at
            FROM sessions
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_session()))
    }

    /// List all sessions ever issued to a user, newest first.
    async fn find_by_user_id(&self, user_id: i64) -> Result<Vec<Session>, AppError> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, token, expires_at, created_at
            FROM sessions
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_session()).collect())
    }
}
