//! Authentication Service
//!
//! User registration, credential checks, and the login flow that issues a
//! token and appends its session audit row.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;

use crate::application::services::token_service::{TokenClaims, TokenError, TokenService};
use crate::domain::{NewSession, Role, SessionRepository, User, UserRepository};

/// Authentication service trait for dependency injection
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user with the default role
    async fn register(&self, username: &str, password: &str) -> Result<User, AuthError>;

    /// Authenticate with credentials, issuing a token and recording a session
    async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError>;

    /// Validate a token and extract the identity it encodes
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;

    /// Resolve the full user behind a valid token
    async fn get_current_user(&self, token: &str) -> Result<User, AuthError>;
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username already exists")]
    UsernameExists,

    #[error("User not found")]
    UserNotFound,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// AuthService implementation
pub struct AuthServiceImpl<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    token_service: TokenService,
}

impl<U, S> AuthServiceImpl<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>, token_service: TokenService) -> Self {
        Self {
            user_repo,
            session_repo,
            token_service,
        }
    }

    /// Hash a password using Argon2id
    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against its hash
    fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[async_trait]
impl<U, S> AuthService for AuthServiceImpl<U, S>
where
    U: UserRepository + 'static,
    S: SessionRepository + 'static,
{
    async fn register(&self, username: &str, password: &str) -> Result<User, AuthError> {
        if self
            .user_repo
            .username_exists(username)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
        {
            return Err(AuthError::UsernameExists);
        }

        let password_hash = self.hash_password(password)?;

        self.user_repo
            .create(username, &password_hash, Role::User)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        // Unknown username and wrong password are indistinguishable to the caller.
        let user = self
            .user_repo
            .find_by_username(username)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.token_service.issue(user.id, user.role)?;

        // The session row is the audit trail of the issued token. If it
        // cannot be written the whole login fails; a token is never handed
        // out without its record.
        self.session_repo
            .create(&NewSession {
                user_id: user.id,
                token: issued.token.clone(),
                expires_at: issued.expires_at,
            })
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(LoginOutcome {
            user,
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        Ok(self.token_service.validate(token)?)
    }

    async fn get_current_user(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.validate_token(token)?;

        self.user_repo
            .find_by_id(claims.user_id)
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?
            .ok_or(AuthError::UserNotFound)
    }
}
