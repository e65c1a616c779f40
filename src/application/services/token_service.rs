//! Token Service
//!
//! Issues and validates signed, time-limited JWTs. Stateless apart from
//! the signing secret: validation is a pure function of the token and the
//! current time.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtSettings;
use crate::domain::Role;

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Role granted at issue time
    pub role: Role,
    /// Issued at time (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Decoded identity extracted from a valid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenClaims {
    pub user_id: i64,
    pub role: Role,
}

/// A freshly issued token together with its expiry, so callers can record
/// the exact deadline without re-decoding.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Token errors
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

/// Issues and validates HS256-signed tokens.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    ttl: Duration,
}

impl TokenService {
    pub fn new(settings: &JwtSettings) -> Self {
        Self {
            secret: settings.secret.clone(),
            ttl: Duration::minutes(settings.token_expiry_minutes),
        }
    }

    /// Produce a signed token for the given identity.
    ///
    /// Fails only on signing-key misconfiguration; callers treat that as
    /// unrecoverable rather than retrying.
    pub fn issue(&self, user_id: i64, role: Role) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature and expiry, and extract the encoded identity.
    ///
    /// The accepted algorithm is pinned to HS256; tokens signed with any
    /// other algorithm are rejected outright, which guards against
    /// signature-stripping and downgrade attacks.
    pub fn validate(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })?;

        let user_id = token_data
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| TokenError::Invalid)?;

        Ok(TokenClaims {
            user_id,
            role: token_data.claims.role,
        })
    }
}
