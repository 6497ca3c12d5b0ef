//! JWT access/refresh token creation and verification.
//!
//! Two token kinds exist, each signed with its own secret: short-lived access
//! tokens authorize API requests, long-lived refresh tokens mint new access
//! tokens. A `typ` claim records the kind so a token can never be replayed as
//! the other kind even if the secrets were ever set to the same value.
//!
//! There is no server-side revocation: a token stays valid until its `exp`
//! passes. Logout only clears the browser cookie.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

use crate::{config::Config, errors::Error, types::UserId};

/// Which of the two token families a JWT belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// JWT claims carried by both token kinds
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: UserId, // Subject (user ID)
    #[serde(rename = "typ")]
    pub kind: TokenKind, // Token family
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
}

impl TokenClaims {
    /// Create new claims for a user, expiring per the configured lifetime for `kind`
    pub fn new(user_id: UserId, kind: TokenKind, config: &Config) -> Self {
        let now = Utc::now();
        let expiry = match kind {
            TokenKind::Access => config.auth.access_token_expiry,
            TokenKind::Refresh => config.auth.refresh_token_expiry,
        };
        let exp = now + expiry;

        Self {
            sub: user_id,
            kind,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Why a token failed verification.
///
/// The caller decides how much of this to reveal; the API deliberately
/// collapses the first four into a single 403.
#[derive(ThisError, Debug)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("signature verification failed")]
    BadSignature,
    #[error("malformed token")]
    Malformed,
    #[error("token is not a {0} token")]
    WrongKind(TokenKind),
    #[error("token service failure: {0}")]
    Internal(String),
}

fn secret_for(kind: TokenKind, config: &Config) -> Result<&str, Error> {
    let secret = match kind {
        TokenKind::Access => config.access_token_secret.as_deref(),
        TokenKind::Refresh => config.refresh_token_secret.as_deref(),
    };
    secret.ok_or_else(|| Error::Internal {
        operation: format!("JWT: {kind} token secret is required"),
    })
}

/// Create a signed token of the given kind for a user
pub fn issue_token(user_id: UserId, kind: TokenKind, config: &Config) -> Result<String, Error> {
    let claims = TokenClaims::new(user_id, kind, config);
    let key = EncodingKey::from_secret(secret_for(kind, config)?.as_bytes());

    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create {kind} JWT: {e}"),
    })
}

/// Verify and decode a token, checking both the signature for `kind`'s secret
/// and the embedded `typ` claim
pub fn verify_token(token: &str, kind: TokenKind, config: &Config) -> Result<TokenClaims, TokenError> {
    let secret = match secret_for(kind, config) {
        Ok(secret) => secret,
        Err(e) => return Err(TokenError::Internal(e.to_string())),
    };

    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    // Default leeway is 60s; expiry must be exact so a just-expired token is
    // rejected immediately
    validation.leeway = 0;

    let token_data = decode::<TokenClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,

        jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::BadSignature,

        // Structurally broken tokens or claims
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => TokenError::Malformed,

        // Server-side key problems
        jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_)
        | jsonwebtoken::errors::ErrorKind::RsaFailedSigning
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithmName
        | jsonwebtoken::errors::ErrorKind::InvalidKeyFormat
        | jsonwebtoken::errors::ErrorKind::MissingAlgorithm
        | jsonwebtoken::errors::ErrorKind::Crypto(_) => TokenError::Internal(format!("JWT verification: {e}")),

        // Catch-all for any future error variants (default to server error for safety)
        _ => TokenError::Internal(format!("JWT verification (unknown error): {e}")),
    })?;

    if token_data.claims.kind != kind {
        return Err(TokenError::WrongKind(kind));
    }

    Ok(token_data.claims)
}
