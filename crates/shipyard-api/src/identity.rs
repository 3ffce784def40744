//! Caller identity.
//!
//! The service never looks up an ambient session; it asks the injected
//! [`IdentityProvider`] for the current user on every call that needs
//! one. Two providers ship with the crate: [`StaticIdentity`] for tools
//! and tests, and [`TokenIdentity`], which verifies an EdDSA (Ed25519)
//! session token minted by the auth provider.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shipyard_core::error::{TrackerError, TrackerResult};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::SessionConfig;

/// Source of the acting user's id.
pub trait IdentityProvider: Send + Sync {
    /// The current user's id, or `None` when no session is active.
    fn current_user_id(&self) -> Option<String>;
}

/// Resolve the acting user or fail with [`TrackerError::Unauthenticated`].
pub fn resolve_user<P: IdentityProvider + ?Sized>(provider: &P) -> TrackerResult<String> {
    provider
        .current_user_id()
        .ok_or(TrackerError::Unauthenticated)
}

/// A fixed identity, possibly anonymous.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<String>);

impl StaticIdentity {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self(Some(user_id.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.0.clone()
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("session token has expired")]
    TokenExpired,

    #[error("invalid session token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the auth provider's user id.
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID (UUID string).
    pub jti: String,
}

/// Issue a signed session token for `user_id`.
pub fn issue_session_token(user_id: &str, config: &SessionConfig) -> Result<String, IdentityError> {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: user_id.to_string(),
        iss: config.jwt_issuer.clone(),
        iat: now,
        exp: now + config.session_lifetime_secs as i64,
        jti: Uuid::new_v4().to_string(),
    };

    let key = EncodingKey::from_ed_pem(config.jwt_private_key_pem.as_bytes())
        .map_err(|e| IdentityError::Crypto(format!("bad private key: {e}")))?;

    jsonwebtoken::encode(&Header::new(Algorithm::EdDSA), &claims, &key)
        .map_err(|e| IdentityError::Crypto(format!("JWT encode: {e}")))
}

/// Verify signature, expiry and issuer of a session token.
pub fn decode_session_token(
    token: &str,
    config: &SessionConfig,
) -> Result<SessionClaims, IdentityError> {
    let key = DecodingKey::from_ed_pem(config.jwt_public_key_pem.as_bytes())
        .map_err(|e| IdentityError::Crypto(format!("bad public key: {e}")))?;

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.set_issuer(&[&config.jwt_issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

    jsonwebtoken::decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => IdentityError::TokenExpired,
            _ => IdentityError::TokenInvalid(e.to_string()),
        })
}

/// Identity backed by a session token presented with the request.
///
/// The token is verified on every lookup, so an expired token stops
/// resolving without any extra bookkeeping.
#[derive(Debug, Clone)]
pub struct TokenIdentity {
    token: Option<String>,
    config: SessionConfig,
}

impl TokenIdentity {
    pub fn new(token: Option<String>, config: SessionConfig) -> Self {
        Self { token, config }
    }
}

impl IdentityProvider for TokenIdentity {
    fn current_user_id(&self) -> Option<String> {
        let token = self.token.as_deref()?;
        match decode_session_token(token, &self.config) {
            Ok(claims) => Some(claims.sub),
            Err(e) => {
                debug!(error = %e, "Rejected session token");
                None
            }
        }
    }
}
