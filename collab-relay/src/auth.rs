//! Bearer-token identity for REST requests and chat sockets.
//!
//! Tokens are HS256 JWTs issued by the marketplace backend. The relay only
//! verifies them and reads the `user_id` claim; it never logs users in.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use collab_proto::models::UserId;

use crate::relay::RelayState;

/// JWT claims understood by the relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated user.
    pub user_id: u64,
    /// Expiry, seconds since the epoch.
    pub exp: u64,
}

/// Errors from token handling.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No token was supplied.
    #[error("missing bearer token")]
    Missing,
    /// The token failed signature or expiry validation.
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
    /// The token names a user the relay does not know.
    #[error("unknown user {0}")]
    UnknownUser(UserId),
}

/// Verifies `token` and returns the user it was issued for.
///
/// # Errors
///
/// Returns [`AuthError::Invalid`] if the signature or expiry check fails.
pub fn verify_token(secret: &str, token: &str) -> Result<UserId, AuthError> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(UserId::new(data.claims.user_id))
}

/// Issues a token for `user_id` valid for `ttl`.
///
/// Used by the `--issue-token` development flag and by tests.
///
/// # Errors
///
/// Returns [`AuthError::Invalid`] if encoding fails.
pub fn issue_token(secret: &str, user_id: UserId, ttl: Duration) -> Result<String, AuthError> {
    let exp = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0) + ttl.as_secs();
    let claims = Claims {
        user_id: user_id.get(),
        exp,
    };
    Ok(jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Extracts the token from an `Authorization: Bearer ...` header value.
#[must_use]
pub fn bearer_token(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Extractor for the authenticated caller of a REST endpoint.
///
/// Rejects with `401 Unauthorized` when the header is missing, the token is
/// invalid, or it names an unknown user.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<Arc<RelayState>> for AuthUser {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<RelayState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or(StatusCode::UNAUTHORIZED)?;

        state
            .authenticate(token)
            .map(Self)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected REST request");
                StatusCode::UNAUTHORIZED
            })
    }
}
