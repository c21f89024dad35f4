//! Stateless session tokens, HS256-signed.
//!
//! Tokens are bearer-style: possession is proof, there is no server-side
//! session store and no revocation list. Logout is a client-side discard.

use anyhow::Context;
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::{
    AuthState,
    error::AuthError,
    storage,
    types::{ProfileResponse, Role},
    utils::extract_bearer_token,
};
use sqlx::PgPool;

/// Symmetric signing keys derived once from the configured secret.
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }
}

/// Claims carried by every session token, identical for both the manual and
/// the provider-verified path.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DecodeError {
    Expired,
    Invalid,
}

/// Sign a session token for an authenticated user.
///
/// # Errors
/// Returns an error if signing fails.
pub fn issue(
    keys: &SessionKeys,
    user_id: i64,
    email: &str,
    role: Role,
    ttl_seconds: i64,
) -> anyhow::Result<String> {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        user_id,
        email: email.to_string(),
        role,
        iat: now,
        exp: now + ttl_seconds,
    };
    encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
        .context("Failed to sign session token")
}

/// Decode and validate a session token. Expiry is distinguished from every
/// other failure so clients can prompt re-authentication.
pub fn verify(keys: &SessionKeys, token: &str) -> Result<SessionClaims, DecodeError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    decode::<SessionClaims>(token, &keys.decoding, &validation)
        .map(|data| data.claims)
        .map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature => DecodeError::Expired,
            _ => DecodeError::Invalid,
        })
}

#[utoipa::path(
    get,
    path = "/v1/auth/me",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile for the session user", body = ProfileResponse),
        (status = 401, description = "Missing, invalid or expired session token"),
        (status = 503, description = "Database unavailable")
    ),
    tag = "auth"
)]
pub async fn me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, AuthError> {
    let token = extract_bearer_token(&headers).ok_or(AuthError::MissingCredential)?;
    let claims = verify(state.keys(), &token).map_err(|err| match err {
        DecodeError::Expired => AuthError::ExpiredCredential,
        DecodeError::Invalid => AuthError::InvalidCredential,
    })?;

    debug!("Profile lookup for user {}", claims.user_id);

    let profile = storage::fetch_profile(&pool.0, claims.user_id)
        .await?
        .ok_or(AuthError::InvalidCredential)?;

    Ok(Json(ProfileResponse {
        user_id: profile.user_id,
        full_name: profile.full_name,
        email: profile.email,
        phone: profile.phone,
        role: profile.role,
        profile_pic: profile.profile_pic,
        created_at: profile.created_at.to_rfc3339(),
    }))
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session discarded")
    ),
    tag = "auth"
)]
pub async fn logout() -> impl IntoResponse {
    // Tokens are stateless; the client drops its copy and that is the logout.
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> SessionKeys {
        SessionKeys::new(&SecretString::from("test-signing-key"))
    }

    #[test]
    fn issue_and_verify_round_trip() -> anyhow::Result<()> {
        let keys = keys();
        let token = issue(&keys, 7, "a@b.com", Role::Staff, 3600)?;
        let claims = verify(&keys, &token).map_err(|err| anyhow::anyhow!("{err:?}"))?;
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.role, Role::Staff);
        assert_eq!(claims.exp - claims.iat, 3600);
        Ok(())
    }

    #[test]
    fn expired_token_is_distinguished() -> anyhow::Result<()> {
        let keys = keys();
        let token = issue(&keys, 7, "a@b.com", Role::Customer, -60)?;
        assert_eq!(verify(&keys, &token), Err(DecodeError::Expired));
        Ok(())
    }

    #[test]
    fn tampered_token_is_invalid() -> anyhow::Result<()> {
        let keys = keys();
        let token = issue(&keys, 7, "a@b.com", Role::Customer, 3600)?;
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('x');
        assert_eq!(verify(&keys, &tampered), Err(DecodeError::Invalid));
        Ok(())
    }

    #[test]
    fn token_signed_with_other_key_is_invalid() -> anyhow::Result<()> {
        let token = issue(&keys(), 7, "a@b.com", Role::Owner, 3600)?;
        let other = SessionKeys::new(&SecretString::from("other-key"));
        assert_eq!(verify(&other, &token), Err(DecodeError::Invalid));
        Ok(())
    }
}
