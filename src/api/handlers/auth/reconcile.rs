//! Reconcile provider-verified claims against local user records.
//!
//! Matching prefers the external subject id; an email-only match links the
//! subject id to the record on the spot so later logins match directly.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    AuthState,
    error::AuthError,
    session, storage,
    types::{Role, RoleRequiredResponse, TokenResponse},
    utils::{extract_bearer_token, normalize_email},
    verifier::VerifiedClaims,
};

/// Result of reconciling verified claims with the users table.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum ReconcileResult {
    /// A local user matched by subject id or email.
    Existing { user_id: i64, role: Role },
    /// No local record; registration must be completed with a role.
    NewUser {
        external_subject_id: String,
        email: String,
    },
}

pub(super) async fn reconcile(
    pool: &PgPool,
    claims: &VerifiedClaims,
) -> Result<ReconcileResult, AuthError> {
    let email = normalize_email(&claims.email);
    let row = storage::lookup_identity(pool, &claims.external_subject_id, &email).await?;

    match row {
        Some(identity) => {
            if identity.external_subject_id.is_none() {
                // Email-only match: link the subject id now so the account is
                // found directly next time.
                info!(
                    "Linking subject id to existing user {} matched by email",
                    identity.user_id
                );
                storage::backfill_subject_id(pool, identity.user_id, &claims.external_subject_id)
                    .await?;
            }
            Ok(ReconcileResult::Existing {
                user_id: identity.user_id,
                role: identity.role,
            })
        }
        None => Ok(ReconcileResult::NewUser {
            external_subject_id: claims.external_subject_id.clone(),
            email,
        }),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/provider/login",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Known identity, session issued", body = TokenResponse),
        (status = 202, description = "Verified but unknown identity, role selection required", body = RoleRequiredResponse),
        (status = 401, description = "Missing, invalid or expired provider credential"),
        (status = 503, description = "Provider or database unavailable")
    ),
    tag = "auth"
)]
pub async fn provider_login(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, AuthError> {
    let credential = extract_bearer_token(&headers).ok_or(AuthError::MissingCredential)?;
    let claims = state.verifier().verify(&credential).await?;

    debug!("Provider credential verified for subject {}", claims.external_subject_id);

    match reconcile(&pool.0, &claims).await? {
        ReconcileResult::Existing { user_id, role } => {
            let token = session::issue(
                state.keys(),
                user_id,
                &normalize_email(&claims.email),
                role,
                state.config().session_ttl_seconds(),
            )?;
            Ok((StatusCode::OK, Json(TokenResponse { token, role })).into_response())
        }
        ReconcileResult::NewUser {
            external_subject_id,
            email,
        } => Ok((
            StatusCode::ACCEPTED,
            Json(RoleRequiredResponse {
                external_subject_id,
                email,
            }),
        )
            .into_response()),
    }
}
