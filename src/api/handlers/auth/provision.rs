//! Complete registration for a provider-verified identity.
//!
//! The subject id and email come from the verified credential, never from the
//! request body. The body only supplies the role and optional profile fields.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

use super::{
    AuthState,
    error::AuthError,
    reconcile::{ReconcileResult, reconcile},
    session,
    storage::{self, ProvisionOutcome},
    types::{ProviderRegisterRequest, Role, TokenResponse},
    utils::{extract_bearer_token, normalize_email},
};

#[utoipa::path(
    post,
    path = "/v1/auth/provider/register",
    security(("bearer" = [])),
    request_body = ProviderRegisterRequest,
    responses(
        (status = 201, description = "User provisioned, session issued", body = TokenResponse),
        (status = 400, description = "Missing payload or invalid role"),
        (status = 401, description = "Missing, invalid or expired provider credential"),
        (status = 409, description = "Identity already registered"),
        (status = 503, description = "Provider or database unavailable")
    ),
    tag = "auth"
)]
pub async fn provider_register(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<ProviderRegisterRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let credential = extract_bearer_token(&headers).ok_or(AuthError::MissingCredential)?;
    let claims = state.verifier().verify(&credential).await?;

    let Some(Json(payload)) = payload else {
        return Err(AuthError::InvalidRoleAssignment(
            "missing request body".to_string(),
        ));
    };

    let role = Role::parse(payload.role.trim())
        .ok_or_else(|| AuthError::InvalidRoleAssignment(payload.role.clone()))?;

    let email = normalize_email(&claims.email);
    if email.is_empty() {
        return Err(AuthError::InvalidCredential);
    }

    // Registration may race a concurrent login/register with the same
    // credential; an existing match is a duplicate, not an error path.
    if let ReconcileResult::Existing { .. } = reconcile(&pool.0, &claims).await? {
        return Err(AuthError::DuplicateIdentity);
    }

    let outcome = storage::insert_provider_user(
        &pool.0,
        &claims.external_subject_id,
        &email,
        role,
        payload.full_name.as_deref().map(str::trim).filter(|s| !s.is_empty()),
        payload.phone.as_deref().map(str::trim).filter(|s| !s.is_empty()),
        payload
            .business_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty()),
    )
    .await?;

    match outcome {
        ProvisionOutcome::Created { user_id, salon_id } => {
            info!(
                "Provisioned user {user_id} with role {role}{}",
                salon_id.map_or(String::new(), |id| format!(" and pending salon {id}"))
            );
            let token = session::issue(
                state.keys(),
                user_id,
                &email,
                role,
                state.config().session_ttl_seconds(),
            )?;
            Ok((StatusCode::CREATED, Json(TokenResponse { token, role })))
        }
        ProvisionOutcome::Conflict => Err(AuthError::DuplicateIdentity),
    }
}
