//! Manual-credential path: email/password signup and login.
//!
//! Passwords are hashed with Argon2id and never stored or logged in clear.
//! Login failures are deliberately uniform so responses cannot be used to
//! probe which emails are registered.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{
    AuthState,
    error::AuthError,
    session,
    storage::{self, SignupOutcome},
    types::{LoginRequest, Role, SignupRequest, SignupResponse, TokenResponse},
    utils::{normalize_email, valid_email},
};

const MIN_PASSWORD_LENGTH: usize = 8;

fn bad_request(message: &'static str) -> Response {
    (StatusCode::BAD_REQUEST, message).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created", body = SignupResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Email already registered"),
        (status = 503, description = "Database unavailable")
    ),
    tag = "auth"
)]
pub async fn signup(
    pool: Extension<PgPool>,
    payload: Option<Json<SignupRequest>>,
) -> Result<Response, AuthError> {
    let Some(Json(payload)) = payload else {
        return Ok(bad_request("Missing request body"));
    };

    let full_name = payload.full_name.trim();
    if full_name.is_empty() {
        return Ok(bad_request("Full name is required"));
    }

    let phone = payload.phone.trim();
    if phone.is_empty() {
        return Ok(bad_request("Phone is required"));
    }

    let email = normalize_email(&payload.email);
    if !valid_email(&email) {
        return Ok(bad_request("Invalid email address"));
    }

    if payload.password.len() < MIN_PASSWORD_LENGTH {
        return Ok(bad_request("Password must be at least 8 characters"));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|err| AuthError::Unavailable(anyhow::anyhow!("password hashing failed: {err}")))?
        .to_string();

    match storage::insert_manual_user(&pool.0, full_name, phone, &email, &password_hash).await? {
        SignupOutcome::Created { user_id } => {
            debug!("Created manual user {user_id}");
            Ok((
                StatusCode::CREATED,
                Json(SignupResponse {
                    user_id,
                    email,
                    role: Role::Customer,
                }),
            )
                .into_response())
        }
        SignupOutcome::Conflict => Err(AuthError::EmailAlreadyRegistered),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = TokenResponse),
        (status = 400, description = "Missing request body"),
        (status = 401, description = "Unknown email or wrong password"),
        (status = 503, description = "Database unavailable")
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Response, AuthError> {
    let Some(Json(payload)) = payload else {
        return Ok(bad_request("Missing request body"));
    };

    let email = normalize_email(&payload.email);

    let Some(record) = storage::lookup_manual_auth(&pool.0, &email).await? else {
        // Burn the same hashing cost as a real verification so response
        // timing cannot reveal whether the email is registered.
        let salt = SaltString::generate(&mut OsRng);
        let _ = Argon2::default().hash_password(payload.password.as_bytes(), &salt);
        return Err(AuthError::InvalidCredentials);
    };

    let parsed = PasswordHash::new(&record.password_hash)
        .map_err(|err| AuthError::Unavailable(anyhow::anyhow!("corrupt password hash: {err}")))?;
    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed)
        .is_err()
    {
        warn!("Failed login attempt for user {}", record.user_id);
        return Err(AuthError::InvalidCredentials);
    }

    storage::record_login(&pool.0, record.user_id).await?;

    let token = session::issue(
        state.keys(),
        record.user_id,
        &email,
        record.role,
        state.config().session_ttl_seconds(),
    )?;

    Ok(Json(TokenResponse {
        token,
        role: record.role,
    })
    .into_response())
}
