//! Error taxonomy for the identity core.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use super::verifier::VerifyError;

/// Every failure the auth endpoints can surface. All variants are
/// client-correctable 4xx except [`AuthError::Unavailable`].
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer <token>` header on a provider-verified flow.
    #[error("Missing credential")]
    MissingCredential,
    /// The provider rejected the credential.
    #[error("Invalid credential")]
    InvalidCredential,
    /// The provider reported the credential as expired; the client should
    /// re-authenticate rather than treat this as a rejection.
    #[error("Expired credential")]
    ExpiredCredential,
    /// A user record already exists for this subject id or email. Expected
    /// signal for a lost provisioning race, not a bug.
    #[error("Identity already registered")]
    DuplicateIdentity,
    #[error("Email already registered")]
    EmailAlreadyRegistered,
    /// Manual login failure. Unknown email and wrong password share this
    /// variant so responses never reveal which emails are registered.
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid role assignment: {0}")]
    InvalidRoleAssignment(String),
    /// Storage or provider outage; logged here, never retried here.
    #[error("Service unavailable")]
    Unavailable(#[source] anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredential
            | Self::InvalidCredential
            | Self::ExpiredCredential
            | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::DuplicateIdentity | Self::EmailAlreadyRegistered => StatusCode::CONFLICT,
            Self::InvalidRoleAssignment(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let Self::Unavailable(ref err) = self {
            error!("Backend unavailable: {err:#}");
        }
        (self.status(), self.to_string()).into_response()
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Unavailable(err)
    }
}

impl From<VerifyError> for AuthError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Invalid => Self::InvalidCredential,
            VerifyError::Expired => Self::ExpiredCredential,
            VerifyError::Unavailable(inner) => Self::Unavailable(inner),
        }
    }
}
