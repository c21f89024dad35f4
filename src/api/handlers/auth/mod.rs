//! Identity reconciliation and session issuance.
//!
//! Two authentication paths converge on the same session token format:
//!
//! - **Provider-verified:** a bearer credential is verified against the
//!   external identity provider, reconciled with local user records, and
//!   either a session is issued ([`reconcile`]) or registration is completed
//!   with a role ([`provision`]).
//! - **Manual-credential:** email/password signup and login with Argon2id
//!   hashing ([`manual`]).
//!
//! Sessions are stateless HS256 tokens; there is no server-side session
//! store and no revocation.

pub(crate) mod manual;
pub(crate) mod provision;
pub(crate) mod reconcile;
pub(crate) mod session;
mod error;
mod state;
mod storage;
pub(crate) mod types;
mod utils;
pub(crate) mod verifier;

pub use error::AuthError;
pub use session::SessionKeys;
pub use state::{AuthConfig, AuthState, DEFAULT_SESSION_TTL_SECONDS};
pub use verifier::{
    CredentialVerifier, HttpCredentialVerifier, StaticCredentialVerifier, VerifiedClaims,
};

#[cfg(test)]
mod tests;
