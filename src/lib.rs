//! # Belezo (Salon Platform Identity Service)
//!
//! `belezo` is the identity core of the Belezo salon-booking platform. It
//! reconciles identities asserted by the external credential provider with the
//! locally-owned `users` table, provisions role-specific records, and issues
//! signed session tokens.
//!
//! ## Identity Reconciliation
//!
//! Provider-verified logins are matched against the local store by external
//! subject id or, as a fallback, by email. A user who registered manually and
//! later signs in through the provider keeps a single `users` row; the
//! external subject id is backfilled on first reconciliation.
//!
//! First-time provider users carry no role claim, so they complete
//! registration in two phases: verify the credential, then submit a role. New
//! `owner` accounts that supply a business name get a `pending` salon record
//! created in the same transaction.
//!
//! ## Sessions
//!
//! Session tokens are stateless HS256 JWTs carrying
//! `{user_id, email, role, iat, exp}`. The server keeps no session table and
//! performs no revocation; expiry is the only lifetime control.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
