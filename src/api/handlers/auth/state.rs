//! Shared configuration and state for the auth endpoints.

use std::sync::Arc;

use super::{session::SessionKeys, verifier::CredentialVerifier};

pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 8 * 60 * 60;

/// Runtime knobs for the identity core.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    provider_name: String,
    session_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String, provider_name: String) -> Self {
        Self {
            frontend_base_url,
            provider_name,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, ttl_seconds: i64) -> Self {
        self.session_ttl_seconds = ttl_seconds;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn provider_name(&self) -> &str {
        &self.provider_name
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }
}

/// Everything the auth handlers need beyond the database pool.
pub struct AuthState {
    config: AuthConfig,
    keys: SessionKeys,
    verifier: Arc<dyn CredentialVerifier>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, keys: SessionKeys, verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            config,
            keys,
            verifier,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn keys(&self) -> &SessionKeys {
        &self.keys
    }

    #[must_use]
    pub fn verifier(&self) -> &dyn CredentialVerifier {
        self.verifier.as_ref()
    }
}
