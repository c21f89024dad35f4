use crate::{
    api,
    api::handlers::auth::{AuthConfig, AuthState, HttpCredentialVerifier, SessionKeys},
    cli::actions::Action,
};
use anyhow::Result;
use std::sync::Arc;

/// Handle the server action: assemble process-wide state and run the server.
///
/// # Errors
/// Returns an error if state construction or the server itself fails.
pub async fn handle(action: Action) -> Result<()> {
    let Action::Server {
        port,
        dsn,
        frontend_url,
        signing_key,
        session_ttl_seconds,
        provider_url,
        provider_api_key,
        provider_name,
    } = action;

    let config = AuthConfig::new(frontend_url, provider_name)
        .with_session_ttl_seconds(session_ttl_seconds);

    // Signing key and verifier are read-mostly, initialized once here and
    // shared across all requests.
    let keys = SessionKeys::new(&signing_key);
    let verifier = Arc::new(HttpCredentialVerifier::new(
        provider_url,
        provider_api_key,
        config.provider_name().to_string(),
    )?);

    let state = Arc::new(AuthState::new(config, keys, verifier));

    api::new(port, dsn, state).await
}
