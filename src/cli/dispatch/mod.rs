use crate::cli::{
    actions::Action,
    commands::{provider, session},
};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Build the action from parsed arguments.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;
    let frontend_url = matches
        .get_one::<String>("frontend-url")
        .cloned()
        .unwrap_or_else(|| "http://localhost:3000".to_string());

    let signing_key = matches
        .get_one::<String>(session::ARG_SESSION_SIGNING_KEY)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --session-signing-key")?;
    let session_ttl_seconds = matches
        .get_one::<i64>(session::ARG_SESSION_TTL)
        .copied()
        .unwrap_or(28800);

    let provider_url = matches
        .get_one::<String>(provider::ARG_PROVIDER_URL)
        .cloned()
        .unwrap_or_else(|| "https://identitytoolkit.googleapis.com".to_string());
    let provider_api_key = matches
        .get_one::<String>(provider::ARG_PROVIDER_API_KEY)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --provider-api-key")?;
    let provider_name = matches
        .get_one::<String>(provider::ARG_PROVIDER_NAME)
        .cloned()
        .unwrap_or_else(|| "firebase".to_string());

    Ok(Action::Server {
        port,
        dsn,
        frontend_url,
        signing_key,
        session_ttl_seconds,
        provider_url,
        provider_api_key,
        provider_name,
    })
}
