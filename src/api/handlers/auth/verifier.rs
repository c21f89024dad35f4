//! Credential verification against the external identity provider.
//!
//! The provider is consumed as a black box: one HTTP call turns a bearer
//! credential into [`VerifiedClaims`] or a rejection. Nothing here touches
//! local storage.

use anyhow::{Context, anyhow};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use std::{future::Future, pin::Pin};
use tracing::debug;

/// Facts the provider asserts for one credential. Lifetime = one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedClaims {
    pub external_subject_id: String,
    pub email: String,
    pub provider: String,
}

#[derive(Debug)]
pub enum VerifyError {
    /// Provider rejected the credential (malformed, revoked, unknown).
    Invalid,
    /// Provider explicitly reported the credential as expired.
    Expired,
    /// The provider could not be reached or answered garbage.
    Unavailable(anyhow::Error),
}

/// Verification seam; object-safe so handlers can hold `Arc<dyn ...>` and
/// tests can swap in a static implementation.
pub trait CredentialVerifier: Send + Sync {
    fn verify<'a>(
        &'a self,
        credential: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<VerifiedClaims, VerifyError>> + Send + 'a>>;
}

/// Production verifier calling the provider's `accounts:lookup` endpoint.
pub struct HttpCredentialVerifier {
    client: Client,
    lookup_url: String,
    api_key: SecretString,
    provider: String,
}

impl HttpCredentialVerifier {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: String, api_key: SecretString, provider: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("Failed to build provider HTTP client")?;
        let lookup_url = format!("{}/v1/accounts:lookup", base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            lookup_url,
            api_key,
            provider,
        })
    }

    async fn lookup(&self, credential: &str) -> Result<VerifiedClaims, VerifyError> {
        #[derive(Serialize)]
        struct LookupRequest<'a> {
            #[serde(rename = "idToken")]
            id_token: &'a str,
        }

        let response = self
            .client
            .post(&self.lookup_url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&LookupRequest {
                id_token: credential,
            })
            .send()
            .await
            .map_err(|err| VerifyError::Unavailable(anyhow!("provider unreachable: {err}")))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|err| VerifyError::Unavailable(anyhow!("invalid provider response: {err}")))?;

        if status.is_success() {
            parse_lookup_response(&body, &self.provider)
        } else {
            debug!("Provider rejected credential: {status}");
            Err(classify_rejection(&body))
        }
    }
}

impl CredentialVerifier for HttpCredentialVerifier {
    fn verify<'a>(
        &'a self,
        credential: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<VerifiedClaims, VerifyError>> + Send + 'a>> {
        Box::pin(self.lookup(credential))
    }
}

/// Pull subject id and email out of a successful lookup response.
fn parse_lookup_response(body: &Value, provider: &str) -> Result<VerifiedClaims, VerifyError> {
    let user = body
        .get("users")
        .and_then(Value::as_array)
        .and_then(|users| users.first())
        .ok_or(VerifyError::Invalid)?;
    let subject = user
        .get("localId")
        .and_then(Value::as_str)
        .filter(|subject| !subject.is_empty())
        .ok_or(VerifyError::Invalid)?;
    let email = user
        .get("email")
        .and_then(Value::as_str)
        .filter(|email| !email.is_empty())
        .ok_or(VerifyError::Invalid)?;

    Ok(VerifiedClaims {
        external_subject_id: subject.to_string(),
        email: email.to_string(),
        provider: provider.to_string(),
    })
}

/// Map a provider error payload to a verification error. Only the explicit
/// expiry signal is distinguished; everything else is a plain rejection.
fn classify_rejection(body: &Value) -> VerifyError {
    let message = body
        .pointer("/error/message")
        .and_then(Value::as_str)
        .unwrap_or("");
    if message.starts_with("TOKEN_EXPIRED") {
        VerifyError::Expired
    } else {
        VerifyError::Invalid
    }
}

/// Fixed-outcome verifier for tests.
pub struct StaticCredentialVerifier {
    outcome: StaticOutcome,
}

enum StaticOutcome {
    Accept(VerifiedClaims),
    Reject,
    Expired,
}

impl StaticCredentialVerifier {
    #[must_use]
    pub fn accepting(claims: VerifiedClaims) -> Self {
        Self {
            outcome: StaticOutcome::Accept(claims),
        }
    }

    #[must_use]
    pub fn rejecting() -> Self {
        Self {
            outcome: StaticOutcome::Reject,
        }
    }

    #[must_use]
    pub fn expired() -> Self {
        Self {
            outcome: StaticOutcome::Expired,
        }
    }
}

impl CredentialVerifier for StaticCredentialVerifier {
    fn verify<'a>(
        &'a self,
        _credential: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<VerifiedClaims, VerifyError>> + Send + 'a>> {
        Box::pin(async move {
            match &self.outcome {
                StaticOutcome::Accept(claims) => Ok(claims.clone()),
                StaticOutcome::Reject => Err(VerifyError::Invalid),
                StaticOutcome::Expired => Err(VerifyError::Expired),
            }
        })
    }
}
