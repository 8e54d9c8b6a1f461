//! Google ID token verification through the token-info endpoint

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{IdentityError, Result};
use crate::{Claims, IdentityVerifier};

const TRUSTED_ISSUERS: &[&str] = &["accounts.google.com", "https://accounts.google.com"];

/// Token-info response body. Google encodes every field as a string.
#[derive(Debug, Default, Deserialize)]
struct TokenInfo {
    aud: Option<String>,
    iss: Option<String>,
    exp: Option<String>,
    sub: Option<String>,
    email: Option<String>,
    email_verified: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

/// Error body returned for rejected tokens
#[derive(Debug, Deserialize)]
struct TokenInfoError {
    error: Option<String>,
    error_description: Option<String>,
}

/// Verifies Google ID tokens
pub struct GoogleVerifier {
    endpoint: String,
    audience: Option<String>,
    client: reqwest::Client,
}

impl GoogleVerifier {
    /// Create a verifier. Without an audience, tokens issued to any client are accepted.
    pub fn new(endpoint: impl Into<String>, audience: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self::with_client(endpoint, audience, client)
    }

    /// Create with a custom HTTP client
    pub fn with_client(
        endpoint: impl Into<String>,
        audience: Option<String>,
        client: reqwest::Client,
    ) -> Self {
        if audience.is_none() {
            warn!("No identity audience configured; token audience will not be checked");
        }
        Self {
            endpoint: endpoint.into(),
            audience,
            client,
        }
    }
}

#[async_trait]
impl IdentityVerifier for GoogleVerifier {
    async fn verify(&self, token: &str) -> Result<Claims> {
        if token.trim().is_empty() {
            return Err(IdentityError::invalid("empty token"));
        }

        debug!("Verifying identity token with {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", token)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let reason = serde_json::from_str::<TokenInfoError>(&body)
                .ok()
                .and_then(|e| e.error_description.or(e.error))
                .unwrap_or_else(|| format!("provider returned {}", status));
            return Err(IdentityError::InvalidToken(reason));
        }

        let info: TokenInfo = serde_json::from_str(&body)
            .map_err(|e| IdentityError::invalid(format!("malformed token info: {}", e)))?;

        check_token_info(info, self.audience.as_deref(), Utc::now().timestamp())
    }
}

/// Validate issuer, expiry and audience of a token-info body
fn check_token_info(info: TokenInfo, audience: Option<&str>, now_ts: i64) -> Result<Claims> {
    let iss = info.iss.unwrap_or_default();
    if !TRUSTED_ISSUERS.contains(&iss.as_str()) {
        return Err(IdentityError::UntrustedIssuer(iss));
    }

    let exp: i64 = info
        .exp
        .as_deref()
        .ok_or_else(|| IdentityError::invalid("missing exp"))?
        .parse()
        .map_err(|_| IdentityError::invalid("exp is not a timestamp"))?;
    if exp <= now_ts {
        return Err(IdentityError::Expired);
    }

    if let Some(expected) = audience {
        let actual = info.aud.unwrap_or_default();
        if actual != expected {
            return Err(IdentityError::AudienceMismatch {
                expected: expected.to_string(),
                actual,
            });
        }
    }

    Ok(Claims {
        sub: info.sub,
        email: info.email,
        email_verified: info.email_verified.as_deref() == Some("true"),
        name: info.name,
        picture: info.picture,
    })
}
