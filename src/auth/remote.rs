//! Password sign-in against a remote identity provider
//!
//! `POST {base}/auth/v1/token?grant_type=password` with `{email, password}`.
//! Errors come back as `error_description`, `msg` or `message`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Identity, IdentityProvider};
use crate::error::{ArchiveError, Result};

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    user: ProviderUser,
}

#[derive(Deserialize)]
struct ProviderUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize, Default)]
struct ProviderError {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ProviderError {
    fn into_message(self) -> Option<String> {
        self.error_description.or(self.msg).or(self.message)
    }
}

pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpIdentityProvider {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ArchiveError::Config(format!("identity client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn token_url(&self) -> String {
        format!("{}/auth/v1/token?grant_type=password", self.base_url)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity> {
        let mut request = self
            .client
            .post(self.token_url())
            .json(&PasswordGrant { email, password });
        if let Some(ref key) = self.api_key {
            request = request.header("apikey", key);
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Identity provider unreachable");
            ArchiveError::Auth(format!("identity provider unreachable: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body: ProviderError = response.json().await.unwrap_or_default();
            let message = body
                .into_message()
                .unwrap_or_else(|| format!("HTTP {}", status));
            debug!(%status, message = %message, "Sign-in rejected");
            return Err(ArchiveError::Auth(message));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ArchiveError::Auth(format!("invalid provider response: {}", e)))?;

        Ok(Identity {
            id: token.user.id,
            email: token
                .user
                .email
                .unwrap_or_else(|| email.trim().to_string())
                .to_lowercase(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_url() {
        let provider =
            HttpIdentityProvider::new("https://id.example.co/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(
            provider.token_url(),
            "https://id.example.co/auth/v1/token?grant_type=password"
        );
    }

    #[test]
    fn test_error_message_precedence() {
        let body: ProviderError = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        )
        .unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Invalid login credentials"));

        let body: ProviderError = serde_json::from_str(r#"{"msg":"Email not confirmed"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Email not confirmed"));

        let body: ProviderError = serde_json::from_str("{}").unwrap();
        assert_eq!(body.into_message(), None);
    }
}
