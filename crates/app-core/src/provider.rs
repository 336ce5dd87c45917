//! Client for the hosted auth provider's backend API.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Provider API rejected the request with status {status}: {message}")]
    Api { status: u16, message: String },
}

/// Backend operations against the auth provider's user records.
///
/// Only the metadata write-back needed by the identity sync is modeled; the
/// provider remains the source of truth for everything else.
#[async_trait::async_trait]
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait IdentityProvider: Send + Sync {
    /// Sets `private_metadata.role` on the provider's record for the subject,
    /// keeping its session claims consistent with the local store.
    async fn update_private_metadata(&self, subject_id: &str, role: &str) -> Result<(), ProviderError>;
}

/// Clerk-compatible implementation over the REST backend API.
pub struct ClerkProvider {
    http: Client,
    api_url: String,
    secret_key: String,
}

impl ClerkProvider {
    pub fn new(api_url: String, secret_key: String) -> Result<Self, ProviderError> {
        let http = ClientBuilder::new().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { http, api_url: api_url.trim_end_matches('/').to_string(), secret_key })
    }
}

#[async_trait::async_trait]
impl IdentityProvider for ClerkProvider {
    async fn update_private_metadata(&self, subject_id: &str, role: &str) -> Result<(), ProviderError> {
        let url = format!("{}/users/{}/metadata", self.api_url, subject_id);
        let body = serde_json::json!({ "private_metadata": { "role": role } });

        let response = self
            .http
            .patch(&url)
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        tracing::error!(subject_id, status = status.as_u16(), "Provider metadata update failed: {message}");
        Err(ProviderError::Api { status: status.as_u16(), message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clerk_provider_strips_trailing_slash() {
        let provider =
            ClerkProvider::new("https://api.clerk.test/v1/".to_string(), "sk_test".to_string()).expect("client");
        assert_eq!(provider.api_url, "https://api.clerk.test/v1");
    }

    #[tokio::test]
    async fn test_mock_provider_contract() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_update_private_metadata()
            .withf(|subject_id, role| subject_id == "user_1" && role == "USER")
            .returning(|_, _| Box::pin(async move { Ok(()) }));

        let result = provider.update_private_metadata("user_1", "USER").await;
        assert!(result.is_ok());
    }
}
