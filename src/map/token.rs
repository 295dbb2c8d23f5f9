//! Where the map access token comes from.

use crate::core::config::EstimatorConfig;
use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;

/// Supplies the map access token.
///
/// `Ok(None)` means no token is configured, which the session treats as a
/// fatal configuration error.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch_token(&self) -> Result<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Fetches the token from the same-origin token route.
pub struct HttpTokenSource {
    client: reqwest::Client,
    url: String,
}

impl HttpTokenSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn from_config(client: reqwest::Client, config: &EstimatorConfig) -> Self {
        Self::new(client, config.endpoints.token_url())
    }
}

#[async_trait]
impl TokenSource for HttpTokenSource {
    async fn fetch_token(&self) -> Result<Option<String>> {
        let response: TokenResponse = self
            .client
            .get(&self.url)
            .send()
            .await?
            .json()
            .await?;

        let token = response.token.filter(|token| !token.trim().is_empty());
        log::debug!("token received: {}", if token.is_some() { "yes" } else { "no" });
        Ok(token)
    }
}

/// A token known up front, e.g. a build-time public key.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenSource(pub Option<String>);

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn missing() -> Self {
        Self(None)
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn fetch_token(&self) -> Result<Option<String>> {
        Ok(self.0.clone().filter(|token| !token.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_accepts_null_and_missing() {
        let null: TokenResponse = serde_json::from_str(r#"{"token": null}"#).unwrap();
        assert_eq!(null.token, None);
        let missing: TokenResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.token, None);
        let present: TokenResponse = serde_json::from_str(r#"{"token": "pk.abc"}"#).unwrap();
        assert_eq!(present.token.as_deref(), Some("pk.abc"));
    }

    #[tokio::test]
    async fn test_static_source_treats_blank_as_missing() {
        assert_eq!(StaticTokenSource::new("  ").fetch_token().await, Ok(None));
        assert_eq!(StaticTokenSource::missing().fetch_token().await, Ok(None));
        assert_eq!(
            StaticTokenSource::new("pk.abc").fetch_token().await,
            Ok(Some("pk.abc".to_string()))
        );
    }
}
