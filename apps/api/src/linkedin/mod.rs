//! LinkedIn integration: OAuth login and job-posting import.
//!
//! Handlers depend on the [`LinkedInApi`] trait; `AppState` carries an
//! `Option<Arc<dyn LinkedInApi>>` that is `None` when the client credentials
//! are not configured.

pub mod handlers;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LinkedInConfig;

const AUTHORIZE_URL: &str = "https://www.linkedin.com/oauth/v2/authorization";
const TOKEN_URL: &str = "https://www.linkedin.com/oauth/v2/accessToken";
const API_BASE: &str = "https://api.linkedin.com";
const SCOPES: &str = "openid profile email";
const RESTLI_PROTOCOL_VERSION: &str = "2.0.0";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider rejected the access token")]
    Unauthorized,

    #[error("provider rate limit exceeded")]
    RateLimited,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// OpenID userinfo returned after login.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkedInProfile {
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub company: PostingCompany,
    pub location: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostingCompany {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[async_trait]
pub trait LinkedInApi: Send + Sync {
    /// Where to send the browser to start the OAuth flow.
    fn authorize_url(&self, state: &str) -> String;

    /// Trades an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError>;

    async fn fetch_profile(&self, access_token: &str) -> Result<LinkedInProfile, ProviderError>;

    async fn fetch_job(&self, access_token: &str, job_id: &str)
        -> Result<JobPosting, ProviderError>;
}

/// reqwest-backed LinkedIn client.
#[derive(Clone)]
pub struct LinkedInClient {
    client: Client,
    config: LinkedInConfig,
}

impl LinkedInClient {
    pub fn new(config: LinkedInConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, config })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(ProviderError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("LinkedIn rate limit hit");
                Err(ProviderError::RateLimited)
            }
            _ => {
                let message = response.text().await.unwrap_or_default();
                Err(ProviderError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

#[async_trait]
impl LinkedInApi for LinkedInClient {
    fn authorize_url(&self, state: &str) -> String {
        let params = [
            ("response_type", "code"),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("state", state),
            ("scope", SCOPES),
        ];
        // AUTHORIZE_URL is a valid constant, so this only fails on a broken build.
        Url::parse_with_params(AUTHORIZE_URL, &params)
            .map(String::from)
            .unwrap_or_else(|_| AUTHORIZE_URL.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError> {
        debug!("Exchanging LinkedIn authorization code");
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        let token: TokenResponse = Self::decode(response).await?;
        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<LinkedInProfile, ProviderError> {
        let response = self
            .client
            .get(format!("{API_BASE}/v2/userinfo"))
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn fetch_job(
        &self,
        access_token: &str,
        job_id: &str,
    ) -> Result<JobPosting, ProviderError> {
        let response = self
            .client
            .get(format!("{API_BASE}/v2/jobs/{job_id}"))
            .bearer_auth(access_token)
            .header("X-Restli-Protocol-Version", RESTLI_PROTOCOL_VERSION)
            .send()
            .await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_carries_client_and_state() {
        let client = LinkedInClient::new(LinkedInConfig {
            client_id: "client-123".to_string(),
            client_secret: "shh".to_string(),
            redirect_uri: "http://localhost:3000/api/auth/linkedin/callback".to_string(),
        })
        .unwrap();

        let url = Url::parse(&client.authorize_url("xyz")).unwrap();
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("www.linkedin.com"));
        assert!(query.contains(&("client_id".to_string(), "client-123".to_string())));
        assert!(query.contains(&("state".to_string(), "xyz".to_string())));
        assert!(query.contains(&("scope".to_string(), SCOPES.to_string())));
        assert!(!url.as_str().contains("shh"));
    }
}
