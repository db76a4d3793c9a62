//! Yandex ID OAuth client
//!
//! Authorization code flow: the code is exchanged at the token endpoint for
//! an access token, which then reads the profile from the info endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::Value;

use super::{OAuthError, SocialProfile, SocialProvider};
use crate::core::config::YandexConfig;
use crate::core::constants::{
    DEFAULT_OAUTH_TIMEOUT_SECS, YANDEX_HISTORY_HOST, YANDEX_HISTORY_USER_AGENT,
};

pub struct YandexOAuth {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    /// Authorize page with `response_type` and `client_id` applied
    authorize_url: String,
    token_url: String,
    /// Info endpoint with `format=json` applied
    profile_url: Url,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ProfileResponse {
    login: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

fn with_params(base: &str, params: &[(&str, &str)]) -> Result<Url, OAuthError> {
    Url::parse_with_params(base, params)
        .map_err(|e| OAuthError::Config(format!("invalid URL {}: {}", base, e)))
}

impl YandexOAuth {
    pub fn new(config: &YandexConfig) -> Result<Self, OAuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_OAUTH_TIMEOUT_SECS))
            .build()
            .map_err(|e| OAuthError::Config(format!("failed to build HTTP client: {}", e)))?;
        Self::with_client(config, client)
    }

    pub fn with_client(config: &YandexConfig, client: reqwest::Client) -> Result<Self, OAuthError> {
        let authorize_url = with_params(
            &config.authorize_url,
            &[("response_type", "code"), ("client_id", config.client_id.as_str())],
        )?;
        let profile_url = with_params(&config.profile_url, &[("format", "json")])?;

        tracing::debug!(client_id = %config.client_id, "Yandex OAuth client initialized");
        Ok(Self {
            client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            authorize_url: authorize_url.into(),
            token_url: config.token_url.clone(),
            profile_url,
        })
    }

    async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let resp = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await?;
        let status = resp.status();

        if !status.is_success() {
            let body: Value = resp.json().await.unwrap_or(Value::Null);
            let reason = body["error_description"]
                .as_str()
                .or_else(|| body["error"].as_str())
                .unwrap_or("unexpected response")
                .to_string();
            // invalid_grant and friends come back as 400
            if status.is_client_error() {
                return Err(OAuthError::Rejected(reason));
            }
            return Err(OAuthError::status(status, reason));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| OAuthError::Decode(e.to_string()))?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl SocialProvider for YandexOAuth {
    fn authorize_url(&self) -> &str {
        &self.authorize_url
    }

    fn history_identity(&self) -> (&'static str, &'static str) {
        (YANDEX_HISTORY_USER_AGENT, YANDEX_HISTORY_HOST)
    }

    async fn fetch_profile(&self, code: &str) -> Result<SocialProfile, OAuthError> {
        let access_token = self.exchange_code(code).await?;

        let resp = self
            .client
            .get(self.profile_url.clone())
            .header(AUTHORIZATION, format!("OAuth {}", access_token))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(OAuthError::status(status, "profile request failed"));
        }

        let profile: ProfileResponse = resp
            .json()
            .await
            .map_err(|e| OAuthError::Decode(e.to_string()))?;
        tracing::debug!(login = %profile.login, "Yandex profile fetched");
        Ok(SocialProfile {
            login: profile.login,
            first_name: profile.first_name,
            last_name: profile.last_name,
        })
    }
}
