//! Social login providers
//!
//! A provider turns an OAuth authorization code into the user's profile.
//! `YandexOAuth` talks to Yandex ID; tests substitute their own provider.

mod error;
mod yandex;

pub use error::OAuthError;
pub use yandex::YandexOAuth;

use async_trait::async_trait;

/// Identity reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialProfile {
    pub login: String,
    pub first_name: String,
    pub last_name: String,
}

#[async_trait]
pub trait SocialProvider: Send + Sync {
    /// Page the user is sent to for granting access
    fn authorize_url(&self) -> &str;

    /// User agent and host recorded in login history for this provider
    fn history_identity(&self) -> (&'static str, &'static str);

    /// Exchange an authorization code for the profile of its owner
    async fn fetch_profile(&self, code: &str) -> Result<SocialProfile, OAuthError>;
}
