//! Signup, password and social login, token refresh and logout

use uuid::Uuid;

use super::{AccessError, AccessService, ClientInfo, CurrentUser, UserPublic, hash_password, role_ids};
use crate::api::auth::TokenPair;
use crate::core::constants::ROLE_USER;
use crate::data::oauth::{SocialProfile, SocialProvider};
use crate::data::postgres::PostgresError;
use crate::data::types::{NewUser, UserRow};
use crate::domain::sessions::DeviceFingerprint;
use crate::utils::crypto;

impl AccessService {
    /// Register a user holding the default role
    pub async fn signup(
        &self,
        login: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<UserPublic, AccessError> {
        let password_hash = hash_password(password).await?;
        let row = self
            .repo
            .create_user(
                &NewUser {
                    login,
                    password_hash: &password_hash,
                    first_name,
                    last_name,
                },
                ROLE_USER,
            )
            .await?;

        tracing::info!(user_id = %row.id, login = %row.login, "User registered");
        Ok(row.into())
    }

    /// Check credentials and open a refresh session for the device
    pub async fn login(
        &self,
        login: &str,
        password: &str,
        client: &ClientInfo,
    ) -> Result<TokenPair, AccessError> {
        let Some(row) = self.repo.get_user_by_login(login).await? else {
            return Err(AccessError::InvalidCredentials);
        };
        if !super::verify_password(password, &row.password_hash).await? {
            tracing::debug!(user_id = %row.id, "Login rejected: wrong password");
            return Err(AccessError::InvalidCredentials);
        }

        let pair = self.open_session(row.id, client).await?;
        tracing::info!(user_id = %row.id, "User logged in");
        Ok(pair)
    }

    /// Sign in through an OAuth provider
    ///
    /// The provider's login is matched against local logins; an unknown one
    /// becomes a new user with the default role and an unusable password.
    pub async fn social_login(
        &self,
        provider: &dyn SocialProvider,
        code: &str,
    ) -> Result<TokenPair, AccessError> {
        let profile = provider.fetch_profile(code).await?;

        let row = match self.repo.get_user_by_login(&profile.login).await? {
            Some(row) => row,
            None => self.create_social_user(&profile).await?,
        };

        let (user_agent, host) = provider.history_identity();
        let client = ClientInfo::new(Some(user_agent), Some(host));
        let pair = self.open_session(row.id, &client).await?;
        tracing::info!(user_id = %row.id, provider = user_agent, "User logged in");
        Ok(pair)
    }

    async fn create_social_user(&self, profile: &SocialProfile) -> Result<UserRow, AccessError> {
        let password_hash = hash_password(&crypto::generate_token(32)).await?;
        let created = self
            .repo
            .create_user(
                &NewUser {
                    login: &profile.login,
                    password_hash: &password_hash,
                    first_name: &profile.first_name,
                    last_name: &profile.last_name,
                },
                ROLE_USER,
            )
            .await;

        match created {
            Ok(row) => {
                tracing::info!(user_id = %row.id, login = %row.login, "Social user registered");
                Ok(row)
            }
            // Lost a race with a concurrent first login of the same account
            Err(PostgresError::Conflict(_)) => self
                .repo
                .get_user_by_login(&profile.login)
                .await?
                .ok_or(AccessError::NotFound("User")),
            Err(e) => Err(e.into()),
        }
    }

    /// Record the login and whitelist a fresh refresh token for the device
    ///
    /// A previous session of the same device is replaced.
    async fn open_session(
        &self,
        user_id: Uuid,
        client: &ClientInfo,
    ) -> Result<TokenPair, AccessError> {
        self.repo
            .record_login(user_id, &client.user_agent, &client.host)
            .await?;

        let roles = self.repo.list_user_roles(user_id).await?;
        let pair = self.tokens.issue_pair(user_id, &role_ids(&roles))?;

        let device = DeviceFingerprint::new(&client.user_agent, &client.host, user_id);
        if !self.sessions.issue(user_id, &device, &pair.refresh_token).await? {
            self.sessions.rotate(user_id, &device, &pair.refresh_token).await?;
        }
        Ok(pair)
    }

    /// Exchange a whitelisted refresh token for a new pair
    pub async fn refresh(
        &self,
        refresh_token: &str,
        client: &ClientInfo,
    ) -> Result<TokenPair, AccessError> {
        let claims = self.tokens.validate_refresh(refresh_token)?;
        let user_id = claims.user_id();

        if self.repo.get_user(user_id).await?.is_none() {
            return Err(AccessError::UnknownSubject);
        }

        self.repo
            .record_login(user_id, &client.user_agent, &client.host)
            .await?;

        let device = DeviceFingerprint::new(&client.user_agent, &client.host, user_id);
        if !self.sessions.validate(user_id, &device, refresh_token).await? {
            tracing::warn!(%user_id, "Refresh with a token outside the whitelist");
            return Err(AccessError::NotWhitelisted);
        }

        let roles = self.repo.list_user_roles(user_id).await?;
        let pair = self.tokens.issue_pair(user_id, &role_ids(&roles))?;

        // The slot can expire between validate and rotate
        if !self.sessions.rotate(user_id, &device, &pair.refresh_token).await? {
            return Err(AccessError::NotWhitelisted);
        }
        Ok(pair)
    }

    /// Close the session of the device last seen with this client identity
    pub async fn logout(&self, current: &CurrentUser, client: &ClientInfo) -> Result<(), AccessError> {
        let Some(device) = self.last_device(current, client).await? else {
            return Ok(());
        };
        let revoked = self.sessions.revoke(current.id, &device).await?;
        tracing::info!(user_id = %current.id, revoked, "User logged out");
        Ok(())
    }

    /// Close every session of the user
    pub async fn logout_all(
        &self,
        current: &CurrentUser,
        client: &ClientInfo,
    ) -> Result<(), AccessError> {
        if self.last_device(current, client).await?.is_none() {
            return Ok(());
        }
        let revoked = self.sessions.revoke_all(current.id).await?;
        tracing::info!(user_id = %current.id, revoked, "User logged out everywhere");
        Ok(())
    }

    async fn last_device(
        &self,
        current: &CurrentUser,
        client: &ClientInfo,
    ) -> Result<Option<DeviceFingerprint>, AccessError> {
        let entry = self
            .repo
            .latest_login_for_device(current.id, &client.user_agent, &client.host)
            .await?;
        Ok(entry.map(|e| DeviceFingerprint::new(&e.user_agent, &e.host, current.id)))
    }
}
