/// Session orchestration
///
/// Login, refresh and logout over the credential hasher, the access token
/// codec and the refresh token store. A session moves from unauthenticated
/// to active at login, stays active across refreshes, and ends when its
/// refresh token is revoked or expires.
///
/// Refresh tokens are not rotated on use. A refresh token stays valid
/// until it expires or is revoked; `refresh` only mints access tokens.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::bearer::extract_bearer;
use crate::auth::jwt::{issue_access_token, validate_access_token};
use crate::auth::password::CredentialHasher;
use crate::auth::refresh_token::generate_refresh_token;
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError, ConfigError, StoreError};
use crate::store::{RefreshTokenStore, UserRecord, UserStore};

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub user: UserRecord,
    pub access_token: String,
    pub refresh_token: String,
}

/// Shared, immutable for the process lifetime
pub struct SessionManager {
    users: Arc<dyn UserStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    hasher: CredentialHasher,
    settings: AuthSettings,
}

impl SessionManager {
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        settings: AuthSettings,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            hasher: CredentialHasher::new(settings.hash_cost),
            settings,
        }
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Hash a secret off the async executor
    pub async fn hash_password(&self, secret: &str) -> Result<String, AppError> {
        let hasher = self.hasher;
        let secret = secret.to_string();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&secret)).await??;
        Ok(hash)
    }

    async fn verify_password(&self, secret: &str, hash: &str) -> Result<bool, AppError> {
        let hasher = self.hasher;
        let secret = secret.to_string();
        let hash = hash.to_string();
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&secret, &hash)).await??;
        Ok(matches)
    }

    /// Authenticate with email and password
    ///
    /// Unknown email and wrong password fail identically with
    /// `AuthError::InvalidCredentials`. This is the only operation that
    /// mints a refresh token.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let user = match self.users.find_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                // Pay the same bcrypt cost as a wrong password
                self.hash_password(password).await?;
                tracing::info!("Login rejected: unknown email");
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e.into()),
        };

        if !self.verify_password(password, &user.hashed_password).await? {
            tracing::info!(user_id = %user.id, "Login rejected: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let access_token = self.issue_access_token(&user.id)?;

        let refresh_token = generate_refresh_token();
        let expires_at = Utc::now()
            .checked_add_signed(self.settings.refresh_token_ttl())
            .ok_or_else(|| {
                ConfigError::InvalidValue("auth.refresh_token_expiry is out of range".to_string())
            })?;
        self.refresh_tokens
            .create(user.id, &refresh_token, expires_at)
            .await?;

        tracing::info!(user_id = %user.id, "Session started");

        Ok(Session {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Exchange a presented refresh token for a new access token
    ///
    /// `authorization` is the raw `Authorization` header value.
    pub async fn refresh(&self, authorization: &str) -> Result<String, AppError> {
        let token = extract_bearer(authorization)?;

        let user_id = match self.refresh_tokens.find_active(token).await {
            Ok(user_id) => user_id,
            Err(StoreError::NotFound) => {
                tracing::warn!("Refresh rejected: token missing, revoked or expired");
                return Err(AuthError::InvalidToken.into());
            }
            Err(e) => return Err(e.into()),
        };

        let access_token = self.issue_access_token(&user_id)?;
        tracing::info!(user_id = %user_id, "Access token refreshed");
        Ok(access_token)
    }

    /// Revoke a presented refresh token
    ///
    /// Succeeds for unknown and already revoked tokens alike; fails only
    /// when no credential was presented.
    pub async fn logout(&self, authorization: &str) -> Result<(), AppError> {
        let token = extract_bearer(authorization)?;
        self.refresh_tokens.revoke(token).await?;
        tracing::info!("Refresh token revoked");
        Ok(())
    }

    /// End every session of a user, e.g. after a credential change
    pub async fn revoke_all(&self, user_id: Uuid) -> Result<u64, AppError> {
        let revoked = self.refresh_tokens.revoke_all_for_user(user_id).await?;
        tracing::info!(user_id = %user_id, revoked, "All refresh tokens revoked for user");
        Ok(revoked)
    }

    /// Resolve the subject of a presented access token
    pub fn authenticate(&self, authorization: &str) -> Result<Uuid, AuthError> {
        let token = extract_bearer(authorization)?;
        validate_access_token(token, &self.settings.secret)
    }

    /// Resolve the subject and require it to own the resource
    pub fn authorize(&self, authorization: &str, owner: Uuid) -> Result<Uuid, AuthError> {
        let subject = self.authenticate(authorization)?;
        ensure_owner(subject, owner)?;
        Ok(subject)
    }

    fn issue_access_token(&self, user_id: &Uuid) -> Result<String, AuthError> {
        issue_access_token(
            user_id,
            &self.settings.secret,
            self.settings.access_token_ttl(),
        )
    }
}

/// A valid identity that does not own the resource is `Forbidden`.
pub fn ensure_owner(subject: Uuid, owner: Uuid) -> Result<(), AuthError> {
    if subject != owner {
        tracing::warn!(subject = %subject, owner = %owner, "Ownership check failed");
        return Err(AuthError::Forbidden);
    }
    Ok(())
}
