/// JWT Claims structure
///
/// Registered claims (RFC 7519) carried by access tokens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

/// Issuer tag identifying this system's access tokens
pub const TOKEN_ISSUER: &str = "chirpy-access";

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Claims for `user_id`, valid from `issued_at` for `ttl`.
    ///
    /// Timestamps are whole seconds, floored.
    ///
    /// # Errors
    /// `AuthError::Signing` if the expiry is not representable
    pub fn new(user_id: Uuid, issued_at: DateTime<Utc>, ttl: Duration) -> Result<Self, AuthError> {
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Signing("token expiry out of range".to_string()))?;

        Ok(Self {
            sub: user_id.to_string(),
            iss: TOKEN_ISSUER.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        })
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// `AuthError::InvalidToken` if the subject is empty or not a UUID
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        if self.sub.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)
    }

    /// A token is dead from its `exp` second onward.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.exp, 0)
    }
}
