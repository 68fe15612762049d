/// Persistence collaborators
///
/// The core only talks to these traits. `PgStore` backs them with
/// PostgreSQL, `MemoryStore` keeps everything in process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::StoreError;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub hashed_password: String,
    pub is_chirpy_red: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChirpRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

/// Long-lived refresh tokens, addressed by their value
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn create(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Owner of a live token. Missing, revoked and expired tokens are all
    /// `StoreError::NotFound`.
    async fn find_active(&self, token: &str) -> Result<Uuid, StoreError>;

    /// Idempotent; an unknown or already revoked token is not an error.
    async fn revoke(&self, token: &str) -> Result<(), StoreError>;

    /// Revokes every live token of a user, returning how many were live.
    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, StoreError>;

    /// Bulk wipe for the dev reset endpoint.
    async fn delete_all(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// `StoreError::UniqueViolation` when the email is taken.
    async fn create_user(&self, email: &str, hashed_password: &str)
        -> Result<UserRecord, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<UserRecord, StoreError>;

    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, StoreError>;

    async fn upgrade_to_red(&self, id: Uuid) -> Result<(), StoreError>;

    /// Removes every user along with their chirps and refresh tokens.
    async fn delete_all_users(&self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ChirpStore: Send + Sync {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<ChirpRecord, StoreError>;

    /// Oldest first.
    async fn list_chirps(&self) -> Result<Vec<ChirpRecord>, StoreError>;

    async fn get_chirp(&self, id: Uuid) -> Result<ChirpRecord, StoreError>;

    async fn delete_chirp(&self, id: Uuid) -> Result<(), StoreError>;
}
