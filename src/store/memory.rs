/// In-process stores
///
/// Same contracts as `PgStore`, including the email uniqueness constraint
/// and cascading user deletion. Locks are never held across an await.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{ChirpRecord, ChirpStore, RefreshTokenStore, UserRecord, UserStore};
use crate::auth::hash_token;
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct RefreshTokenRow {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
    revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRow {
    fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<Uuid, UserRecord>>,
    chirps: Mutex<Vec<ChirpRecord>>,
    refresh_tokens: Mutex<HashMap<String, RefreshTokenRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn create(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tokens = lock(&self.refresh_tokens)?;
        let key = hash_token(token);
        if tokens.contains_key(&key) {
            return Err(StoreError::UniqueViolation("refresh token".to_string()));
        }
        tokens.insert(
            key,
            RefreshTokenRow {
                user_id,
                expires_at,
                revoked_at: None,
            },
        );
        Ok(())
    }

    async fn find_active(&self, token: &str) -> Result<Uuid, StoreError> {
        let tokens = lock(&self.refresh_tokens)?;
        tokens
            .get(&hash_token(token))
            .filter(|row| row.is_active(Utc::now()))
            .map(|row| row.user_id)
            .ok_or(StoreError::NotFound)
    }

    async fn revoke(&self, token: &str) -> Result<(), StoreError> {
        let mut tokens = lock(&self.refresh_tokens)?;
        if let Some(row) = tokens.get_mut(&hash_token(token)) {
            row.revoked_at.get_or_insert_with(Utc::now);
        }
        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut tokens = lock(&self.refresh_tokens)?;
        let now = Utc::now();
        let mut revoked = 0;
        for row in tokens
            .values_mut()
            .filter(|row| row.user_id == user_id && row.revoked_at.is_none())
        {
            row.revoked_at = Some(now);
            revoked += 1;
        }
        Ok(revoked)
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        lock(&self.refresh_tokens)?.clear();
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, StoreError> {
        let mut users = lock(&self.users)?;
        if users.values().any(|user| user.email == email) {
            return Err(StoreError::UniqueViolation("email".to_string()));
        }

        let now = Utc::now();
        let user = UserRecord {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
            is_chirpy_red: false,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<UserRecord, StoreError> {
        lock(&self.users)?
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, StoreError> {
        let mut users = lock(&self.users)?;
        if users.values().any(|user| user.email == email && user.id != id) {
            return Err(StoreError::UniqueViolation("email".to_string()));
        }

        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.email = email.to_string();
        user.hashed_password = hashed_password.to_string();
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn upgrade_to_red(&self, id: Uuid) -> Result<(), StoreError> {
        let mut users = lock(&self.users)?;
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        user.is_chirpy_red = true;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_all_users(&self) -> Result<(), StoreError> {
        lock(&self.refresh_tokens)?.clear();
        lock(&self.chirps)?.clear();
        lock(&self.users)?.clear();
        Ok(())
    }
}

#[async_trait]
impl ChirpStore for MemoryStore {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<ChirpRecord, StoreError> {
        if !lock(&self.users)?.contains_key(&user_id) {
            return Err(StoreError::Query("chirp author does not exist".to_string()));
        }

        let now = Utc::now();
        let chirp = ChirpRecord {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            body: body.to_string(),
            user_id,
        };
        lock(&self.chirps)?.push(chirp.clone());
        Ok(chirp)
    }

    async fn list_chirps(&self) -> Result<Vec<ChirpRecord>, StoreError> {
        Ok(lock(&self.chirps)?.clone())
    }

    async fn get_chirp(&self, id: Uuid) -> Result<ChirpRecord, StoreError> {
        lock(&self.chirps)?
            .iter()
            .find(|chirp| chirp.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn delete_chirp(&self, id: Uuid) -> Result<(), StoreError> {
        let mut chirps = lock(&self.chirps)?;
        let before = chirps.len();
        chirps.retain(|chirp| chirp.id != id);
        if chirps.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn active_token_resolves_to_owner() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        store
            .create(user_id, "token-a", Utc::now() + Duration::days(1))
            .await
            .unwrap();

        assert_eq!(store.find_active("token-a").await.unwrap(), user_id);
    }

    #[tokio::test]
    async fn missing_revoked_and_expired_tokens_look_the_same() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        store
            .create(user_id, "revoked", Utc::now() + Duration::days(1))
            .await
            .unwrap();
        store
            .create(user_id, "expired", Utc::now() - Duration::seconds(1))
            .await
            .unwrap();
        store.revoke("revoked").await.unwrap();

        for token in ["never-issued", "revoked", "expired"] {
            assert!(matches!(
                store.find_active(token).await,
                Err(StoreError::NotFound)
            ));
        }
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let store = MemoryStore::new();
        store
            .create(Uuid::new_v4(), "token", Utc::now() + Duration::days(1))
            .await
            .unwrap();

        store.revoke("token").await.unwrap();
        store.revoke("token").await.unwrap();
        store.revoke("unknown").await.unwrap();
    }

    #[tokio::test]
    async fn revoke_all_only_touches_one_user() {
        let store = MemoryStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let expires = Utc::now() + Duration::days(1);
        store.create(alice, "alice-phone", expires).await.unwrap();
        store.create(alice, "alice-laptop", expires).await.unwrap();
        store.create(bob, "bob-phone", expires).await.unwrap();

        assert_eq!(store.revoke_all_for_user(alice).await.unwrap(), 2);
        assert!(store.find_active("alice-phone").await.is_err());
        assert!(store.find_active("alice-laptop").await.is_err());
        assert_eq!(store.find_active("bob-phone").await.unwrap(), bob);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let store = MemoryStore::new();
        store.create_user("a@example.com", "hash").await.unwrap();

        assert!(matches!(
            store.create_user("a@example.com", "hash").await,
            Err(StoreError::UniqueViolation(_))
        ));
    }

    #[tokio::test]
    async fn deleting_users_cascades() {
        let store = MemoryStore::new();
        let user = store.create_user("a@example.com", "hash").await.unwrap();
        store.create_chirp(user.id, "hello").await.unwrap();
        store
            .create(user.id, "token", Utc::now() + Duration::days(1))
            .await
            .unwrap();

        store.delete_all_users().await.unwrap();

        assert!(store.list_chirps().await.unwrap().is_empty());
        assert!(store.find_active("token").await.is_err());
        assert!(store.find_by_email("a@example.com").await.is_err());
    }

    #[tokio::test]
    async fn chirps_keep_insertion_order() {
        let store = MemoryStore::new();
        let user = store.create_user("a@example.com", "hash").await.unwrap();
        let first = store.create_chirp(user.id, "first").await.unwrap();
        let second = store.create_chirp(user.id, "second").await.unwrap();

        let ids: Vec<Uuid> = store.list_chirps().await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);

        store.delete_chirp(first.id).await.unwrap();
        assert!(matches!(
            store.delete_chirp(first.id).await,
            Err(StoreError::NotFound)
        ));
    }
}
