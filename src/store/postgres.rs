/// PostgreSQL-backed stores
///
/// Refresh tokens are keyed by the SHA-256 digest of their value; the
/// plaintext never reaches the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{ChirpRecord, ChirpStore, RefreshTokenStore, UserRecord, UserStore};
use crate::auth::hash_token;
use crate::error::StoreError;

type UserRow = (Uuid, DateTime<Utc>, DateTime<Utc>, String, String, bool);
type ChirpRow = (Uuid, DateTime<Utc>, DateTime<Utc>, String, Uuid);

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: UserRow) -> UserRecord {
    let (id, created_at, updated_at, email, hashed_password, is_chirpy_red) = row;
    UserRecord {
        id,
        created_at,
        updated_at,
        email,
        hashed_password,
        is_chirpy_red,
    }
}

fn chirp_from_row(row: ChirpRow) -> ChirpRecord {
    let (id, created_at, updated_at, body, user_id) = row;
    ChirpRecord {
        id,
        created_at,
        updated_at,
        body,
        user_id,
    }
}

#[async_trait]
impl RefreshTokenStore for PgStore {
    async fn create(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token_hash, user_id, created_at, updated_at, expires_at)
            VALUES ($1, $2, $3, $3, $4)
            "#,
        )
        .bind(hash_token(token))
        .bind(user_id)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_active(&self, token: &str) -> Result<Uuid, StoreError> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id
            FROM refresh_tokens
            WHERE token_hash = $1 AND revoked_at IS NULL AND expires_at > $2
            "#,
        )
        .bind(hash_token(token))
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        user_id.ok_or(StoreError::NotFound)
    }

    async fn revoke(&self, token: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $1, updated_at = $1
            WHERE token_hash = $2 AND revoked_at IS NULL
            "#,
        )
        .bind(Utc::now())
        .bind(hash_token(token))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = $1, updated_at = $1
            WHERE user_id = $2 AND revoked_at IS NULL
            "#,
        )
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM refresh_tokens")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, StoreError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, created_at, updated_at, email, hashed_password)
            VALUES ($1, $2, $2, $3, $4)
            RETURNING id, created_at, updated_at, email, hashed_password, is_chirpy_red
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(now)
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await?;

        Ok(user_from_row(row))
    }

    async fn find_by_email(&self, email: &str) -> Result<UserRecord, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, created_at, updated_at, email, hashed_password, is_chirpy_red
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(user_from_row).ok_or(StoreError::NotFound)
    }

    async fn update_user(
        &self,
        id: Uuid,
        email: &str,
        hashed_password: &str,
    ) -> Result<UserRecord, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET email = $2, hashed_password = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, created_at, updated_at, email, hashed_password, is_chirpy_red
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(hashed_password)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(user_from_row).ok_or(StoreError::NotFound)
    }

    async fn upgrade_to_red(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users SET is_chirpy_red = true, updated_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_all_users(&self) -> Result<(), StoreError> {
        // chirps and refresh_tokens cascade
        sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ChirpStore for PgStore {
    async fn create_chirp(&self, user_id: Uuid, body: &str) -> Result<ChirpRecord, StoreError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, ChirpRow>(
            r#"
            INSERT INTO chirps (id, created_at, updated_at, body, user_id)
            VALUES ($1, $2, $2, $3, $4)
            RETURNING id, created_at, updated_at, body, user_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(now)
        .bind(body)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(chirp_from_row(row))
    }

    async fn list_chirps(&self) -> Result<Vec<ChirpRecord>, StoreError> {
        let rows = sqlx::query_as::<_, ChirpRow>(
            "SELECT id, created_at, updated_at, body, user_id FROM chirps ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(chirp_from_row).collect())
    }

    async fn get_chirp(&self, id: Uuid) -> Result<ChirpRecord, StoreError> {
        let row = sqlx::query_as::<_, ChirpRow>(
            "SELECT id, created_at, updated_at, body, user_id FROM chirps WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(chirp_from_row).ok_or(StoreError::NotFound)
    }

    async fn delete_chirp(&self, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM chirps WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
