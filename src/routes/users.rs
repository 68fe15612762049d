/// User Routes
///
/// Registration and credential updates.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::SessionManager;
use crate::error::{AppError, ErrorContext};
use crate::middleware::AuthenticatedUser;
use crate::store::{UserRecord, UserStore};
use crate::validators::{is_valid_email, is_valid_password};

/// Credentials submitted for registration, login and updates
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user; never includes the password hash
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            updated_at: user.updated_at,
            email: user.email,
            is_chirpy_red: user.is_chirpy_red,
        }
    }
}

/// POST /api/users
///
/// # Errors
/// - 400: Invalid email or password
/// - 409: Email already registered
pub async fn register(
    form: web::Json<CredentialsRequest>,
    users: web::Data<dyn UserStore>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let email = is_valid_email(&form.email)?;
    let password = is_valid_password(&form.password)?;
    let hashed_password = sessions.hash_password(password).await?;

    let user = users.create_user(&email, &hashed_password).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// PUT /api/users
///
/// **Requires a valid access token.** Revokes every refresh token of the
/// user, then replaces email and password.
///
/// # Errors
/// - 401: Missing or invalid access token
/// - 400: Invalid email or password
/// - 409: Email taken by another user
pub async fn update_user(
    caller: AuthenticatedUser,
    form: web::Json<CredentialsRequest>,
    users: web::Data<dyn UserStore>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_update").with_user_id(caller.user_id);

    let email = is_valid_email(&form.email)?;
    let password = is_valid_password(&form.password)?;
    let hashed_password = sessions.hash_password(password).await?;

    // Sessions end before the new credentials land, so a failure in
    // between never leaves old refresh tokens live
    sessions.revoke_all(caller.user_id).await?;
    let user = users
        .update_user(caller.user_id, &email, &hashed_password)
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = ?context.user_id,
        "User credentials updated"
    );

    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use async_trait::async_trait;
    use std::sync::Arc;

    use crate::auth::{issue_access_token, MIN_HASH_COST};
    use crate::configuration::AuthSettings;
    use crate::error::StoreError;
    use crate::store::{MemoryStore, RefreshTokenStore};

    const SECRET: &str = "users-route-secret";

    /// Refresh token store whose bulk revocation is down
    struct RevocationDown(MemoryStore);

    #[async_trait]
    impl RefreshTokenStore for RevocationDown {
        async fn create(
            &self,
            user_id: Uuid,
            token: &str,
            expires_at: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            self.0.create(user_id, token, expires_at).await
        }

        async fn find_active(&self, token: &str) -> Result<Uuid, StoreError> {
            self.0.find_active(token).await
        }

        async fn revoke(&self, token: &str) -> Result<(), StoreError> {
            self.0.revoke(token).await
        }

        async fn revoke_all_for_user(&self, _user_id: Uuid) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection reset".to_string()))
        }

        async fn delete_all(&self) -> Result<(), StoreError> {
            self.0.delete_all().await
        }
    }

    #[actix_web::test]
    async fn failed_revocation_leaves_credentials_unchanged() {
        let users = Arc::new(MemoryStore::new());
        let sessions = SessionManager::new(
            users.clone(),
            Arc::new(RevocationDown(MemoryStore::new())),
            AuthSettings {
                secret: SECRET.to_string(),
                access_token_expiry: 3600,
                refresh_token_expiry: 3600,
                hash_cost: MIN_HASH_COST,
            },
        );
        let hash = sessions.hash_password("s3cr3t!").await.unwrap();
        let alice = users.create_user("alice@example.com", &hash).await.unwrap();
        let token = issue_access_token(&alice.id, SECRET, chrono::Duration::hours(1)).unwrap();

        let user_store: web::Data<dyn UserStore> = web::Data::from(users.clone() as Arc<dyn UserStore>);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(sessions))
                .app_data(user_store)
                .route("/api/users", web::put().to(update_user)),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/api/users")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .set_json(serde_json::json!({
                "email": "alice@chirpy.dev",
                "password": "n3w-s3cr3t"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

        let stored = users.find_by_email("alice@example.com").await.unwrap();
        assert_eq!(stored.hashed_password, hash);
        assert!(users.find_by_email("alice@chirpy.dev").await.is_err());
    }
}
