/// Authentication Routes
///
/// Login, access token refresh and refresh token revocation.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::SessionManager;
use crate::error::{AppError, ErrorContext};
use crate::middleware::authorization_header;
use crate::routes::users::{CredentialsRequest, UserResponse};

/// Login response: the user plus both tokens
#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
}

/// Refresh response
#[derive(Serialize, Deserialize, Debug)]
pub struct RefreshResponse {
    pub token: String,
}

/// POST /api/login
///
/// # Errors
/// - 401: Unknown email or wrong password (same response for both)
///
/// # Security Notes
/// - The email is not format-checked here, so a malformed email fails
///   exactly like an unknown one
pub async fn login(
    form: web::Json<CredentialsRequest>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");

    let session = sessions.login(form.email.trim(), &form.password).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %session.user.id,
        "User logged in successfully"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: session.user.into(),
        token: session.access_token,
        refresh_token: session.refresh_token,
    }))
}

/// POST /api/refresh
///
/// Requires `Authorization: Bearer <refresh token>`. The refresh token
/// itself stays valid.
///
/// # Errors
/// - 401: Missing, unknown, revoked or expired refresh token
pub async fn refresh(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_refresh");

    let token = sessions.refresh(authorization_header(&req)).await?;

    tracing::info!(request_id = %context.request_id, "Token refreshed successfully");

    Ok(HttpResponse::Ok().json(RefreshResponse { token }))
}

/// POST /api/revoke
///
/// Requires `Authorization: Bearer <refresh token>`. Idempotent.
///
/// # Errors
/// - 401: No credential presented
pub async fn revoke(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("token_revoke");

    sessions.logout(authorization_header(&req)).await?;

    tracing::info!(request_id = %context.request_id, "Refresh token revoked");

    Ok(HttpResponse::NoContent().finish())
}
