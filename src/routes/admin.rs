/// Admin Routes

use actix_web::{web, HttpResponse};

use crate::configuration::ApplicationSettings;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::store::{RefreshTokenStore, UserStore};

/// POST /admin/reset
///
/// Wipes refresh tokens, then users (their chirps go with them). Only
/// available when the platform is `dev`.
///
/// # Errors
/// - 403: Any other platform
pub async fn reset(
    application: web::Data<ApplicationSettings>,
    refresh_tokens: web::Data<dyn RefreshTokenStore>,
    users: web::Data<dyn UserStore>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("admin_reset");

    if !application.is_dev() {
        tracing::warn!(
            request_id = %context.request_id,
            platform = %application.platform,
            "Reset refused outside dev platform"
        );
        return Err(AuthError::Forbidden.into());
    }

    refresh_tokens.delete_all().await?;
    users.delete_all_users().await?;

    tracing::info!(request_id = %context.request_id, "All users and sessions reset");

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Reset complete"))
}
