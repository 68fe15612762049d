/// Request extractors for presented credentials
///
/// `AuthenticatedUser` validates `Authorization: Bearer <access token>`
/// before a handler runs. `PresentedApiKey` pulls the static key out of
/// `Authorization: ApiKey <key>`. Both reject with `AppError`, so the
/// caller sees the uniform authentication failure response.

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use uuid::Uuid;

use crate::auth::{ensure_owner, extract_api_key, SessionManager};
use crate::error::{AppError, AuthError};

/// Raw `Authorization` header value; absent or non-ASCII reads as empty.
pub fn authorization_header(req: &HttpRequest) -> &str {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
}

/// Subject of a verified access token
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

impl AuthenticatedUser {
    /// Require the caller to own a resource
    pub fn ensure_owns(&self, owner: Uuid) -> Result<(), AuthError> {
        ensure_owner(self.user_id, owner)
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
    let sessions = req
        .app_data::<web::Data<SessionManager>>()
        .ok_or_else(|| AppError::Internal("Session manager is not configured".to_string()))?;

    let user_id = sessions.authenticate(authorization_header(req))?;
    tracing::debug!(user_id = %user_id, "Access token validated");

    Ok(AuthenticatedUser { user_id })
}

/// Key presented with the `ApiKey` scheme, not yet compared to anything
#[derive(Debug, Clone)]
pub struct PresentedApiKey(pub String);

impl FromRequest for PresentedApiKey {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            extract_api_key(authorization_header(req))
                .map(|key| PresentedApiKey(key.to_string()))
                .map_err(AppError::from),
        )
    }
}
