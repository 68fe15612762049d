/// Webhook Routes
///
/// Called by the payment provider with `Authorization: ApiKey <key>`.
/// The key is static and independent of token expiry and revocation.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::configuration::WebhookSettings;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::middleware::PresentedApiKey;
use crate::store::UserStore;

const USER_UPGRADED: &str = "user.upgraded";

#[derive(Deserialize)]
pub struct WebhookData {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct WebhookRequest {
    pub event: String,
    pub data: WebhookData,
}

/// Compare digests so the comparison does not depend on where the keys differ.
fn keys_match(presented: &str, expected: &str) -> bool {
    Sha256::digest(presented.as_bytes()) == Sha256::digest(expected.as_bytes())
}

/// POST /api/polka/webhooks
///
/// # Errors
/// - 401: Missing or wrong API key
/// - 404: `user.upgraded` for an unknown user
pub async fn polka_webhook(
    api_key: PresentedApiKey,
    form: web::Json<WebhookRequest>,
    users: web::Data<dyn UserStore>,
    webhooks: web::Data<WebhookSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("polka_webhook");

    if !keys_match(&api_key.0, &webhooks.polka_key) {
        return Err(AuthError::InvalidCredentials.into());
    }

    if form.event != USER_UPGRADED {
        tracing::debug!(request_id = %context.request_id, event = %form.event, "Ignoring webhook event");
        return Ok(HttpResponse::NoContent().finish());
    }

    users.upgrade_to_red(form.data.user_id).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %form.data.user_id,
        "User upgraded to Chirpy Red"
    );

    Ok(HttpResponse::NoContent().finish())
}
