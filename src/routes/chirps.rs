/// Chirp Routes
///
/// Posting requires an access token; deleting additionally requires
/// owning the chirp.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, ErrorContext};
use crate::middleware::AuthenticatedUser;
use crate::store::ChirpStore;
use crate::validators::is_valid_chirp;

#[derive(Deserialize)]
pub struct ChirpRequest {
    pub body: String,
}

/// POST /api/chirps
///
/// # Errors
/// - 401: Missing or invalid access token
/// - 400: Empty body or longer than 140 characters
pub async fn create_chirp(
    caller: AuthenticatedUser,
    form: web::Json<ChirpRequest>,
    chirps: web::Data<dyn ChirpStore>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("chirp_creation");

    let body = is_valid_chirp(&form.body)?;
    let chirp = chirps.create_chirp(caller.user_id, body).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %caller.user_id,
        chirp_id = %chirp.id,
        "Chirp created"
    );

    Ok(HttpResponse::Created().json(chirp))
}

/// GET /api/chirps
pub async fn list_chirps(chirps: web::Data<dyn ChirpStore>) -> Result<HttpResponse, AppError> {
    let all = chirps.list_chirps().await?;
    Ok(HttpResponse::Ok().json(all))
}

/// GET /api/chirps/{chirp_id}
///
/// # Errors
/// - 404: No such chirp
pub async fn get_chirp(
    path: web::Path<Uuid>,
    chirps: web::Data<dyn ChirpStore>,
) -> Result<HttpResponse, AppError> {
    let chirp = chirps.get_chirp(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(chirp))
}

/// DELETE /api/chirps/{chirp_id}
///
/// # Errors
/// - 401: Missing or invalid access token
/// - 404: No such chirp
/// - 403: Chirp belongs to another user
pub async fn delete_chirp(
    caller: AuthenticatedUser,
    path: web::Path<Uuid>,
    chirps: web::Data<dyn ChirpStore>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("chirp_deletion").with_user_id(caller.user_id);
    let chirp_id = path.into_inner();

    let chirp = chirps.get_chirp(chirp_id).await?;
    caller.ensure_owns(chirp.user_id)?;

    chirps.delete_chirp(chirp_id).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = ?context.user_id,
        chirp_id = %chirp_id,
        "Chirp deleted"
    );

    Ok(HttpResponse::NoContent().finish())
}
