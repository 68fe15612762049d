/// JWT Token Generation and Validation
///
/// Access tokens are self-contained HS256 JWTs. Nothing is stored
/// server-side, so an issued token lives until its own expiry.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, TOKEN_ISSUER};
use crate::error::AuthError;

/// Issue a signed access token for a user
///
/// # Arguments
/// * `user_id` - Subject of the token
/// * `secret` - Shared HMAC key
/// * `ttl` - Lifetime from now
///
/// # Errors
/// `AuthError::Signing` if the key cannot be used for encoding or the
/// expiry is out of range
pub fn issue_access_token(user_id: &Uuid, secret: &str, ttl: Duration) -> Result<String, AuthError> {
    let claims = Claims::new(*user_id, Utc::now(), ttl)?;

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Signing(e.to_string()))
}

/// Decode and check an access token, returning the full claims
///
/// Rejects bad signatures, other algorithms, a foreign issuer, and
/// tokens at or past `exp`. No leeway is granted.
pub fn decode_access_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[TOKEN_ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    validation.leeway = 0;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::warn!("Access token rejected: {}", e);
        AuthError::InvalidToken
    })?;

    // jsonwebtoken still accepts a token during its `exp` second
    if claims.is_expired() {
        tracing::warn!("Access token rejected: expired");
        return Err(AuthError::InvalidToken);
    }

    Ok(claims)
}

/// Validate an access token and return its subject
///
/// # Errors
/// `AuthError::InvalidToken` for every failure, whatever the cause
pub fn validate_access_token(token: &str, secret: &str) -> Result<Uuid, AuthError> {
    decode_access_token(token, secret)?.user_id().map_err(|e| {
        tracing::warn!("Access token rejected: unusable subject");
        e
    })
}
