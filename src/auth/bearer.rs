/// Authorization header parsing
///
/// Pulls a presented credential out of an `Authorization` header value.
/// Two schemes are recognised: `Bearer` for access and refresh tokens,
/// and `ApiKey` for the static key used by trusted upstream callers.

use crate::error::AuthError;

pub const BEARER_SCHEME: &str = "Bearer";
pub const API_KEY_SCHEME: &str = "ApiKey";

/// Extract the token from `Bearer <token>`
pub fn extract_bearer(header_value: &str) -> Result<&str, AuthError> {
    extract_credential(header_value, BEARER_SCHEME)
}

/// Extract the key from `ApiKey <key>`
pub fn extract_api_key(header_value: &str) -> Result<&str, AuthError> {
    extract_credential(header_value, API_KEY_SCHEME)
}

/// The scheme must open the value and be followed by whitespace.
fn extract_credential<'a>(header_value: &'a str, scheme: &str) -> Result<&'a str, AuthError> {
    let rest = header_value
        .strip_prefix(scheme)
        .ok_or(AuthError::MissingCredential)?;

    if !rest.starts_with(char::is_whitespace) {
        return Err(AuthError::MissingCredential);
    }

    let credential = rest.trim();
    if credential.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    Ok(credential)
}
