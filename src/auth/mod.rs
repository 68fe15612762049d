/// Authentication module
///
/// Password hashing, authorization header parsing, access token
/// issuance/validation, refresh token minting and the session flows
/// built on top of them.

mod bearer;
mod claims;
mod jwt;
mod password;
mod refresh_token;
mod session;

pub use bearer::{extract_api_key, extract_bearer, API_KEY_SCHEME, BEARER_SCHEME};
pub use claims::{Claims, TOKEN_ISSUER};
pub use jwt::{decode_access_token, issue_access_token, validate_access_token};
pub use password::{CredentialHasher, DEFAULT_HASH_COST, MAX_HASH_COST, MIN_HASH_COST};
pub use refresh_token::{generate_refresh_token, hash_token};
pub use session::{ensure_owner, Session, SessionManager};
