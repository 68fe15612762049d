/// Refresh Token Minting
///
/// Refresh tokens are opaque:
/// - 32 bytes from a CSPRNG, rendered as 64 lowercase hex characters
/// - Stored only as a SHA-256 digest
/// - Never updated in place; revocation is the only mutation

use rand::{thread_rng, RngCore};
use sha2::{Digest, Sha256};

pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate a new refresh token value
///
/// The plaintext is handed to the client; the store keeps the digest.
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Digest under which a refresh token is persisted
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
