/// Password Hashing and Verification
///
/// Salted bcrypt hashing. Every call to `hash` draws a fresh salt, so the
/// same secret never produces the same string twice, while `verify` stays
/// consistent for any hash this module produced.

use bcrypt::{hash, verify};

use crate::error::AuthError;

pub const DEFAULT_HASH_COST: u32 = bcrypt::DEFAULT_COST;
pub const MIN_HASH_COST: u32 = 4;
pub const MAX_HASH_COST: u32 = 31;

/// One-way password hasher with a fixed work factor
#[derive(Debug, Clone, Copy)]
pub struct CredentialHasher {
    cost: u32,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_COST)
    }
}

impl CredentialHasher {
    /// Costs outside the bcrypt range are clamped into it.
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_HASH_COST, MAX_HASH_COST),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a secret
    ///
    /// # Errors
    /// `AuthError::Hashing` when the salt cannot be generated or the
    /// underlying computation fails.
    pub fn hash(&self, secret: &str) -> Result<String, AuthError> {
        hash(secret, self.cost).map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Check a secret against a stored hash
    ///
    /// Returns `Ok(false)` on a well-formed mismatch. The comparison inside
    /// bcrypt is constant-time.
    ///
    /// # Errors
    /// `AuthError::MalformedHash` when `hash` is not a bcrypt hash.
    pub fn verify(&self, secret: &str, hash: &str) -> Result<bool, AuthError> {
        // Every verify failure stems from parsing the stored hash.
        verify(secret, hash).map_err(|e| {
            tracing::error!("Stored password hash rejected: {}", e);
            AuthError::MalformedHash
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> CredentialHasher {
        CredentialHasher::new(MIN_HASH_COST)
    }

    #[test]
    fn test_hash_password() {
        let password = "testpassword";
        let first = hasher().hash(password).expect("Failed to hash password");
        let second = hasher().hash(password).expect("Failed to hash password");

        assert!(!first.is_empty());
        assert_ne!(password, first);
        // Salted: same input, different output
        assert_ne!(first, second);
        assert!(first.starts_with("$2"));
    }

    #[test]
    fn test_verify_password() {
        let hash = hasher().hash("anotherpassword").expect("Failed to hash password");

        assert!(hasher().verify("anotherpassword", &hash).unwrap());
        assert!(!hasher().verify("wrongpassword", &hash).unwrap());
    }

    #[test]
    fn verification_does_not_depend_on_configured_cost() {
        let hash = CredentialHasher::new(5).hash("s3cr3t!").unwrap();
        assert!(hasher().verify("s3cr3t!", &hash).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error_not_a_mismatch() {
        let result = hasher().verify("password", "not-a-bcrypt-hash");
        assert!(matches!(result, Err(AuthError::MalformedHash)));
    }

    #[test]
    fn cost_is_clamped() {
        assert_eq!(CredentialHasher::new(1).cost(), MIN_HASH_COST);
        assert_eq!(CredentialHasher::new(99).cost(), MAX_HASH_COST);
        assert_eq!(CredentialHasher::default().cost(), DEFAULT_HASH_COST);
    }
}
