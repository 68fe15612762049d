/// Input validators for request bodies
///
/// Runs at the HTTP boundary so the core only ever sees well-formed
/// emails, bounded passwords and bounded chirp bodies.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MIN_EMAIL_LENGTH: usize = 5;
const MAX_EMAIL_LOCAL_PART: usize = 64;
/// bcrypt ignores everything past 72 bytes
const MAX_PASSWORD_BYTES: usize = 72;
pub const MAX_CHIRP_LENGTH: usize = 140;

lazy_static! {
    // RFC 5322 simplified email regex (practical validation)
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();
}

/// Validates and normalises an email address
/// - Trims surrounding whitespace
/// - Checks length and format
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email"));
    }

    if trimmed.len() < MIN_EMAIL_LENGTH {
        return Err(ValidationError::TooShort("email", MIN_EMAIL_LENGTH));
    }

    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email", MAX_EMAIL_LENGTH));
    }

    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    if has_suspicious_email_patterns(trimmed) {
        return Err(ValidationError::SuspiciousContent("email"));
    }

    Ok(trimmed.to_string())
}

/// Passwords are taken verbatim; only emptiness and the bcrypt input
/// limit are checked.
pub fn is_valid_password(password: &str) -> Result<&str, ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_BYTES));
    }

    Ok(password)
}

/// Chirp bodies are limited to 140 characters.
pub fn is_valid_chirp(body: &str) -> Result<&str, ValidationError> {
    if body.trim().is_empty() {
        return Err(ValidationError::EmptyField("chirp"));
    }

    if body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(ValidationError::TooLong("chirp", MAX_CHIRP_LENGTH));
    }

    Ok(body)
}

fn has_suspicious_email_patterns(email: &str) -> bool {
    if let Some(at_pos) = email.find('@') {
        if at_pos > MAX_EMAIL_LOCAL_PART {
            return true;
        }
    }

    email.matches('@').count() != 1 || email.contains('\0')
}
