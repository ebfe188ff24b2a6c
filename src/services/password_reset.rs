use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::api::validation::MIN_PASSWORD_LEN;

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum ResetError {
    /// Shared by unknown and expired tokens so callers cannot tell them apart.
    #[error("Invalid or expired password reset link")]
    InvalidOrExpired,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least {MIN_PASSWORD_LEN} characters long")]
    PasswordTooShort,
}

/// A fresh token: the raw value goes to the user, only the digest is stored.
#[derive(Debug, Clone)]
pub(crate) struct IssuedToken {
    pub(crate) raw: String,
    pub(crate) hash: String,
    pub(crate) expires_at: OffsetDateTime,
}

pub(crate) fn issue_token(now: OffsetDateTime, ttl: Duration) -> IssuedToken {
    let mut bytes = [0_u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let raw = URL_SAFE_NO_PAD.encode(bytes);

    IssuedToken {
        hash: hash_token(&raw),
        raw,
        expires_at: now + ttl,
    }
}

pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.trim().as_bytes());
    hex::encode(hasher.finalize())
}

pub(crate) fn ensure_usable(
    expires_at: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> Result<(), ResetError> {
    match expires_at {
        Some(expires_at) if now < expires_at => Ok(()),
        _ => Err(ResetError::InvalidOrExpired),
    }
}

pub(crate) fn check_new_password(password: &str, confirmation: &str) -> Result<(), ResetError> {
    if password != confirmation {
        return Err(ResetError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ResetError::PasswordTooShort);
    }
    Ok(())
}

pub(crate) fn reset_link(public_base_url: &str, raw_token: &str) -> String {
    format!("{}/reset-password/{raw_token}", public_base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2025-03-01 10:00 +1);

    #[test]
    fn issued_tokens_are_unique_and_hashed() {
        let first = issue_token(NOW, Duration::hours(1));
        let second = issue_token(NOW, Duration::hours(1));

        assert_ne!(first.raw, second.raw);
        assert_eq!(first.hash, hash_token(&first.raw));
        assert_eq!(first.hash.len(), 64);
        assert!(!first.raw.contains('='));
        assert_eq!(first.expires_at, NOW + Duration::hours(1));
    }

    #[test]
    fn unknown_and_expired_tokens_look_the_same() {
        let unknown = ensure_usable(None, NOW);
        let expired = ensure_usable(Some(NOW - Duration::seconds(1)), NOW);
        let at_expiry = ensure_usable(Some(NOW), NOW);

        assert_eq!(unknown, Err(ResetError::InvalidOrExpired));
        assert_eq!(unknown, expired);
        assert_eq!(unknown, at_expiry);
        assert!(ensure_usable(Some(NOW + Duration::minutes(1)), NOW).is_ok());
    }

    #[test]
    fn new_password_must_match_and_be_long_enough() {
        assert_eq!(check_new_password("abcdefgh", "abcdefgx"), Err(ResetError::PasswordMismatch));
        assert_eq!(check_new_password("short", "short"), Err(ResetError::PasswordTooShort));
        assert!(check_new_password("long-enough", "long-enough").is_ok());
    }

    #[test]
    fn link_is_built_from_public_base() {
        assert_eq!(
            reset_link("https://exams.example/", "tok"),
            "https://exams.example/reset-password/tok"
        );
    }
}
