use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, Params, Version};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::core::config::Settings;

const ARGON2_MEMORY_KIB: u32 = 19_456;
const ARGON2_TIME: u32 = 2;
const ARGON2_PARALLELISM: u32 = 1;

#[derive(Debug, Error)]
pub(crate) enum SecurityError {
    #[error("could not hash password")]
    Hashing,
    #[error("stored password hash is unusable")]
    Verification,
    #[error("could not sign access token")]
    JwtEncoding,
    #[error("access token is invalid or expired")]
    JwtDecoding,
}

/// Bearer token payload; `sub` is the user id.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub(crate) sub: String,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
}

fn argon2id() -> Option<Argon2<'static>> {
    let params = Params::new(ARGON2_MEMORY_KIB, ARGON2_TIME, ARGON2_PARALLELISM, None).ok()?;
    Some(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

/// PHC string for `password` with a fresh random salt.
pub(crate) fn hash_password(password: &str) -> Result<String, SecurityError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2id()
        .and_then(|argon2| argon2.hash_password(password.as_bytes(), &salt).ok())
        .map(|hash| hash.to_string())
        .ok_or(SecurityError::Hashing)
}

/// `Ok(false)` on a wrong password; `Err` only when `hash` is unusable.
pub(crate) fn verify_password(password: &str, hash: &str) -> Result<bool, SecurityError> {
    let stored = PasswordHash::new(hash).map_err(|_| SecurityError::Verification)?;
    let argon2 = argon2id().ok_or(SecurityError::Verification)?;

    match argon2.verify_password(password.as_bytes(), &stored) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(_) => Err(SecurityError::Verification),
    }
}

/// Signs a bearer token for `user_id`. `expires_in` overrides the configured
/// access token lifetime.
pub(crate) fn create_access_token(
    user_id: &str,
    settings: &Settings,
    expires_in: Option<Duration>,
) -> Result<String, SecurityError> {
    let auth = settings.auth();
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.unix_timestamp(),
        exp: (now + expires_in.unwrap_or(auth.access_token_ttl)).unix_timestamp(),
    };

    let key = EncodingKey::from_secret(auth.secret_key.as_bytes());
    encode(&Header::new(auth.algorithm), &claims, &key).map_err(|_| SecurityError::JwtEncoding)
}

pub(crate) fn verify_token(token: &str, settings: &Settings) -> Result<Claims, SecurityError> {
    let auth = settings.auth();
    let mut validation = Validation::new(auth.algorithm);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let key = DecodingKey::from_secret(auth.secret_key.as_bytes());
    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|_| SecurityError::JwtDecoding)
}
