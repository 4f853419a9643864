use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use thiserror::Error;

use crate::config;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid admin password hash")]
    InvalidHash,
    #[error("admin password cannot be empty")]
    EmptyPassword,
    #[error("failed to hash password: {0}")]
    Hash(String),
}

/// Verifies the admin password carried by privileged requests.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    hash: String,
}

impl AdminAuth {
    pub fn from_config(config: &config::AppConfig) -> Result<Option<Self>, AuthError> {
        let Some(hash) = config.admin_password_hash.as_deref() else {
            return Ok(None);
        };
        let hash = hash.trim();
        PasswordHash::new(hash).map_err(|_| AuthError::InvalidHash)?;
        Ok(Some(Self {
            hash: hash.to_string(),
        }))
    }

    pub fn verify(&self, password: &str) -> bool {
        let hash = match PasswordHash::new(&self.hash) {
            Ok(hash) => hash,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok()
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut rng = OsRng;
    hash_password_with_rng(password, &mut rng)
}

pub(crate) fn hash_password_with_rng<R: RngCore + CryptoRng>(
    password: &str,
    rng: &mut R,
) -> Result<String, AuthError> {
    if password.is_empty() {
        return Err(AuthError::EmptyPassword);
    }
    let salt = SaltString::generate(rng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Hash(err.to_string()))
}
