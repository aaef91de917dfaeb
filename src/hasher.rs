//! Password hashing.
//!
//! The hashed input is `plaintext ‖ salt ‖ login`, so the same password stored
//! for two logins yields unrelated verifiers. Argon2id adds its own random salt
//! per hash; the configured salt is a static pepper shared by every record.
//!
//! Verifiers are Argon2id PHC strings. Bcrypt verifiers written by earlier
//! deployments are not compatible: they always fail to check, so those
//! passwords must be added again after migrating.

use crate::config::HashConfig;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand_core::OsRng;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("invalid hash parameters: {0}")]
    Params(String),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Turns a login/plaintext pair into a verifier and checks it back.
pub trait Hasher: Send + Sync {
    /// Compute a new verifier.
    ///
    /// # Errors
    /// Returns an error only if the hashing primitive fails.
    fn hash(&self, subject_id: Uuid, plaintext: &str) -> Result<String, HashError>;

    /// `false` on mismatch and on a malformed verifier.
    fn check(&self, subject_id: Uuid, plaintext: &str, verifier: &str) -> bool;
}

#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
    salt: SecretString,
}

impl Argon2Hasher {
    /// Build an Argon2id hasher with the configured cost.
    ///
    /// # Errors
    /// Returns [`HashError::Params`] if the cost parameters are out of range.
    pub fn new(config: &HashConfig) -> Result<Self, HashError> {
        let params = Params::new(config.memory_kib(), config.iterations(), 1, None)
            .map_err(|e| HashError::Params(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            salt: config.salt().clone(),
        })
    }

    fn input(&self, subject_id: Uuid, plaintext: &str) -> String {
        format!(
            "{plaintext}{}{}",
            self.salt.expose_secret(),
            subject_id.hyphenated()
        )
    }
}

impl Hasher for Argon2Hasher {
    fn hash(&self, subject_id: Uuid, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(self.input(subject_id, plaintext).as_bytes(), &salt)
            .map_err(|e| HashError::Hash(e.to_string()))?;

        Ok(hash.to_string())
    }

    fn check(&self, subject_id: Uuid, plaintext: &str, verifier: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(verifier) else {
            return false;
        };

        // Cost parameters come from the stored hash, not from self.
        self.argon2
            .verify_password(self.input(subject_id, plaintext).as_bytes(), &parsed)
            .is_ok()
    }
}
