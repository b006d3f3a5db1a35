//! Salted one-way password hashing.
//!
//! New digests use the configured algorithm (bcrypt with an adaptive cost by
//! default, argon2 optionally). Verification follows the format of the stored
//! digest, so rows hashed under a previous setting keep working.

use std::str::FromStr;
use std::sync::Arc;

use argon2::{Argon2, PasswordHash, password_hash::{PasswordHasher as _, PasswordVerifier as _, SaltString}};
use once_cell::sync::OnceCell;
use rand::rngs::OsRng;

use super::errors::CustomerError;

const ARGON2_PREFIX: &str = "$argon2";
const DUMMY_PASSWORD: &str = "dummy-password-for-timing";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PasswordAlgorithm {
    Bcrypt,
    Argon2,
}

impl PasswordAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            PasswordAlgorithm::Bcrypt => "bcrypt",
            PasswordAlgorithm::Argon2 => "argon2",
        }
    }
}

impl FromStr for PasswordAlgorithm {
    type Err = CustomerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bcrypt" => Ok(PasswordAlgorithm::Bcrypt),
            "argon2" => Ok(PasswordAlgorithm::Argon2),
            other => Err(CustomerError::HashError(format!("unsupported password algorithm: {other}"))),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PasswordHasher {
    algorithm: PasswordAlgorithm,
    bcrypt_cost: u32,
    // digest of a fixed password, verified against when no account matches
    dummy: Arc<OnceCell<String>>,
}

impl PasswordHasher {
    pub fn new(algorithm: PasswordAlgorithm, bcrypt_cost: u32) -> Self {
        Self { algorithm, bcrypt_cost, dummy: Arc::new(OnceCell::new()) }
    }

    pub fn bcrypt(cost: u32) -> Self {
        Self::new(PasswordAlgorithm::Bcrypt, cost)
    }

    pub fn algorithm(&self) -> PasswordAlgorithm {
        self.algorithm
    }

    pub fn hash(&self, password: &str) -> Result<String, CustomerError> {
        match self.algorithm {
            PasswordAlgorithm::Bcrypt => {
                bcrypt::hash(password, self.bcrypt_cost).map_err(|e| CustomerError::HashError(e.to_string()))
            }
            PasswordAlgorithm::Argon2 => {
                let salt = SaltString::generate(&mut OsRng);
                Ok(Argon2::default()
                    .hash_password(password.as_bytes(), &salt)
                    .map_err(|e| CustomerError::HashError(e.to_string()))?
                    .to_string())
            }
        }
    }

    /// Check `password` against a stored digest. A malformed digest is an
    /// error, a mismatch is `Ok(false)`.
    pub fn verify(&self, password: &str, digest: &str) -> Result<bool, CustomerError> {
        if digest.starts_with(ARGON2_PREFIX) {
            let parsed = PasswordHash::new(digest).map_err(|e| CustomerError::HashError(e.to_string()))?;
            Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        } else {
            bcrypt::verify(password, digest).map_err(|e| CustomerError::HashError(e.to_string()))
        }
    }

    /// Compute the dummy digest now so no login pays for it.
    pub fn warm_up(&self) -> Result<(), CustomerError> {
        self.dummy_digest().map(|_| ())
    }

    pub(crate) fn is_warm(&self) -> bool {
        self.dummy.get().is_some()
    }

    fn dummy_digest(&self) -> Result<&String, CustomerError> {
        self.dummy.get_or_try_init(|| self.hash(DUMMY_PASSWORD))
    }

    /// Spend the same effort as a real verification and discard the result.
    pub fn verify_dummy(&self, password: &str) -> Result<(), CustomerError> {
        let digest = self.dummy_digest()?;
        let _ = self.verify(password, digest)?;
        Ok(())
    }

    /// `hash` on the blocking pool.
    pub async fn hash_blocking(&self, password: String) -> Result<String, CustomerError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| CustomerError::HashError(e.to_string()))?
    }

    /// `verify` on the blocking pool.
    pub async fn verify_blocking(&self, password: String, digest: String) -> Result<bool, CustomerError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| CustomerError::HashError(e.to_string()))?
    }

    /// `verify_dummy` on the blocking pool.
    pub async fn verify_dummy_blocking(&self, password: String) -> Result<(), CustomerError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify_dummy(&password))
            .await
            .map_err(|e| CustomerError::HashError(e.to_string()))?
    }
}
