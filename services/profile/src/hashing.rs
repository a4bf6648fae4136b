//! Password hashing with Argon2id
//!
//! The work factor is configurable; parameters outside the range Argon2
//! accepts are rejected when a hash is requested.

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use thiserror::Error;
use tracing::error;

/// Longest password accepted for hashing, in bytes
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Error, Debug)]
pub enum HashError {
    #[error("invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("password exceeds {max} bytes")]
    PasswordTooLong { max: usize },

    #[error("failed to hash password: {0}")]
    Hashing(String),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),

    #[error("password does not match")]
    Mismatch,
}

/// One-way salted password hashing
pub trait CredentialHasher: Send + Sync {
    fn hash_password(&self, plain: &str) -> Result<String, HashError>;
    fn compare_password(&self, hash: &str, plain: &str) -> Result<(), HashError>;
}

/// Argon2id work factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Argon2id implementation of [`CredentialHasher`]
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    config: HashConfig,
}

impl Argon2Hasher {
    pub fn new(config: HashConfig) -> Self {
        Self { config }
    }

    fn argon2(&self) -> Result<Argon2<'static>, HashError> {
        let params = Params::new(
            self.config.memory_kib,
            self.config.iterations,
            self.config.parallelism,
            None,
        )
        .map_err(|e| HashError::InvalidParams(e.to_string()))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash_password(&self, plain: &str) -> Result<String, HashError> {
        if plain.len() > MAX_PASSWORD_BYTES {
            return Err(HashError::PasswordTooLong {
                max: MAX_PASSWORD_BYTES,
            });
        }

        let argon2 = self.argon2()?;
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                HashError::Hashing(e.to_string())
            })?
            .to_string();

        Ok(hash)
    }

    fn compare_password(&self, hash: &str, plain: &str) -> Result<(), HashError> {
        let parsed = PasswordHash::new(hash).map_err(|e| HashError::MalformedHash(e.to_string()))?;

        // Parameters come from the stored hash, not from the current work factor.
        Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .map_err(|_| HashError::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn fast_hasher() -> Argon2Hasher {
        Argon2Hasher::new(HashConfig {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = fast_hasher();
        let first = hasher.hash_password("Abcd9!").unwrap();
        let second = hasher.hash_password("Abcd9!").unwrap();

        assert!(!first.is_empty());
        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_hash_rejects_out_of_range_work_factor() {
        let hasher = Argon2Hasher::new(HashConfig {
            memory_kib: 64,
            iterations: 0,
            parallelism: 1,
        });
        let err = hasher.hash_password("Abcd9!").unwrap_err();
        assert!(matches!(err, HashError::InvalidParams(_)));

        let hasher = Argon2Hasher::new(HashConfig {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
        });
        assert!(matches!(
            hasher.hash_password("Abcd9!"),
            Err(HashError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_hash_input_length_boundary() {
        let hasher = fast_hasher();
        assert_ok!(hasher.hash_password(&"a".repeat(MAX_PASSWORD_BYTES)));

        let err = hasher
            .hash_password(&"a".repeat(MAX_PASSWORD_BYTES + 1))
            .unwrap_err();
        assert!(matches!(err, HashError::PasswordTooLong { max: 72 }));
    }

    #[test]
    fn test_hash_input_length_counts_bytes() {
        let hasher = fast_hasher();
        // 37 characters, 74 bytes
        let password = "é".repeat(37);
        assert_err!(hasher.hash_password(&password));
    }

    #[test]
    fn test_compare_roundtrip() {
        let hasher = fast_hasher();
        let hash = hasher.hash_password("Secur3P@ss").unwrap();
        assert_ok!(hasher.compare_password(&hash, "Secur3P@ss"));
    }

    #[test]
    fn test_compare_rejects_wrong_password() {
        let hasher = fast_hasher();
        let hash = hasher.hash_password("Secur3P@ss").unwrap();
        let err = hasher.compare_password(&hash, "Secur3P@sS").unwrap_err();
        assert!(matches!(err, HashError::Mismatch));
    }

    #[test]
    fn test_compare_rejects_short_hash() {
        let hasher = fast_hasher();
        let err = hasher.compare_password("a", "").unwrap_err();
        assert!(matches!(err, HashError::MalformedHash(_)));
    }

    #[test]
    fn test_compare_uses_parameters_from_hash() {
        let hash = fast_hasher().hash_password("Abcd9!").unwrap();
        assert_ok!(Argon2Hasher::default().compare_password(&hash, "Abcd9!"));
    }
}
