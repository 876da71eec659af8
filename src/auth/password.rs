//! Password hashing and validation.
//!
//! Argon2id hashing with a minimal strength policy applied at registration.

use crate::error::{PlanholdError, Result};

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher as Argon2Hasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Configuration for password hashing.
#[derive(Clone, Debug)]
pub struct PasswordConfig {
    /// Memory cost in KiB (default: 19456 = 19MB)
    pub memory_cost: u32,
    /// Time cost / iterations (default: 2)
    pub time_cost: u32,
    /// Parallelism (default: 1)
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        // OWASP recommended minimum for Argon2id
        Self {
            memory_cost: 19 * 1024, // 19 MiB
            time_cost: 2,
            parallelism: 1,
        }
    }
}

impl PasswordConfig {
    /// Faster settings for development/testing (NOT for production).
    #[cfg(any(test, debug_assertions))]
    pub fn fast() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }
}

/// Handles password hashing and verification using Argon2id.
#[derive(Clone)]
pub struct PasswordHasher {
    config: PasswordConfig,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(PasswordConfig::default())
    }
}

impl PasswordHasher {
    pub fn new(config: PasswordConfig) -> Self {
        Self { config }
    }

    /// Hash a password, returning the PHC-formatted hash string.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = self.build_argon2()?;

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PlanholdError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against a stored hash.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PlanholdError::Internal(format!("Invalid password hash format: {}", e)))?;

        // Argon2 verify is already constant-time
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    fn build_argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.config.memory_cost,
            self.config.time_cost,
            self.config.parallelism,
            None,
        )
        .map_err(|e| PlanholdError::Internal(format!("Invalid Argon2 params: {}", e)))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Password strength validation policy.
#[derive(Clone, Debug)]
pub struct PasswordPolicy {
    /// Minimum length (default: 8)
    pub min_length: usize,
    /// Maximum length (default: 128, prevents hashing DoS)
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
        }
    }
}

impl PasswordPolicy {
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = len;
        self
    }

    /// Validate a password, returning a typed validation error on failure.
    pub fn check(&self, password: &str) -> Result<()> {
        if password.len() < self.min_length {
            return Err(PlanholdError::validation(format!(
                "Password must be at least {} characters",
                self.min_length
            )));
        }
        if password.len() > self.max_length {
            return Err(PlanholdError::validation(format!(
                "Password must be at most {} characters",
                self.max_length
            )));
        }
        Ok(())
    }
}
