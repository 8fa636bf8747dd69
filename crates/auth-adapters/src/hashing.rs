//! Argon2id hashing for confirmation codes kept at rest.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use domains::{DomainError, DomainResult, SecretHasher};

#[derive(Clone, Default)]
pub struct Argon2SecretHasher {
    argon2: Argon2<'static>,
}

impl Argon2SecretHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Argon2id with explicit memory (KiB) and iteration costs. Confirmation
    /// codes are short-lived, so test setups can go far below the defaults.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> DomainResult<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| DomainError::Internal(format!("invalid argon2 params: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl SecretHasher for Argon2SecretHasher {
    /// Produces a PHC string with a fresh random salt.
    fn hash(&self, secret: &str) -> DomainResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| DomainError::Internal(format!("hashing failed: {e}")))
    }

    /// Malformed hashes never verify.
    fn verify(&self, secret: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        self.argon2
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_secret() {
        let hasher = Argon2SecretHasher::new();
        let hash = hasher.hash("0f3c9a").unwrap();
        assert_ne!(hash, "0f3c9a");
        assert!(hasher.verify("0f3c9a", &hash));
        assert!(!hasher.verify("0f3c9b", &hash));
    }

    #[test]
    fn same_secret_gets_distinct_salts() {
        let hasher = Argon2SecretHasher::new();
        assert_ne!(hasher.hash("code").unwrap(), hasher.hash("code").unwrap());
    }

    #[test]
    fn cheap_params_still_verify() {
        let hasher = Argon2SecretHasher::with_cost(8, 1).unwrap();
        let hash = hasher.hash("code").unwrap();
        assert!(hasher.verify("code", &hash));
        assert!(Argon2SecretHasher::with_cost(0, 1).is_err());
    }

    #[test]
    fn garbage_hash_is_rejected() {
        assert!(!Argon2SecretHasher::new().verify("code", "not-a-phc-string"));
    }
}
