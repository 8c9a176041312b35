//! Argon2id credential hashing.
//!
//! Output is a PHC string (`$argon2id$v=19$m=..,t=..,p=..$<salt>$<hash>`), so
//! the salt and cost travel with the hash and need no separate column.

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use super::error::AuthError;
use crate::config::HashCostConfig;

/// Stored one-way transform of a user's password.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedCredential(String);

impl HashedCredential {
    /// Wrap a value read back from storage. Not validated until verified.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for HashedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedCredential(..)")
    }
}

#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    pub fn new(cost: HashCostConfig) -> Result<Self, AuthError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| AuthError::HashingFailure(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash with a fresh random salt; two calls on the same input differ.
    pub fn hash(&self, secret: &str) -> Result<HashedCredential, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| AuthError::HashingFailure(e.to_string()))?;
        Ok(HashedCredential(hash.to_string()))
    }

    /// Recompute with the embedded salt and cost and compare in constant time.
    pub fn verify(&self, hashed: &HashedCredential, candidate: &str) -> Result<(), AuthError> {
        let parsed = PasswordHash::new(hashed.as_str())
            .map_err(|e| AuthError::HashingFailure(format!("stored hash unreadable: {}", e)))?;

        match self.argon2.verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(()),
            Err(password_hash::Error::Password) => Err(AuthError::Mismatch),
            Err(e) => Err(AuthError::HashingFailure(e.to_string())),
        }
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::distributions::Alphanumeric;

    // Minimum Argon2 cost keeps the randomized test fast.
    fn cheap_hasher() -> CredentialHasher {
        CredentialHasher::new(HashCostConfig {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    fn random_secret(rng: &mut impl Rng) -> String {
        let len = rng.gen_range(0..24);
        if rng.gen_bool(0.5) {
            rng.sample_iter(&Alphanumeric)
                .take(len)
                .map(char::from)
                .collect()
        } else {
            (0..len)
                .filter_map(|_| char::from_u32(rng.gen_range(0x20..0x1_0000)))
                .collect()
        }
    }

    #[test]
    fn test_hash_then_verify() {
        let hasher = cheap_hasher();
        let hashed = hasher.hash("s3cret").unwrap();
        assert!(hashed.as_str().starts_with("$argon2id$"));
        assert!(hasher.verify(&hashed, "s3cret").is_ok());
        assert!(matches!(
            hasher.verify(&hashed, "s3cret "),
            Err(AuthError::Mismatch)
        ));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = cheap_hasher();
        let a = hasher.hash("same input").unwrap();
        let b = hasher.hash("same input").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify(&a, "same input").is_ok());
        assert!(hasher.verify(&b, "same input").is_ok());
    }

    #[test]
    fn test_random_secrets_verify_only_themselves() {
        let hasher = cheap_hasher();
        let mut rng = rand::thread_rng();

        let mut secrets = vec![String::new(), "пароль-密码-🔑".to_string()];
        while secrets.len() < 100 {
            secrets.push(random_secret(&mut rng));
        }

        for secret in &secrets {
            let hashed = hasher.hash(secret).unwrap();
            assert!(hasher.verify(&hashed, secret).is_ok(), "{:?}", secret);

            let mut other = secret.clone();
            other.push('x');
            assert!(matches!(
                hasher.verify(&hashed, &other),
                Err(AuthError::Mismatch)
            ));
        }
    }

    #[test]
    fn test_empty_secret_does_not_match_nonempty() {
        let hasher = cheap_hasher();
        let hashed = hasher.hash("").unwrap();
        assert!(hasher.verify(&hashed, "").is_ok());
        assert!(matches!(hasher.verify(&hashed, " "), Err(AuthError::Mismatch)));
    }

    #[test]
    fn test_malformed_hash_is_a_fault() {
        let hasher = cheap_hasher();
        let bogus = HashedCredential::from_stored("not-a-phc-string");
        assert!(matches!(
            hasher.verify(&bogus, "anything"),
            Err(AuthError::HashingFailure(_))
        ));
    }

    #[test]
    fn test_verifies_hash_from_other_cost() {
        // Stored hashes keep working after the configured cost changes.
        let old = cheap_hasher().hash("rotate me").unwrap();
        let current = CredentialHasher::new(HashCostConfig {
            memory_kib: 16,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        assert!(current.verify(&old, "rotate me").is_ok());
    }

    #[test]
    fn test_debug_redacts() {
        let hashed = HashedCredential::from_stored("$argon2id$secret-bits");
        assert_eq!(format!("{:?}", hashed), "HashedCredential(..)");
    }
}
