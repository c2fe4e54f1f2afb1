//! # Password Hashing
//!
//! One-way salted password digests (argon2id, PHC string format).
//! The cost is fixed when the hasher is built; production uses the
//! library defaults.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use shop_core::{ShopError, ShopResult};

/// Argon2id password hasher
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Hasher with the argon2 default cost (19 MiB, 2 passes, 1 lane)
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    /// Hasher with an explicit cost.
    ///
    /// `memory_kib` must be at least `8 * lanes`.
    pub fn with_cost(memory_kib: u32, passes: u32, lanes: u32) -> ShopResult<Self> {
        let params = Params::new(memory_kib, passes, lanes, None)
            .map_err(|e| ShopError::Configuration(format!("invalid argon2 cost: {}", e)))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash `plaintext` with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> ShopResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|digest| digest.to_string())
            .map_err(|e| ShopError::Internal(format!("password hashing failed: {}", e)))
    }

    /// Check `plaintext` against a stored digest.
    ///
    /// The cost parameters are read from the digest itself. A digest that
    /// does not parse counts as a mismatch.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => self
                .argon2()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// [`hash`](Self::hash) on the blocking pool
    pub async fn hash_blocking(&self, plaintext: String) -> ShopResult<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| ShopError::Internal(format!("hashing task failed: {}", e)))?
    }

    /// [`verify`](Self::verify) on the blocking pool
    pub async fn verify_blocking(&self, plaintext: String, digest: String) -> ShopResult<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &digest))
            .await
            .map_err(|e| ShopError::Internal(format!("verification task failed: {}", e)))
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
