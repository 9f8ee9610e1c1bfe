//! Password hashing boundary.
//!
//! Argon2id with costs taken from [`SecurityConfig`]. Hashing and
//! verification are CPU-intensive and run under `spawn_blocking` so they
//! never stall the async runtime.

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::task;

use crate::config::SecurityConfig;

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash string. The hash carries its
/// own cost parameters, so hashes created under older configs still verify.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Run [`hash_password`] on the blocking thread pool.
pub async fn hash(password: String, config: SecurityConfig) -> Result<String> {
    task::spawn_blocking(move || hash_password(&password, &config))
        .await
        .context("Password hashing task panicked")?
}

/// Run [`verify_password`] on the blocking thread pool.
pub async fn verify(password: String, password_hash: String) -> Result<bool> {
    task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .context("Password verification task panicked")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LockoutConfig;

    fn fast_config() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            lockout: LockoutConfig::default(),
        }
    }

    #[test]
    fn hash_then_verify_round_trip() {
        let config = fast_config();
        let hash = hash_password("Sup3r@secret", &config).unwrap();

        assert_ne!(hash, "Sup3r@secret");
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Sup3r@secret", &hash).unwrap());
        assert!(!verify_password("Wr0ng@secret", &hash).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let config = fast_config();
        let first = hash_password("Sup3r@secret", &config).unwrap();
        let second = hash_password("Sup3r@secret", &config).unwrap();

        // Salted: two hashes of the same input never collide.
        assert_ne!(first, second);
    }

    #[test]
    fn garbage_hash_is_an_error_not_a_mismatch() {
        assert!(verify_password("Sup3r@secret", "not-a-phc-string").is_err());
    }
}
