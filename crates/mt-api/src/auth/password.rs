/// Password hashing and verification using Argon2id
///
/// - Algorithm: Argon2id (memory-hard, adaptive cost)
/// - Cost: taken from `PasswordHashConfig` (default 64 MiB, 3 iterations, 4 lanes)
/// - Salt: 16 bytes from the OS RNG, embedded in the PHC string
/// - Output: 32 bytes
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use mt_core::PasswordHashConfig;
use thiserror::Error;

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Invalid Argon2 parameters: {0}")]
    InvalidParams(String),

    #[error("Failed to hash password: {0}")]
    HashingFailed(String),
}

fn argon2_for(config: &PasswordHashConfig) -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(
        config.memory_cost,
        config.time_cost,
        config.parallelism,
        Some(32),
    )
    .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

    Ok(Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        params,
    ))
}

/// Hash a plaintext password
///
/// Returns a PHC string (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`) that
/// carries its own salt and cost, so it is all that needs storing.
///
/// CPU- and memory-heavy: call it from a blocking thread, not an async task.
pub fn hash_password(password: &str, config: &PasswordHashConfig) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = argon2_for(config)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a plaintext password against a stored hash
///
/// Cost and salt are read back from the PHC string; the comparison is
/// constant-time. Anything but an exact match is `false`, including a
/// malformed or truncated hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        tracing::warn!("stored password hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
