//! Secret digests, random secret generation and password hashing

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Length in bytes of a password-reset token before hex encoding
pub const RESET_TOKEN_BYTES: usize = 32;

/// SHA-256 of a short secret (OTP code or reset token), lowercase hex.
///
/// Unsalted: the inputs are either short-lived or high-entropy.
pub fn hash_secret(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hex::encode(hasher.finalize())
}

/// Re-hash `value` and compare with a stored digest in constant time
pub fn verify_secret(value: &str, digest: &str) -> bool {
    let computed = hash_secret(value);
    constant_time_eq(computed.as_bytes(), digest.as_bytes())
}

/// Constant-time byte comparison
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Uniformly random 4-digit passcode in `1000..=9999`
pub fn generate_otp_code() -> String {
    rand::thread_rng().gen_range(1000..=9999).to_string()
}

/// 32 random bytes, hex encoded
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Argon2id PHC string with a fresh random salt
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
}

/// Check a password against a stored PHC string. Unparseable hashes never match.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
