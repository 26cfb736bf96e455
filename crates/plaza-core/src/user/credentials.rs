//! Password digest helpers.
//!
//! Passwords are stored as `salt$digest` with a random per-user salt and
//! a SHA-256 digest over `salt || password`. Plaintext passwords never
//! touch the database.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;

/// Derives a storable digest for a new password.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    let digest = digest_with_salt(&salt, password);
    format!(
        "{}${}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(digest)
    )
}

/// Checks a candidate password against a stored `salt$digest` value.
///
/// Malformed stored values never verify.
#[must_use]
pub fn verify_password(candidate: &str, stored: &str) -> bool {
    let Some((salt_part, digest_part)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = URL_SAFE_NO_PAD.decode(salt_part) else {
        return false;
    };
    let Ok(expected) = URL_SAFE_NO_PAD.decode(digest_part) else {
        return false;
    };

    let actual = digest_with_salt(&salt, candidate);
    // Fixed-time comparison over equal-length digests.
    expected.len() == actual.len()
        && expected
            .iter()
            .zip(actual.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn digest_with_salt(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}
