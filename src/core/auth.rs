//! Password hashing and session tokens for the admin area.
//!
//! Stored hashes have the form `<salt>:<hex sha256(password + salt)>`
//! with a random UUID as the salt.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;

fn digest(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().to_string();
    format!("{}:{}", salt, digest(password, &salt))
}

pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Some((salt, hash)) = stored_hash.split_once(':') else {
        return false;
    };
    if salt.is_empty() || hash.is_empty() {
        return false;
    }
    constant_time_eq(digest(password, salt).as_bytes(), hash.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// 32 random bytes, base64 encoded.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    bytes[..16].copy_from_slice(Uuid::new_v4().as_bytes());
    bytes[16..].copy_from_slice(Uuid::new_v4().as_bytes());
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("hunter22");
        let (salt, hash) = stored.split_once(':').unwrap();
        assert_eq!(salt.len(), 36);
        assert_eq!(hash.len(), 64);
        assert!(verify_password("hunter22", &stored));
        assert!(!verify_password("hunter23", &stored));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("pw", ""));
        assert!(!verify_password("pw", "nosalt"));
        assert!(!verify_password("pw", ":abc"));
        assert!(!verify_password("pw", "salt:"));
    }

    #[test]
    fn test_known_digest() {
        // sha256("passwordsalt")
        assert_eq!(
            digest("password", "salt"),
            "7a37b85c8918eac19a9089c0fa5a2ab4dce3f90528dcdeec108b23ddf3607b99"
        );
    }

    #[test]
    fn test_session_token() {
        let token = generate_session_token();
        assert_eq!(STANDARD.decode(&token).unwrap().len(), 32);
        assert_ne!(token, generate_session_token());
    }
}
