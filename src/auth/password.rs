//! Password hashing
//!
//! Stored hashes are `hex(salt)$hex(HMAC-SHA256(pepper, salt || password))`.
//! The pepper lives only in process configuration, never next to the hash.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const SALT_LEN: usize = 16;

/// Password hashing errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password cannot be empty")]
    EmptyPassword,
}

/// Salted and peppered password hasher
#[derive(Clone)]
pub struct PasswordHasher {
    pepper: Vec<u8>,
}

impl PasswordHasher {
    pub fn new(pepper: &str) -> Self {
        Self {
            pepper: pepper.as_bytes().to_vec(),
        }
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, plain_text: &str) -> Result<String, PasswordError> {
        if plain_text.is_empty() {
            return Err(PasswordError::EmptyPassword);
        }

        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);

        let digest = self.mac(&salt, plain_text).finalize().into_bytes();
        Ok(format!("{}${}", hex::encode(salt), hex::encode(digest)))
    }

    /// Check a password against a stored hash in constant time
    ///
    /// Malformed or empty stored hashes never verify.
    pub fn verify(&self, plain_text: &str, stored: &str) -> bool {
        let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
            return false;
        };
        let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
            return false;
        };
        if salt.is_empty() || expected.is_empty() {
            return false;
        }

        self.mac(&salt, plain_text).verify_slice(&expected).is_ok()
    }

    fn mac(&self, salt: &[u8], plain_text: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.pepper).expect("HMAC can take key of any size");
        mac.update(salt);
        mac.update(plain_text.as_bytes());
        mac
    }
}
