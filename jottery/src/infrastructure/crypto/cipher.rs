// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! PBKDF2 key derivation and AES-256-GCM authenticated encryption.
//!
//! Decryption failures — whether from a wrong key or corrupted ciphertext —
//! always collapse to a single [`JotteryError::DecryptError`]; nothing here
//! lets a caller tell the two apart.

use std::num::NonZeroU32;

use aes_gcm::aead::AeadInPlace;
use aes_gcm::{Aes256Gcm, KeyInit};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use jottery_domain::JotteryError;
use ring::rand::{SecureRandom, SystemRandom};

use super::secure_key::SecureKey;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// A ciphertext/IV pair, both base64-encoded for storage and transport.
/// The GCM authentication tag is appended to `ciphertext` as the algorithm
/// defines; it is not carried as a separate field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub ciphertext: String,
    pub iv: String,
}

/// Derives a 256-bit key from a password and salt using PBKDF2-HMAC-SHA256.
/// Deterministic: the same inputs always yield the same key.
pub fn derive(password: &str, salt: &[u8], iterations: u32) -> Result<SecureKey, JotteryError> {
    let iterations =
        NonZeroU32::new(iterations).ok_or_else(|| JotteryError::KeyDerivationError("iterations must be > 0".into()))?;
    let mut key = [0u8; KEY_LEN];
    ring::pbkdf2::derive(
        ring::pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt,
        password.as_bytes(),
        &mut key,
    );
    Ok(SecureKey::new(key.to_vec()))
}

/// Generates a fresh, cryptographically strong 32-byte salt.
pub fn random_salt() -> Result<Vec<u8>, JotteryError> {
    random_bytes(32)
}

/// Generates a fresh, cryptographically strong 96-bit IV.
pub fn random_iv() -> Result<Vec<u8>, JotteryError> {
    random_bytes(NONCE_LEN)
}

fn random_bytes(len: usize) -> Result<Vec<u8>, JotteryError> {
    let rng = SystemRandom::new();
    let mut buf = vec![0u8; len];
    rng.fill(&mut buf)
        .map_err(|_| JotteryError::KeyDerivationError("failed to generate random bytes".into()))?;
    Ok(buf)
}

/// SHA-256 digest of cleartext content, used for conflict-detection
/// fingerprints without decrypting.
pub fn hash(text: &str) -> [u8; 32] {
    let digest = ring::digest::digest(&ring::digest::SHA256, text.as_bytes());
    let mut out = [0u8; 32];
    out.copy_from_slice(digest.as_ref());
    out
}

pub fn new_uuid() -> uuid::Uuid {
    uuid::Uuid::new_v4()
}

pub fn encrypt_text(plaintext: &str, key: &SecureKey) -> Result<Envelope, JotteryError> {
    encrypt_bytes(plaintext.as_bytes(), key)
}

pub fn decrypt_text(envelope: &Envelope, key: &SecureKey) -> Result<String, JotteryError> {
    let bytes = decrypt_bytes(envelope, key)?;
    String::from_utf8(bytes).map_err(|_| JotteryError::DecryptError)
}

pub fn encrypt_bytes(plaintext: &[u8], key: &SecureKey) -> Result<Envelope, JotteryError> {
    let iv = random_iv()?;
    let cipher_key = aes_gcm::Key::<Aes256Gcm>::from_slice(key.as_slice());
    let cipher = Aes256Gcm::new(cipher_key);
    let nonce = aes_gcm::Nonce::from_slice(&iv);

    let mut buffer = plaintext.to_vec();
    cipher
        .encrypt_in_place(nonce, b"", &mut buffer)
        .map_err(|_| JotteryError::DecryptError)?;

    Ok(Envelope {
        ciphertext: BASE64.encode(buffer),
        iv: BASE64.encode(iv),
    })
}

pub fn decrypt_bytes(envelope: &Envelope, key: &SecureKey) -> Result<Vec<u8>, JotteryError> {
    let ciphertext = BASE64.decode(&envelope.ciphertext).map_err(|_| JotteryError::DecryptError)?;
    let iv = BASE64.decode(&envelope.iv).map_err(|_| JotteryError::DecryptError)?;
    if iv.len() != NONCE_LEN {
        return Err(JotteryError::DecryptError);
    }

    let cipher_key = aes_gcm::Key::<Aes256Gcm>::from_slice(key.as_slice());
    let cipher = Aes256Gcm::new(cipher_key);
    let nonce = aes_gcm::Nonce::from_slice(&iv);

    let mut buffer = ciphertext;
    cipher
        .decrypt_in_place(nonce, b"", &mut buffer)
        .map_err(|_| JotteryError::DecryptError)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_text_through_the_same_key() {
        let key = derive("correct horse battery staple", &random_salt().unwrap(), 1000).unwrap();
        let envelope = encrypt_text("hello", &key).unwrap();
        assert_eq!(decrypt_text(&envelope, &key).unwrap(), "hello");
    }

    #[test]
    fn decryption_under_a_different_key_fails_closed() {
        let salt = random_salt().unwrap();
        let key_a = derive("password-a", &salt, 1000).unwrap();
        let key_b = derive("password-b", &salt, 1000).unwrap();
        let envelope = encrypt_text("secret", &key_a).unwrap();
        assert!(matches!(decrypt_text(&envelope, &key_b), Err(JotteryError::DecryptError)));
    }

    #[test]
    fn tampered_ciphertext_fails_closed() {
        let key = derive("password", &random_salt().unwrap(), 1000).unwrap();
        let mut envelope = encrypt_text("secret", &key).unwrap();
        let mut raw = BASE64.decode(&envelope.ciphertext).unwrap();
        raw[0] ^= 0xFF;
        envelope.ciphertext = BASE64.encode(raw);
        assert!(matches!(decrypt_text(&envelope, &key), Err(JotteryError::DecryptError)));
    }

    #[test]
    fn derive_is_deterministic_for_the_same_inputs() {
        let salt = random_salt().unwrap();
        let a = derive("password", &salt, 1000).unwrap();
        let b = derive("password", &salt, 1000).unwrap();
        assert_eq!(a.as_slice(), b.as_slice());
    }

    #[test]
    fn derive_differs_across_distinct_salts() {
        let a = derive("password", &random_salt().unwrap(), 1000).unwrap();
        let b = derive("password", &random_salt().unwrap(), 1000).unwrap();
        assert_ne!(a.as_slice(), b.as_slice());
    }

    #[test]
    fn hash_is_stable_for_the_same_text() {
        assert_eq!(hash("hello"), hash("hello"));
        assert_ne!(hash("hello"), hash("world"));
    }
}
