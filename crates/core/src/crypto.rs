//! Symmetric encryption of secrets stored at rest (SMTP passwords).
//!
//! Values are sealed with AES-256-GCM under a key derived from the configured
//! secret via SHA-256, and serialized as `v1:<nonce_b64>:<ciphertext_b64>`.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Version prefix of the serialized format.
const FORMAT_PREFIX: &str = "v1";

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Malformed ciphertext")]
    Malformed,

    #[error("Base64 decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Decryption failed")]
    Decrypt,

    #[error("Encryption failed")]
    Encrypt,

    #[error("Decrypted value is not valid UTF-8")]
    Utf8,
}

/// Derive a 256-bit AES key from an arbitrary-length secret.
pub fn derive_key(secret: &str) -> [u8; 32] {
    Sha256::digest(secret.as_bytes()).into()
}

/// Encrypt `plaintext` under `secret`.
pub fn encrypt_secret(secret: &str, plaintext: &str) -> Result<String, CryptoError> {
    let key_bytes = derive_key(secret);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|_| CryptoError::Encrypt)?;

    Ok(format!(
        "{FORMAT_PREFIX}:{}:{}",
        STANDARD.encode(nonce_bytes),
        STANDARD.encode(ciphertext)
    ))
}

/// Decrypt a value produced by [`encrypt_secret`] with the same `secret`.
pub fn decrypt_secret(secret: &str, sealed: &str) -> Result<String, CryptoError> {
    let mut parts = sealed.splitn(3, ':');
    let (Some(FORMAT_PREFIX), Some(nonce_b64), Some(ct_b64)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(CryptoError::Malformed);
    };

    let nonce_bytes = STANDARD.decode(nonce_b64)?;
    if nonce_bytes.len() != NONCE_LEN {
        return Err(CryptoError::Malformed);
    }
    let ciphertext = STANDARD.decode(ct_b64)?;

    let key_bytes = derive_key(secret);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|_| CryptoError::Decrypt)?;

    String::from_utf8(plaintext).map_err(|_| CryptoError::Utf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_then_decrypt() {
        let sealed = encrypt_secret("key-material", "smtp-pass").unwrap();
        assert!(sealed.starts_with("v1:"));
        assert_eq!(decrypt_secret("key-material", &sealed).unwrap(), "smtp-pass");
    }

    #[test]
    fn nonces_differ_between_calls() {
        let a = encrypt_secret("k", "same").unwrap();
        let b = encrypt_secret("k", "same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = encrypt_secret("right", "value").unwrap();
        assert!(matches!(
            decrypt_secret("wrong", &sealed),
            Err(CryptoError::Decrypt)
        ));
    }

    #[test]
    fn malformed_input_fails() {
        assert!(matches!(decrypt_secret("k", "plain"), Err(CryptoError::Malformed)));
        assert!(matches!(decrypt_secret("k", "v2:a:b"), Err(CryptoError::Malformed)));
        assert!(decrypt_secret("k", "v1:!!:??").is_err());
    }
}
