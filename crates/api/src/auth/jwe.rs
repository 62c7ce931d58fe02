//! Compact JWE wrapping for access tokens.
//!
//! Only the `dir` key management mode with `A256GCM` content encryption is
//! supported. The serialized form has five dot-separated segments:
//! `protected.encrypted_key.iv.ciphertext.tag`, where `encrypted_key` is
//! always empty and the ASCII of the `protected` segment is the AEAD
//! additional data.

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use rand::RngCore;
use serde::{Deserialize, Serialize};

const ALG_DIR: &str = "dir";
const ENC_A256GCM: &str = "A256GCM";
const CONTENT_TYPE_JWT: &str = "JWT";
const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum JweError {
    #[error("Malformed JWE")]
    Malformed,

    #[error("Unsupported JWE header")]
    UnsupportedHeader,

    #[error("JWE decryption failed")]
    Decrypt,

    #[error("JWE encryption failed")]
    Encrypt,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProtectedHeader {
    alg: String,
    enc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cty: Option<String>,
}

/// A 256-bit content encryption key.
#[derive(Clone)]
pub struct JweKey([u8; 32]);

impl std::fmt::Debug for JweKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JweKey(..)")
    }
}

impl JweKey {
    /// Build a key from configuration text.
    ///
    /// Text that base64-decodes (url-safe or standard) to exactly 32 bytes is
    /// used as the raw key. Anything else is hashed with SHA-256.
    pub fn from_config(value: &str) -> Self {
        let decoded = URL_SAFE_NO_PAD
            .decode(value.trim_end_matches('='))
            .or_else(|_| STANDARD.decode(value));
        match decoded {
            Ok(bytes) if bytes.len() == 32 => {
                let mut key = [0u8; 32];
                key.copy_from_slice(&bytes);
                Self(key)
            }
            _ => Self(medialab_core::crypto::derive_key(value)),
        }
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

/// Encrypt a signed JWT into compact JWE form.
pub fn encrypt(jwt: &str, key: &JweKey) -> Result<String, JweError> {
    let header = ProtectedHeader {
        alg: ALG_DIR.to_string(),
        enc: ENC_A256GCM.to_string(),
        cty: Some(CONTENT_TYPE_JWT.to_string()),
    };
    let header_json = serde_json::to_vec(&header).map_err(|_| JweError::Encrypt)?;
    let protected = URL_SAFE_NO_PAD.encode(header_json);

    let mut iv = [0u8; IV_LEN];
    rand::rng().fill_bytes(&mut iv);

    let sealed = key
        .cipher()
        .encrypt(
            Nonce::from_slice(&iv),
            Payload {
                msg: jwt.as_bytes(),
                aad: protected.as_bytes(),
            },
        )
        .map_err(|_| JweError::Encrypt)?;
    let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

    Ok(format!(
        "{protected}..{}.{}.{}",
        URL_SAFE_NO_PAD.encode(iv),
        URL_SAFE_NO_PAD.encode(ciphertext),
        URL_SAFE_NO_PAD.encode(tag)
    ))
}

/// Decrypt a compact JWE produced by [`encrypt`], returning the inner JWT.
pub fn decrypt(token: &str, key: &JweKey) -> Result<String, JweError> {
    let parts: Vec<&str> = token.split('.').collect();
    let [protected, encrypted_key, iv, ciphertext, tag] = parts.as_slice() else {
        return Err(JweError::Malformed);
    };
    if !encrypted_key.is_empty() {
        return Err(JweError::UnsupportedHeader);
    }

    let header_json = URL_SAFE_NO_PAD
        .decode(protected)
        .map_err(|_| JweError::Malformed)?;
    let header: ProtectedHeader =
        serde_json::from_slice(&header_json).map_err(|_| JweError::Malformed)?;
    if header.alg != ALG_DIR || header.enc != ENC_A256GCM {
        return Err(JweError::UnsupportedHeader);
    }

    let iv = URL_SAFE_NO_PAD.decode(iv).map_err(|_| JweError::Malformed)?;
    let mut sealed = URL_SAFE_NO_PAD
        .decode(ciphertext)
        .map_err(|_| JweError::Malformed)?;
    let tag = URL_SAFE_NO_PAD.decode(tag).map_err(|_| JweError::Malformed)?;
    if iv.len() != IV_LEN || tag.len() != TAG_LEN {
        return Err(JweError::Malformed);
    }
    sealed.extend_from_slice(&tag);

    let plaintext = key
        .cipher()
        .decrypt(
            Nonce::from_slice(&iv),
            Payload {
                msg: &sealed,
                aad: protected.as_bytes(),
            },
        )
        .map_err(|_| JweError::Decrypt)?;
    String::from_utf8(plaintext).map_err(|_| JweError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> JweKey {
        JweKey::from_config("jwe-test-key")
    }

    #[test]
    fn roundtrip() {
        let token = encrypt("header.payload.signature", &key()).unwrap();
        assert_eq!(token.split('.').count(), 5);
        assert_eq!(decrypt(&token, &key()).unwrap(), "header.payload.signature");
    }

    #[test]
    fn protected_header_is_dir_a256gcm() {
        let token = encrypt("x.y.z", &key()).unwrap();
        let protected = token.split('.').next().unwrap();
        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(protected).unwrap()).unwrap();
        assert_eq!(header["alg"], "dir");
        assert_eq!(header["enc"], "A256GCM");
        assert_eq!(header["cty"], "JWT");
    }

    #[test]
    fn wrong_key_fails() {
        let token = encrypt("a.b.c", &key()).unwrap();
        let other = JweKey::from_config("another-key");
        assert_eq!(decrypt(&token, &other), Err(JweError::Decrypt));
    }

    #[test]
    fn tampered_header_fails() {
        let token = encrypt("a.b.c", &key()).unwrap();
        let forged_header = URL_SAFE_NO_PAD.encode(br#"{"alg":"dir","enc":"A256GCM"}"#);
        let rest: Vec<&str> = token.split('.').skip(1).collect();
        let forged = format!("{forged_header}.{}", rest.join("."));
        assert_eq!(decrypt(&forged, &key()), Err(JweError::Decrypt));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let token = encrypt("a.b.c", &key()).unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let mut ct = URL_SAFE_NO_PAD.decode(&parts[3]).unwrap();
        ct[0] ^= 0x01;
        parts[3] = URL_SAFE_NO_PAD.encode(ct);
        assert_eq!(decrypt(&parts.join("."), &key()), Err(JweError::Decrypt));
    }

    #[test]
    fn plain_jwt_is_rejected() {
        assert_eq!(decrypt("a.b.c", &key()), Err(JweError::Malformed));
    }

    #[test]
    fn other_algorithms_are_rejected() {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RSA-OAEP","enc":"A256GCM"}"#);
        let token = format!("{header}..AAAAAAAAAAAAAAAA.AA.AAAAAAAAAAAAAAAAAAAAAA");
        assert_eq!(decrypt(&token, &key()), Err(JweError::UnsupportedHeader));
    }

    #[test]
    fn raw_32_byte_key_is_used_directly() {
        let raw = [7u8; 32];
        let encoded = URL_SAFE_NO_PAD.encode(raw);
        let JweKey(bytes) = JweKey::from_config(&encoded);
        assert_eq!(bytes, raw);
    }
}
