//! Vault envelope format
//!
//! An envelope is the base64 (standard alphabet) encoding of
//! `nonce (12 bytes) || ciphertext || tag (16 bytes)`. The cipher is
//! AES-256-GCM keyed with the hex-decoded derived key. The plaintext is a
//! JSON object mapping variable names to values.

use super::VaultError;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::collections::BTreeMap;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

fn cipher_for(derived_key: &str) -> Result<Aes256Gcm, VaultError> {
    let bytes = hex::decode(derived_key.trim())
        .map_err(|e| VaultError::InvalidKey(format!("derived key is not hex: {e}")))?;
    if bytes.len() != KEY_LEN {
        return Err(VaultError::InvalidKey(format!(
            "expected {KEY_LEN} key bytes, got {}",
            bytes.len()
        )));
    }
    Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&bytes)))
}

/// Encrypt `vars` into an envelope
pub fn seal(derived_key: &str, vars: &BTreeMap<String, String>) -> Result<String, VaultError> {
    let cipher = cipher_for(derived_key)?;
    let plaintext =
        serde_json::to_vec(vars).map_err(|e| VaultError::Encrypt(e.to_string()))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_slice())
        .map_err(|e| VaultError::Encrypt(e.to_string()))?;

    let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    combined.extend_from_slice(&nonce);
    combined.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(combined))
}

/// Decrypt an envelope back into its variables
pub fn open(derived_key: &str, envelope: &str) -> Result<BTreeMap<String, String>, VaultError> {
    let cipher = cipher_for(derived_key)?;

    let compact: String = envelope.split_whitespace().collect();
    let combined = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| VaultError::MalformedEnvelope(e.to_string()))?;
    if combined.len() < NONCE_LEN + TAG_LEN {
        return Err(VaultError::MalformedEnvelope(format!(
            "envelope is {} bytes, need at least {}",
            combined.len(),
            NONCE_LEN + TAG_LEN
        )));
    }

    let (nonce, ciphertext) = combined.split_at(NONCE_LEN);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| VaultError::Decrypt(e.to_string()))?;

    serde_json::from_slice(&plaintext).map_err(|e| VaultError::MalformedEnvelope(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::derive_key;

    fn key() -> String {
        derive_key(&"p".repeat(32), &"q".repeat(32)).unwrap()
    }

    fn vars() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("DB_PASSWORD".to_string(), "s3cret".to_string()),
            ("MAIL_HOST".to_string(), "smtp.example.test".to_string()),
        ])
    }

    #[test]
    fn test_open_recovers_sealed_vars() {
        let envelope = seal(&key(), &vars()).unwrap();
        assert!(!envelope.contains("s3cret"));
        assert_eq!(open(&key(), &envelope).unwrap(), vars());
    }

    #[test]
    fn test_open_tolerates_line_wrapping() {
        let envelope = seal(&key(), &vars()).unwrap();
        let (head, tail) = envelope.split_at(10);
        let wrapped = format!("{head}\n{tail}\n");
        assert_eq!(open(&key(), &wrapped).unwrap(), vars());
    }

    #[test]
    fn test_open_with_wrong_key_fails() {
        let envelope = seal(&key(), &vars()).unwrap();
        let other = derive_key(&"p".repeat(32), &"z".repeat(32)).unwrap();
        assert!(matches!(open(&other, &envelope), Err(VaultError::Decrypt(_))));
    }

    #[test]
    fn test_open_rejects_garbage() {
        assert!(matches!(
            open(&key(), "not base64 !!"),
            Err(VaultError::MalformedEnvelope(_))
        ));
        assert!(matches!(
            open(&key(), &STANDARD.encode([0u8; 8])),
            Err(VaultError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(matches!(seal("zz", &vars()), Err(VaultError::InvalidKey(_))));
        assert!(matches!(seal("abcd", &vars()), Err(VaultError::InvalidKey(_))));
    }
}
