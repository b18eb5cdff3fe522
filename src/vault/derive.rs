//! Vault key derivation
//!
//! The derived key is `hex(sha256(public || private))`. The public key is
//! embedded in the binary and may be stored obfuscated; a deobfuscation
//! function turns it back into the real key before use. The default
//! deobfuscator is the identity.

use super::VaultError;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// Minimum length, in characters, of both halves of the key pair
pub const MIN_KEY_LENGTH: usize = 32;

/// Public half of the vault key pair.
///
/// Deployments replace this value (or inject their own through
/// [`KeyDeriver::new`]) before sealing production vaults.
pub const ENVENC_KEY_PUBLIC: &str = "wS7pKq2Lm9Xv4Tb8Rz1Nc6Hd3Jf5Gy0Ue2Ai7Bo4";

/// Turns a stored public key into the real one
pub type Deobfuscator = Arc<dyn Fn(&str) -> Result<String, String> + Send + Sync>;

/// Derives vault keys from a fixed public key
#[derive(Clone)]
pub struct KeyDeriver {
    public_key: String,
    deobfuscate: Deobfuscator,
}

impl KeyDeriver {
    pub fn new(public_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            deobfuscate: Arc::new(identity),
        }
    }

    /// Replace the deobfuscation step
    pub fn with_deobfuscator<F>(mut self, deobfuscate: F) -> Self
    where
        F: Fn(&str) -> Result<String, String> + Send + Sync + 'static,
    {
        self.deobfuscate = Arc::new(deobfuscate);
        self
    }

    /// Derive the symmetric key for `private_key`
    ///
    /// # Errors
    ///
    /// Fails when either key is empty or shorter than [`MIN_KEY_LENGTH`], or
    /// when the public key cannot be deobfuscated.
    pub fn derive(&self, private_key: &str) -> Result<String, VaultError> {
        derive_with(&self.public_key, private_key, self.deobfuscate.as_ref())
    }
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self::new(ENVENC_KEY_PUBLIC)
    }
}

impl fmt::Debug for KeyDeriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyDeriver")
            .field("public_key", &"[REDACTED]")
            .finish()
    }
}

/// Derive a key from an explicit pair with identity deobfuscation
pub fn derive_key(public_key: &str, private_key: &str) -> Result<String, VaultError> {
    derive_with(public_key, private_key, &identity)
}

fn identity(key: &str) -> Result<String, String> {
    Ok(key.to_string())
}

fn derive_with(
    public_key: &str,
    private_key: &str,
    deobfuscate: &(dyn Fn(&str) -> Result<String, String> + Send + Sync),
) -> Result<String, VaultError> {
    if public_key.is_empty() {
        return Err(VaultError::PublicKeyEmpty);
    }

    let public_key = deobfuscate(public_key).map_err(VaultError::Deobfuscate)?;

    if public_key.chars().count() < MIN_KEY_LENGTH {
        return Err(VaultError::PublicKeyTooShort);
    }
    if private_key.is_empty() {
        return Err(VaultError::PrivateKeyEmpty);
    }
    if private_key.chars().count() < MIN_KEY_LENGTH {
        return Err(VaultError::PrivateKeyTooShort);
    }

    let mut hasher = Sha256::new();
    hasher.update(public_key.as_bytes());
    hasher.update(private_key.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBLIC: &str = "0123456789abcdef0123456789abcdef";
    const PRIVATE: &str = "fedcba9876543210fedcba9876543210";

    #[test]
    fn test_derive_key_is_deterministic() {
        let first = derive_key(PUBLIC, PRIVATE).unwrap();
        let second = derive_key(PUBLIC, PRIVATE).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_derive_key_matches_sha256_of_concatenation() {
        let expected = hex::encode(Sha256::digest(format!("{PUBLIC}{PRIVATE}").as_bytes()));
        assert_eq!(derive_key(PUBLIC, PRIVATE).unwrap(), expected);
    }

    #[test]
    fn test_different_private_keys_differ() {
        let other = "x".repeat(32);
        assert_ne!(derive_key(PUBLIC, PRIVATE).unwrap(), derive_key(PUBLIC, &other).unwrap());
    }

    #[test]
    fn test_empty_public_key() {
        let err = derive_key("", PRIVATE).unwrap_err();
        assert!(err.to_string().contains("public key is empty"));
    }

    #[test]
    fn test_short_public_key() {
        let err = derive_key("short", PRIVATE).unwrap_err();
        assert_eq!(err, VaultError::PublicKeyTooShort);
        assert!(err.to_string().contains("public key is too short"));
    }

    #[test]
    fn test_empty_private_key() {
        let err = derive_key(PUBLIC, "").unwrap_err();
        assert!(err.to_string().contains("private key is empty"));
    }

    #[test]
    fn test_short_private_key() {
        let err = derive_key(PUBLIC, "tiny").unwrap_err();
        assert!(err.to_string().contains("private key is too short"));
    }

    #[test]
    fn test_deobfuscation_failure() {
        let deriver =
            KeyDeriver::new(PUBLIC).with_deobfuscator(|_| Err("bad encoding".to_string()));
        let err = deriver.derive(PRIVATE).unwrap_err();
        assert!(err.to_string().contains("failed to deobfuscate public key"));
    }

    #[test]
    fn test_deobfuscator_output_is_used() {
        let deriver = KeyDeriver::new("obfuscated")
            .with_deobfuscator(|_| Ok(PUBLIC.to_string()));
        assert_eq!(deriver.derive(PRIVATE).unwrap(), derive_key(PUBLIC, PRIVATE).unwrap());
    }

    #[test]
    fn test_default_public_key_is_long_enough() {
        assert!(ENVENC_KEY_PUBLIC.len() >= MIN_KEY_LENGTH);
        assert!(KeyDeriver::default().derive(PRIVATE).is_ok());
    }

    #[test]
    fn test_debug_redacts_public_key() {
        let rendered = format!("{:?}", KeyDeriver::new(PUBLIC));
        assert!(!rendered.contains(PUBLIC));
    }
}
