//! Environment vault
//!
//! An environment vault is an encrypted `.env.<env>.vault` file shipped
//! next to the binary (or compiled into it). At startup the loader derives
//! a symmetric key from the embedded public key and the operator-supplied
//! private key, decrypts the vault and overlays its variables onto the
//! environment before the configuration is read.
//!
//! - [`derive`] - key derivation with an injectable deobfuscation step
//! - [`envelope`] - AES-256-GCM sealing of a variable map
//! - [`resources`] - vault files compiled into the binary
//! - [`hydrate`] - locating, decrypting and applying a vault

pub mod derive;
pub mod envelope;
pub mod hydrate;
pub mod resources;

pub use derive::{derive_key, Deobfuscator, KeyDeriver, ENVENC_KEY_PUBLIC, MIN_KEY_LENGTH};
pub use envelope::{open, seal};
pub use hydrate::{vault_file_name, VaultEnv};
pub use resources::ResourceTable;

use thiserror::Error;

/// Errors raised by key derivation and vault handling
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    #[error("envenc public key is empty")]
    PublicKeyEmpty,

    #[error("envenc private key is empty")]
    PrivateKeyEmpty,

    #[error("envenc public key is too short")]
    PublicKeyTooShort,

    #[error("envenc private key is too short")]
    PrivateKeyTooShort,

    #[error("failed to deobfuscate public key: {0}")]
    Deobfuscate(String),

    #[error("vault file {file} not found in embedded resources or at {searched}")]
    NotFound { file: String, searched: String },

    #[error("failed to read vault file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("invalid vault key: {0}")]
    InvalidKey(String),

    #[error("malformed vault envelope: {0}")]
    MalformedEnvelope(String),

    #[error("failed to decrypt vault: {0}")]
    Decrypt(String),

    #[error("failed to encrypt vault: {0}")]
    Encrypt(String),
}
