//! Password-based key derivation and labeled sub-key expansion.
//!
//! masterKey = PBKDF2-HMAC-SHA256(password, salt, iterations)
//! subKey    = HKDF-SHA256(masterKey, salt="notelock:subkey-salt:v1", info=label)
//!
//! The master key is expanded into two independent sub-keys: one for note
//! encryption, one for the snapshot checksum. Neither sub-key can be
//! recovered from the other.

use hkdf::Hkdf;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::ZeroizeOnDrop;

use crate::error::StoreError;
use crate::types::{KEY_LENGTH, SALT_LENGTH};

/// Default PBKDF2 iteration count for new stores.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

const SUBKEY_SALT: &[u8] = b"notelock:subkey-salt:v1";

/// HKDF label for the note-encryption sub-key.
pub const ENCRYPT_LABEL: &[u8] = b"notelock:encrypt:v1";

/// HKDF label for the snapshot-checksum sub-key.
pub const INTEGRITY_LABEL: &[u8] = b"notelock:integrity:v1";

/// The session master key derived from the password.
///
/// Never persisted or logged; zeroized from memory on drop.
#[derive(Clone, ZeroizeOnDrop)]
pub struct MasterKey {
    key: [u8; KEY_LENGTH],
}

/// A purpose-bound key expanded from a [`MasterKey`] under a label.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SubKey {
    key: [u8; KEY_LENGTH],
}

impl MasterKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }

    /// Expand a sub-key for the given label using HKDF-SHA256.
    ///
    /// Distinct labels yield independent keys, so key material used for
    /// encryption is never reused for the checksum.
    pub fn expand(&self, label: &[u8]) -> Result<SubKey, StoreError> {
        let hk = Hkdf::<Sha256>::new(Some(SUBKEY_SALT), &self.key);
        let mut okm = [0u8; KEY_LENGTH];
        hk.expand(label, &mut okm)
            .map_err(|e| StoreError::KeyDerivation(format!("HKDF expand failed: {}", e)))?;
        Ok(SubKey { key: okm })
    }

    /// Sub-key for note encryption (AES-256-GCM).
    pub fn encryption_key(&self) -> Result<SubKey, StoreError> {
        self.expand(ENCRYPT_LABEL)
    }

    /// Sub-key for the snapshot checksum (HMAC-SHA256).
    pub fn integrity_key(&self) -> Result<SubKey, StoreError> {
        self.expand(INTEGRITY_LABEL)
    }
}

impl SubKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey").field("key", &"[REDACTED]").finish()
    }
}

impl std::fmt::Debug for SubKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubKey").field("key", &"[REDACTED]").finish()
    }
}

/// Derive the master key from a password.
///
/// Deterministic: the same (password, salt, iterations) always yields the
/// same key, so a returning session can re-derive the key used previously.
pub fn derive_master_key(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
) -> Result<MasterKey, StoreError> {
    if iterations == 0 {
        return Err(StoreError::KeyDerivation(
            "iteration count must be non-zero".into(),
        ));
    }
    if salt.len() != SALT_LENGTH {
        return Err(StoreError::KeyDerivation(format!(
            "salt must be {} bytes, got {}",
            SALT_LENGTH,
            salt.len()
        )));
    }

    let mut key = [0u8; KEY_LENGTH];
    pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);
    Ok(MasterKey { key })
}

/// Generate a random salt for a new store.
pub fn generate_salt() -> Result<[u8; SALT_LENGTH], StoreError> {
    let mut salt = [0u8; SALT_LENGTH];
    getrandom::getrandom(&mut salt).map_err(|e| StoreError::RngFailed(e.to_string()))?;
    Ok(salt)
}
